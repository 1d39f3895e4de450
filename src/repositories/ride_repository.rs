//! Repositorio de solicitudes de viaje
//!
//! Todas las transiciones de estado son updates condicionales
//! (`WHERE status = ...`) para que una carrera entre dos intentos
//! concurrentes deje exactamente un ganador; el perdedor recibe None
//! y el controller lo convierte en Conflict. Las filas nunca se borran:
//! las solicitudes terminales quedan como historial.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ride_request::RideRequest;
use crate::utils::errors::AppError;

pub struct NewRide {
    pub passenger_id: Uuid,
    pub driver_id: Uuid,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub pickup_address: Option<String>,
    pub destination_address: Option<String>,
    pub distance_km: f64,
    pub duration_min: f64,
    pub tarifa_km: Decimal,
    pub total_fare: Decimal,
}

pub struct RideRepository {
    pool: PgPool,
}

impl RideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, ride: NewRide) -> Result<RideRequest, AppError> {
        let id = Uuid::new_v4();

        let created = sqlx::query_as::<_, RideRequest>(
            r#"
            INSERT INTO ride_requests (
                id, passenger_id, driver_id,
                pickup_lat, pickup_lng, destination_lat, destination_lng,
                pickup_address, destination_address,
                distance_km, duration_min, tarifa_km, total_fare,
                status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 'pending', $14)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(ride.passenger_id)
        .bind(ride.driver_id)
        .bind(ride.pickup_lat)
        .bind(ride.pickup_lng)
        .bind(ride.destination_lat)
        .bind(ride.destination_lng)
        .bind(ride.pickup_address)
        .bind(ride.destination_address)
        .bind(ride.distance_km)
        .bind(ride.duration_min)
        .bind(ride.tarifa_km)
        .bind(ride.total_fare)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // El índice parcial garantiza una sola solicitud activa por pasajero
            if let Some(db_err) = e.as_database_error() {
                if db_err.constraint() == Some("ride_requests_one_active_per_passenger") {
                    return AppError::Conflict(
                        "El pasajero ya tiene una solicitud activa".to_string(),
                    );
                }
            }
            AppError::Database(e)
        })?;

        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RideRequest>, AppError> {
        let ride = sqlx::query_as::<_, RideRequest>("SELECT * FROM ride_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ride)
    }

    /// Solicitud no terminal del pasajero, si existe
    pub async fn find_active_by_passenger(
        &self,
        passenger_id: Uuid,
    ) -> Result<Option<RideRequest>, AppError> {
        let ride = sqlx::query_as::<_, RideRequest>(
            r#"
            SELECT * FROM ride_requests
            WHERE passenger_id = $1 AND status IN ('pending', 'accepted')
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(passenger_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ride)
    }

    pub async fn list_by_passenger(&self, passenger_id: Uuid) -> Result<Vec<RideRequest>, AppError> {
        let rides = sqlx::query_as::<_, RideRequest>(
            "SELECT * FROM ride_requests WHERE passenger_id = $1 ORDER BY created_at DESC",
        )
        .bind(passenger_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rides)
    }

    pub async fn list_by_driver(&self, driver_id: Uuid) -> Result<Vec<RideRequest>, AppError> {
        let rides = sqlx::query_as::<_, RideRequest>(
            "SELECT * FROM ride_requests WHERE driver_id = $1 ORDER BY created_at DESC",
        )
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rides)
    }

    /// pending -> accepted, solo para el chofer asignado.
    /// None = la solicitud ya no estaba pendiente o no era suya.
    pub async fn accept(
        &self,
        ride_id: Uuid,
        driver_id: Uuid,
    ) -> Result<Option<RideRequest>, AppError> {
        let ride = sqlx::query_as::<_, RideRequest>(
            r#"
            UPDATE ride_requests
            SET status = 'accepted', accepted_at = $3
            WHERE id = $1 AND driver_id = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(ride_id)
        .bind(driver_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(ride)
    }

    /// pending -> cancelled, iniciado por el chofer asignado (rechazo)
    pub async fn cancel_by_driver(
        &self,
        ride_id: Uuid,
        driver_id: Uuid,
    ) -> Result<Option<RideRequest>, AppError> {
        let ride = sqlx::query_as::<_, RideRequest>(
            r#"
            UPDATE ride_requests
            SET status = 'cancelled', cancelled_at = $3
            WHERE id = $1 AND driver_id = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(ride_id)
        .bind(driver_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(ride)
    }

    /// pending -> cancelled, iniciado por el pasajero.
    /// Una solicitud ya aceptada no se puede cancelar por esta vía.
    pub async fn cancel_by_passenger(
        &self,
        ride_id: Uuid,
        passenger_id: Uuid,
    ) -> Result<Option<RideRequest>, AppError> {
        let ride = sqlx::query_as::<_, RideRequest>(
            r#"
            UPDATE ride_requests
            SET status = 'cancelled', cancelled_at = $3
            WHERE id = $1 AND passenger_id = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(ride_id)
        .bind(passenger_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(ride)
    }

    /// accepted -> completed, solo para el chofer asignado
    pub async fn complete(
        &self,
        ride_id: Uuid,
        driver_id: Uuid,
    ) -> Result<Option<RideRequest>, AppError> {
        let ride = sqlx::query_as::<_, RideRequest>(
            r#"
            UPDATE ride_requests
            SET status = 'completed', completed_at = $3
            WHERE id = $1 AND driver_id = $2 AND status = 'accepted'
            RETURNING *
            "#,
        )
        .bind(ride_id)
        .bind(driver_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(ride)
    }
}
