//! Repositorio de choferes

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::driver::{Driver, DriverAvailability};
use crate::utils::errors::AppError;

pub struct DriverRepository {
    pool: PgPool,
}

impl DriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        full_name: String,
        phone: String,
        tarifa_km: Option<Decimal>,
    ) -> Result<Driver, AppError> {
        let id = Uuid::new_v4();

        let driver = sqlx::query_as::<_, Driver>(
            r#"
            INSERT INTO drivers (id, full_name, phone, tarifa_km, availability, created_at)
            VALUES ($1, $2, $3, COALESCE($4, 15.00), 'offline', $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(phone)
        .bind(tarifa_km)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(driver)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Driver>, AppError> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(driver)
    }

    /// Cambiar la disponibilidad del chofer.
    /// Se usa tanto por el toggle manual (available/offline) como por los
    /// efectos secundarios de las transiciones del viaje (busy/available).
    pub async fn set_availability(
        &self,
        id: Uuid,
        availability: DriverAvailability,
    ) -> Result<Driver, AppError> {
        let driver = sqlx::query_as::<_, Driver>(
            "UPDATE drivers SET availability = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(availability)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Chofer no encontrado".to_string()))?;

        Ok(driver)
    }
}
