//! Controller de solicitudes de viaje
//!
//! Orquesta el ciclo de vida completo: cotización, creación con snapshot de
//! tarifa, aceptación/rechazo del chofer, finalización y cancelación del
//! pasajero. Los efectos secundarios (disponibilidad del chofer, aviso al
//! pasajero, alerta de oferta) se disparan después de que la transición de
//! estado quedó confirmada en la base; si un efecto falla se loguea y no se
//! revierte la transición.

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::ride_dto::{ApiResponse, CreateRideRequest, QuoteRequest, QuoteResponse, RideResponse};
use crate::realtime::{AlertRegistry, DispatchHub, PartyRole, RideEvent};
use crate::models::driver::{Driver, DriverAvailability};
use crate::repositories::driver_repository::DriverRepository;
use crate::repositories::ride_repository::{NewRide, RideRepository};
use crate::services::fare_service::FareService;
use crate::services::notification_service::NotificationService;
use crate::services::routing_service::RouteProvider;
use crate::utils::errors::AppError;

pub struct RideController {
    rides: RideRepository,
    drivers: DriverRepository,
    fare: FareService,
    hub: DispatchHub,
    alerts: AlertRegistry,
    notifier: Arc<dyn NotificationService>,
}

impl RideController {
    pub fn new(
        pool: sqlx::PgPool,
        routing: Arc<dyn RouteProvider>,
        hub: DispatchHub,
        alerts: AlertRegistry,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            rides: RideRepository::new(pool.clone()),
            drivers: DriverRepository::new(pool),
            fare: FareService::new(routing),
            hub,
            alerts,
            notifier,
        }
    }

    async fn driver_or_not_found(&self, driver_id: Uuid) -> Result<Driver, AppError> {
        self.drivers
            .find_by_id(driver_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Chofer no encontrado".to_string()))
    }

    /// Cotizar un viaje con la tarifa actual del chofer
    pub async fn quote(&self, request: QuoteRequest) -> Result<QuoteResponse, AppError> {
        request.validate()?;

        let driver = self.driver_or_not_found(request.driver_id).await?;

        let quote = self
            .fare
            .quote(
                (request.pickup_lat, request.pickup_lng),
                (request.destination_lat, request.destination_lng),
                driver.tarifa_km,
            )
            .await?;

        Ok(QuoteResponse {
            distance_km: quote.distance_km,
            duration_min: quote.duration_min,
            tarifa_km: quote.tarifa_km,
            total_fare: quote.total_fare,
            geometry: quote.geometry,
        })
    }

    /// Crear una solicitud pendiente y arrancar la alerta del chofer
    pub async fn create(
        &self,
        request: CreateRideRequest,
    ) -> Result<ApiResponse<RideResponse>, AppError> {
        request.validate()?;

        let driver = self.driver_or_not_found(request.driver_id).await?;

        // Una sola solicitud activa por pasajero; el índice parcial cubre
        // la carrera que este chequeo no alcanza a ver
        if let Some(active) = self
            .rides
            .find_active_by_passenger(request.passenger_id)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "El pasajero ya tiene una solicitud activa ({})",
                active.id
            )));
        }

        // La ruta tiene que resolverse antes de insertar; sin ruta no hay viaje
        let quote = self
            .fare
            .quote(
                (request.pickup_lat, request.pickup_lng),
                (request.destination_lat, request.destination_lng),
                driver.tarifa_km,
            )
            .await?;

        let ride = self
            .rides
            .create(NewRide {
                passenger_id: request.passenger_id,
                driver_id: request.driver_id,
                pickup_lat: request.pickup_lat,
                pickup_lng: request.pickup_lng,
                destination_lat: request.destination_lat,
                destination_lng: request.destination_lng,
                pickup_address: request.pickup_address,
                destination_address: request.destination_address,
                distance_km: quote.distance_km,
                duration_min: quote.duration_min,
                tarifa_km: quote.tarifa_km,
                total_fare: quote.total_fare,
            })
            .await?;

        tracing::info!(
            "🚕 Solicitud {} creada: pasajero {} -> chofer {}, total {}",
            ride.id,
            ride.passenger_id,
            ride.driver_id,
            ride.total_fare
        );

        // Oferta inmediata + loop de alerta hasta accept/reject/mute
        self.hub
            .publish_to_driver(ride.driver_id, RideEvent::Offer { ride: ride.clone() })
            .await;
        self.alerts.start_offer_loop(ride.clone()).await;

        Ok(ApiResponse::success_with_message(
            ride.into(),
            "Solicitud de viaje creada".to_string(),
        ))
    }

    /// El chofer asignado acepta la solicitud pendiente.
    /// El update condicional garantiza un solo ganador ante intentos
    /// concurrentes; el perdedor recibe Conflict.
    pub async fn accept(
        &self,
        ride_id: Uuid,
        driver_id: Uuid,
    ) -> Result<ApiResponse<RideResponse>, AppError> {
        let ride = match self.rides.accept(ride_id, driver_id).await? {
            Some(ride) => ride,
            None => {
                return Err(self
                    .transition_conflict(
                        ride_id,
                        "aceptar",
                        |r| r.driver_id == driver_id,
                        "la solicitud está asignada a otro chofer",
                    )
                    .await)
            }
        };

        self.alerts.stop(ride_id).await;

        // Efecto secundario: chofer ocupado. Si falla no se revierte el accept.
        if let Err(e) = self
            .drivers
            .set_availability(driver_id, DriverAvailability::Busy)
            .await
        {
            tracing::warn!("⚠️ No se pudo marcar ocupado al chofer {}: {}", driver_id, e);
        }

        // Aviso out-of-band al pasajero, fire-and-forget
        let notifier = self.notifier.clone();
        let ride_for_notify = ride.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify_ride_accepted(&ride_for_notify).await {
                tracing::warn!("⚠️ Falló el aviso de aceptación: {}", e);
            }
        });

        self.hub
            .publish_to_ride(
                ride_id,
                RideEvent::Accepted {
                    ride_id,
                    accepted_at: ride.accepted_at.unwrap_or_else(chrono::Utc::now),
                },
            )
            .await;

        tracing::info!("✅ Solicitud {} aceptada por el chofer {}", ride_id, driver_id);

        Ok(ApiResponse::success_with_message(
            ride.into(),
            "Solicitud aceptada".to_string(),
        ))
    }

    /// El chofer asignado rechaza la solicitud pendiente.
    /// No cambia su disponibilidad y no hay re-despacho automático.
    pub async fn reject(
        &self,
        ride_id: Uuid,
        driver_id: Uuid,
    ) -> Result<ApiResponse<RideResponse>, AppError> {
        let ride = match self.rides.cancel_by_driver(ride_id, driver_id).await? {
            Some(ride) => ride,
            None => {
                return Err(self
                    .transition_conflict(
                        ride_id,
                        "rechazar",
                        |r| r.driver_id == driver_id,
                        "la solicitud está asignada a otro chofer",
                    )
                    .await)
            }
        };

        self.alerts.stop(ride_id).await;

        self.hub
            .publish_to_ride(
                ride_id,
                RideEvent::Cancelled {
                    ride_id,
                    cancelled_by: PartyRole::Driver,
                },
            )
            .await;
        self.hub.drop_ride_channel(ride_id).await;

        tracing::info!("🚫 Solicitud {} rechazada por el chofer {}", ride_id, driver_id);

        Ok(ApiResponse::success_with_message(
            ride.into(),
            "Solicitud rechazada".to_string(),
        ))
    }

    /// El chofer asignado termina el viaje aceptado y vuelve a estar libre
    pub async fn complete(
        &self,
        ride_id: Uuid,
        driver_id: Uuid,
    ) -> Result<ApiResponse<RideResponse>, AppError> {
        let ride = match self.rides.complete(ride_id, driver_id).await? {
            Some(ride) => ride,
            None => {
                return Err(self
                    .transition_conflict(
                        ride_id,
                        "completar",
                        |r| r.driver_id == driver_id,
                        "la solicitud está asignada a otro chofer",
                    )
                    .await)
            }
        };

        if let Err(e) = self
            .drivers
            .set_availability(driver_id, DriverAvailability::Available)
            .await
        {
            tracing::warn!("⚠️ No se pudo liberar al chofer {}: {}", driver_id, e);
        }

        let notifier = self.notifier.clone();
        let ride_for_notify = ride.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify_ride_completed(&ride_for_notify).await {
                tracing::warn!("⚠️ Falló el aviso de viaje completado: {}", e);
            }
        });

        self.hub
            .publish_to_ride(
                ride_id,
                RideEvent::Completed {
                    ride_id,
                    completed_at: ride.completed_at.unwrap_or_else(chrono::Utc::now),
                },
            )
            .await;
        self.hub.drop_ride_channel(ride_id).await;

        tracing::info!("🏁 Viaje {} completado por el chofer {}", ride_id, driver_id);

        Ok(ApiResponse::success_with_message(
            ride.into(),
            "Viaje completado".to_string(),
        ))
    }

    /// El pasajero cancela su solicitud, solo mientras siga pendiente
    pub async fn cancel(
        &self,
        ride_id: Uuid,
        passenger_id: Uuid,
    ) -> Result<ApiResponse<RideResponse>, AppError> {
        let ride = match self.rides.cancel_by_passenger(ride_id, passenger_id).await? {
            Some(ride) => ride,
            None => {
                return Err(self
                    .transition_conflict(
                        ride_id,
                        "cancelar",
                        |r| r.passenger_id == passenger_id,
                        "la solicitud pertenece a otro pasajero",
                    )
                    .await)
            }
        };

        self.alerts.stop(ride_id).await;

        self.hub
            .publish_to_ride(
                ride_id,
                RideEvent::Cancelled {
                    ride_id,
                    cancelled_by: PartyRole::Passenger,
                },
            )
            .await;
        self.hub.drop_ride_channel(ride_id).await;

        tracing::info!("🚫 Solicitud {} cancelada por el pasajero {}", ride_id, passenger_id);

        Ok(ApiResponse::success_with_message(
            ride.into(),
            "Solicitud cancelada".to_string(),
        ))
    }

    /// Silenciar la alerta sin tocar el estado de la solicitud
    pub async fn mute_alert(&self, ride_id: Uuid) -> Result<ApiResponse<serde_json::Value>, AppError> {
        let muted = self.alerts.stop(ride_id).await;

        Ok(ApiResponse::success_with_message(
            serde_json::json!({ "muted": muted }),
            if muted {
                "Alerta silenciada".to_string()
            } else {
                "No había alerta activa".to_string()
            },
        ))
    }

    pub async fn get_by_id(&self, ride_id: Uuid) -> Result<RideResponse, AppError> {
        let ride = self
            .rides
            .find_by_id(ride_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Solicitud no encontrada".to_string()))?;

        Ok(ride.into())
    }

    pub async fn active_for_passenger(
        &self,
        passenger_id: Uuid,
    ) -> Result<Option<RideResponse>, AppError> {
        let ride = self.rides.find_active_by_passenger(passenger_id).await?;
        Ok(ride.map(RideResponse::from))
    }

    pub async fn history_for_passenger(
        &self,
        passenger_id: Uuid,
    ) -> Result<Vec<RideResponse>, AppError> {
        let rides = self.rides.list_by_passenger(passenger_id).await?;
        Ok(rides.into_iter().map(RideResponse::from).collect())
    }

    pub async fn history_for_driver(&self, driver_id: Uuid) -> Result<Vec<RideResponse>, AppError> {
        let rides = self.rides.list_by_driver(driver_id).await?;
        Ok(rides.into_iter().map(RideResponse::from).collect())
    }

    /// El update condicional devolvió None: distinguir entre solicitud
    /// inexistente, actor que no es parte de la solicitud, y estado que
    /// ya no permite la transición
    async fn transition_conflict<F>(
        &self,
        ride_id: Uuid,
        action: &str,
        is_actor: F,
        mismatch: &str,
    ) -> AppError
    where
        F: Fn(&crate::models::ride_request::RideRequest) -> bool,
    {
        match self.rides.find_by_id(ride_id).await {
            Ok(Some(ride)) if !is_actor(&ride) => {
                AppError::Conflict(format!("No se puede {}: {}", action, mismatch))
            }
            Ok(Some(ride)) => AppError::Conflict(format!(
                "No se puede {} la solicitud en estado {:?}",
                action, ride.status
            )),
            Ok(None) => AppError::NotFound("Solicitud no encontrada".to_string()),
            Err(e) => e,
        }
    }
}
