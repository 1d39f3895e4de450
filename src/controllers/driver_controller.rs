//! Controller de choferes

use uuid::Uuid;
use validator::Validate;

use crate::dto::driver_dto::{CreateDriverRequest, DriverResponse, UpdateAvailabilityRequest};
use crate::dto::ride_dto::ApiResponse;
use crate::models::driver::DriverAvailability;
use crate::repositories::driver_repository::DriverRepository;
use crate::utils::errors::{AppError, AppResult};

pub struct DriverController {
    drivers: DriverRepository,
}

impl DriverController {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            drivers: DriverRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        request: CreateDriverRequest,
    ) -> AppResult<ApiResponse<DriverResponse>> {
        request.validate()?;

        if let Some(tarifa) = request.tarifa_km {
            if tarifa <= rust_decimal::Decimal::ZERO {
                return Err(AppError::BadRequest(
                    "La tarifa por km debe ser mayor a cero".to_string(),
                ));
            }
        }

        let driver = self
            .drivers
            .create(request.full_name, request.phone, request.tarifa_km)
            .await?;

        tracing::info!("🚗 Chofer {} registrado (tarifa {}/km)", driver.id, driver.tarifa_km);

        Ok(ApiResponse::success_with_message(
            driver.into(),
            "Chofer registrado".to_string(),
        ))
    }

    pub async fn get_by_id(&self, driver_id: Uuid) -> AppResult<DriverResponse> {
        let driver = self
            .drivers
            .find_by_id(driver_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Chofer no encontrado".to_string()))?;

        Ok(driver.into())
    }

    /// Toggle manual de disponibilidad. `busy` lo pone y lo quita el ciclo
    /// del viaje, no este endpoint.
    pub async fn set_availability(
        &self,
        driver_id: Uuid,
        request: UpdateAvailabilityRequest,
    ) -> AppResult<ApiResponse<DriverResponse>> {
        if request.availability == DriverAvailability::Busy {
            return Err(AppError::BadRequest(
                "La disponibilidad 'busy' la administra el sistema".to_string(),
            ));
        }

        let driver = self
            .drivers
            .set_availability(driver_id, request.availability)
            .await?;

        tracing::info!(
            "🔄 Chofer {} ahora está {:?}",
            driver.id,
            driver.availability
        );

        Ok(ApiResponse::success_with_message(
            driver.into(),
            "Disponibilidad actualizada".to_string(),
        ))
    }
}
