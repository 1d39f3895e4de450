//! DTOs de choferes

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::driver::{Driver, DriverAvailability};

/// Request para registrar un chofer
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDriverRequest {
    #[validate(length(min = 2, max = 150))]
    pub full_name: String,

    #[validate(length(min = 7, max = 20))]
    pub phone: String,

    /// Tarifa por km; si no se envía se usa el default de la tabla
    pub tarifa_km: Option<Decimal>,
}

/// Request para cambiar la disponibilidad (solo available/offline;
/// busy lo administra el sistema)
#[derive(Debug, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub availability: DriverAvailability,
}

/// Response de chofer para la API
#[derive(Debug, Serialize)]
pub struct DriverResponse {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub tarifa_km: Decimal,
    pub availability: DriverAvailability,
    pub created_at: DateTime<Utc>,
}

impl From<Driver> for DriverResponse {
    fn from(driver: Driver) -> Self {
        Self {
            id: driver.id,
            full_name: driver.full_name,
            phone: driver.phone,
            tarifa_km: driver.tarifa_km,
            availability: driver.availability,
            created_at: driver.created_at,
        }
    }
}
