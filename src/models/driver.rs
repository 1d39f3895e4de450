//! Modelo de Driver
//!
//! Perfil del chofer con su tarifa activa y estado de disponibilidad.
//! La disponibilidad se muta como efecto secundario de las transiciones
//! de la solicitud de viaje (accept -> busy, complete -> available).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Disponibilidad del chofer - mapea al ENUM driver_availability
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "driver_availability", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DriverAvailability {
    Available,
    Busy,
    Offline,
}

/// Driver principal - mapea exactamente a la tabla drivers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Driver {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    /// Tarifa activa por kilómetro; las solicitudes guardan un snapshot
    pub tarifa_km: Decimal,
    pub availability: DriverAvailability,
    pub created_at: DateTime<Utc>,
}
