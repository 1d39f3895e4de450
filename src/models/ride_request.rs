//! Modelo de RideRequest
//!
//! Este módulo contiene el struct RideRequest y su máquina de estados.
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de la solicitud de viaje - mapea al ENUM ride_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "ride_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Pending,
    Accepted,
    Completed,
    Cancelled,
}

impl RideStatus {
    /// Transiciones permitidas desde este estado.
    /// pending -> {accepted, cancelled}; accepted -> {completed}.
    /// completed y cancelled son terminales.
    pub fn can_transition_to(self, next: RideStatus) -> bool {
        matches!(
            (self, next),
            (RideStatus::Pending, RideStatus::Accepted)
                | (RideStatus::Pending, RideStatus::Cancelled)
                | (RideStatus::Accepted, RideStatus::Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }
}

/// RideRequest principal - mapea exactamente a la tabla ride_requests
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RideRequest {
    pub id: Uuid,
    pub passenger_id: Uuid,
    pub driver_id: Uuid,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub pickup_address: Option<String>,
    pub destination_address: Option<String>,
    /// Distancia reportada por el servicio de rutas al crear - inmutable
    pub distance_km: f64,
    pub duration_min: f64,
    /// Tarifa por km del chofer, snapshot al momento de crear
    pub tarifa_km: Decimal,
    /// total_fare = distance_km * tarifa_km, nunca se recalcula
    pub total_fare: Decimal,
    pub status: RideStatus,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_solo_permite_accepted_y_cancelled() {
        assert!(RideStatus::Pending.can_transition_to(RideStatus::Accepted));
        assert!(RideStatus::Pending.can_transition_to(RideStatus::Cancelled));
        assert!(!RideStatus::Pending.can_transition_to(RideStatus::Completed));
        assert!(!RideStatus::Pending.can_transition_to(RideStatus::Pending));
    }

    #[test]
    fn test_accepted_solo_permite_completed() {
        assert!(RideStatus::Accepted.can_transition_to(RideStatus::Completed));
        assert!(!RideStatus::Accepted.can_transition_to(RideStatus::Cancelled));
        assert!(!RideStatus::Accepted.can_transition_to(RideStatus::Pending));
        assert!(!RideStatus::Accepted.can_transition_to(RideStatus::Accepted));
    }

    #[test]
    fn test_estados_terminales_sin_salida() {
        for terminal in [RideStatus::Completed, RideStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for next in [
                RideStatus::Pending,
                RideStatus::Accepted,
                RideStatus::Completed,
                RideStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_serializa_en_minusculas() {
        let json = serde_json::to_string(&RideStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
