//! Eventos del canal realtime
//!
//! Frames JSON que viajan por los canales de chofer y de viaje.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ride_request::RideRequest;

/// Quién reporta la posición en el canal del viaje
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    Driver,
    Passenger,
}

/// Evento empujado por el hub a los suscriptores
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RideEvent {
    /// Oferta de viaje para el chofer; se repite mientras la alerta suene
    Offer { ride: RideRequest },
    Accepted {
        ride_id: Uuid,
        accepted_at: DateTime<Utc>,
    },
    Completed {
        ride_id: Uuid,
        completed_at: DateTime<Utc>,
    },
    Cancelled {
        ride_id: Uuid,
        cancelled_by: PartyRole,
    },
    /// Posición ambiental de una de las partes; no se persiste
    Position {
        ride_id: Uuid,
        role: PartyRole,
        lat: f64,
        lng: f64,
        /// Rumbo en grados para rotar el ícono; derivado del fix anterior
        /// cuando el cliente no lo reporta
        heading: Option<f64>,
        reported_at: DateTime<Utc>,
    },
}
