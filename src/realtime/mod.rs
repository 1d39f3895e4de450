//! Subsistema realtime
//!
//! Canales broadcast por chofer y por viaje, alerta repetitiva de oferta
//! y handlers WebSocket.

pub mod alerts;
pub mod events;
pub mod hub;
pub mod ws;

pub use alerts::AlertRegistry;
pub use events::{PartyRole, RideEvent};
pub use hub::DispatchHub;
