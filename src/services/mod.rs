//! Services module
//!
//! Este módulo contiene la lógica de negocio y servicios de la aplicación.
//! Los servicios encapsulan operaciones que involucran integraciones externas.

pub mod fare_service;
pub mod geocoding_service;
pub mod notification_service;
pub mod routing_service;

pub use fare_service::*;
pub use routing_service::*;
