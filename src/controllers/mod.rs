//! Controllers de la aplicación

pub mod driver_controller;
pub mod ride_controller;
