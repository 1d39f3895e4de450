//! Repositorios de acceso a datos

pub mod driver_repository;
pub mod ride_repository;
