//! DTOs de la API

pub mod driver_dto;
pub mod ride_dto;
