//! DTOs de solicitudes de viaje

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::ride_request::{RideRequest, RideStatus};

/// Request para cotizar un viaje antes de solicitarlo
#[derive(Debug, Deserialize, Validate)]
pub struct QuoteRequest {
    pub driver_id: Uuid,

    #[validate(range(min = -90.0, max = 90.0))]
    pub pickup_lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub pickup_lng: f64,

    #[validate(range(min = -90.0, max = 90.0))]
    pub destination_lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub destination_lng: f64,
}

/// Response de cotización
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub distance_km: f64,
    pub duration_min: f64,
    pub tarifa_km: Decimal,
    pub total_fare: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<String>,
}

/// Request para crear una solicitud de viaje
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRideRequest {
    pub passenger_id: Uuid,
    pub driver_id: Uuid,

    #[validate(range(min = -90.0, max = 90.0))]
    pub pickup_lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub pickup_lng: f64,

    #[validate(range(min = -90.0, max = 90.0))]
    pub destination_lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub destination_lng: f64,

    #[validate(length(max = 300))]
    pub pickup_address: Option<String>,

    #[validate(length(max = 300))]
    pub destination_address: Option<String>,
}

/// El chofer que intenta aceptar/rechazar/completar la solicitud
#[derive(Debug, Deserialize)]
pub struct DriverActionRequest {
    pub driver_id: Uuid,
}

/// El pasajero que cancela su solicitud pendiente
#[derive(Debug, Deserialize)]
pub struct PassengerActionRequest {
    pub passenger_id: Uuid,
}

/// Response de solicitud de viaje para la API
#[derive(Debug, Serialize)]
pub struct RideResponse {
    pub id: Uuid,
    pub passenger_id: Uuid,
    pub driver_id: Uuid,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub pickup_address: Option<String>,
    pub destination_address: Option<String>,
    pub distance_km: f64,
    pub duration_min: f64,
    pub tarifa_km: Decimal,
    pub total_fare: Decimal,
    pub status: RideStatus,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<RideRequest> for RideResponse {
    fn from(ride: RideRequest) -> Self {
        Self {
            id: ride.id,
            passenger_id: ride.passenger_id,
            driver_id: ride.driver_id,
            pickup_lat: ride.pickup_lat,
            pickup_lng: ride.pickup_lng,
            destination_lat: ride.destination_lat,
            destination_lng: ride.destination_lng,
            pickup_address: ride.pickup_address,
            destination_address: ride.destination_address,
            distance_km: ride.distance_km,
            duration_min: ride.duration_min,
            tarifa_km: ride.tarifa_km,
            total_fare: ride.total_fare,
            status: ride.status,
            created_at: ride.created_at,
            accepted_at: ride.accepted_at,
            completed_at: ride.completed_at,
            cancelled_at: ride.cancelled_at,
        }
    }
}

/// Response genérica
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: Some(data),
        }
    }
}
