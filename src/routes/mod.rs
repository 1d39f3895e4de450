pub mod driver_routes;
pub mod geocoding_routes;
pub mod ride_routes;
