//! Utilidades de geometría
//!
//! Rumbo entre dos fixes GPS consecutivos. Se usa para rotar el ícono
//! del vehículo cuando el cliente no reporta heading propio.

/// Rumbo en grados (0-360, 0 = norte) del fix anterior al fix actual
pub fn bearing_degrees(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let y = delta_lng.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lng.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}
