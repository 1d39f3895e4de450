//! Servicio de rutas (Mapbox Directions API)
//!
//! Este módulo pide la ruta en auto entre dos coordenadas al servicio
//! externo de rutas. Si el servicio falla o no hay ruta, la operación
//! falla sin reintentos y sin estimar distancia de respaldo.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cache::{CacheOperations, RedisClient};
use crate::utils::errors::AppError;

/// Resumen de la ruta devuelta por el servicio externo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_min: f64,
    /// Polyline codificada para dibujar la ruta en el mapa
    pub geometry: Option<String>,
}

/// Proveedor de rutas en auto entre dos puntos (lat, lng)
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn driving_route(
        &self,
        origin: (f64, f64),
        destination: (f64, f64),
    ) -> Result<RouteSummary, AppError>;
}

#[derive(Debug, Deserialize)]
struct MapboxDirectionsResponse {
    code: String,
    #[serde(default)]
    routes: Vec<MapboxRoute>,
}

#[derive(Debug, Deserialize)]
struct MapboxRoute {
    /// Distancia en metros
    distance: f64,
    /// Duración en segundos
    duration: f64,
    geometry: Option<String>,
}

pub struct MapboxDirectionsService {
    mapbox_token: String,
    client: reqwest::Client,
    cache: Option<RedisClient>,
    cache_ttl: u64,
}

impl MapboxDirectionsService {
    pub fn new(mapbox_token: String, cache: Option<RedisClient>, cache_ttl: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            mapbox_token,
            client,
            cache,
            cache_ttl,
        }
    }

    fn parse_response(body: &str) -> Result<RouteSummary, AppError> {
        let response: MapboxDirectionsResponse = serde_json::from_str(body)
            .map_err(|e| AppError::ExternalApi(format!("Failed to parse directions response: {}", e)))?;

        if response.code != "Ok" {
            return Err(AppError::ExternalApi(format!(
                "Routing service returned code '{}'",
                response.code
            )));
        }

        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ExternalApi("No route found between the points".to_string()))?;

        Ok(RouteSummary {
            distance_km: route.distance / 1000.0,
            duration_min: route.duration / 60.0,
            geometry: route.geometry,
        })
    }
}

#[async_trait]
impl RouteProvider for MapboxDirectionsService {
    async fn driving_route(
        &self,
        origin: (f64, f64),
        destination: (f64, f64),
    ) -> Result<RouteSummary, AppError> {
        // Cache read-through; si Redis falla se va directo al servicio
        if let Some(cache) = &self.cache {
            let key = cache.route_key(origin, destination);
            if let Ok(Some(cached)) = cache.get::<RouteSummary>(&key).await {
                return Ok(cached);
            }
        }

        // Mapbox espera lng,lat
        let url = format!(
            "https://api.mapbox.com/directions/v5/mapbox/driving/{},{};{},{}?access_token={}&overview=full&geometries=polyline",
            origin.1, origin.0, destination.1, destination.0, self.mapbox_token
        );

        log::info!(
            "🗺️ Solicitando ruta ({}, {}) -> ({}, {})",
            origin.0,
            origin.1,
            destination.0,
            destination.1
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "TaxiDispatch/1.0")
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Routing request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ Routing falló con status {}: {}", status, error_text);
            return Err(AppError::ExternalApi(format!(
                "Routing service failed: {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Routing request failed: {}", e)))?;

        let summary = Self::parse_response(&body)?;

        log::info!(
            "✅ Ruta obtenida: {:.2} km, {:.1} min",
            summary.distance_km,
            summary.duration_min
        );

        if let Some(cache) = &self.cache {
            let key = cache.route_key(origin, destination);
            if let Err(e) = cache.set(&key, &summary, self.cache_ttl).await {
                log::warn!("⚠️ No se pudo cachear la ruta: {}", e);
            }
        }

        Ok(summary)
    }
}

/// Proveedor usado cuando MAPBOX_TOKEN no está configurado
pub struct UnconfiguredRouteProvider;

#[async_trait]
impl RouteProvider for UnconfiguredRouteProvider {
    async fn driving_route(
        &self,
        _origin: (f64, f64),
        _destination: (f64, f64),
    ) -> Result<RouteSummary, AppError> {
        Err(AppError::ServiceUnavailable(
            "Routing service is not configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsea_respuesta_de_directions() {
        let body = r#"{
            "code": "Ok",
            "routes": [
                { "distance": 2350.0, "duration": 420.0, "geometry": "abc123" }
            ]
        }"#;

        let summary = MapboxDirectionsService::parse_response(body).unwrap();
        assert!((summary.distance_km - 2.35).abs() < 1e-9);
        assert!((summary.duration_min - 7.0).abs() < 1e-9);
        assert_eq!(summary.geometry.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_sin_rutas_es_error() {
        let body = r#"{ "code": "Ok", "routes": [] }"#;
        let err = MapboxDirectionsService::parse_response(body).unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
    }

    #[test]
    fn test_codigo_no_ok_es_error() {
        let body = r#"{ "code": "NoRoute", "routes": [] }"#;
        let err = MapboxDirectionsService::parse_response(body).unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
    }
}
