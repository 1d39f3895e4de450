//! Servicio de geocoding (Mapbox Geocoding API v6)
//!
//! Geocoding directo (texto libre -> coordenadas) para buscar el destino,
//! y geocoding inverso (coordenadas -> dirección) para resolver la dirección
//! del punto que el pasajero marca en el mapa.

use serde::{Deserialize, Serialize};

use crate::utils::errors::AppError;

/// Resultado de geocoding directo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeHit {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

#[derive(Debug, Deserialize)]
struct MapboxGeocodingResponse {
    #[serde(default)]
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    geometry: MapboxGeometry,
    properties: MapboxProperties,
}

#[derive(Debug, Deserialize)]
struct MapboxGeometry {
    /// [longitude, latitude]
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct MapboxProperties {
    full_address: Option<String>,
    place_name: Option<String>,
    name: Option<String>,
}

impl MapboxFeature {
    fn into_hit(self) -> Option<GeocodeHit> {
        if self.geometry.coordinates.len() < 2 {
            return None;
        }
        let longitude = self.geometry.coordinates[0];
        let latitude = self.geometry.coordinates[1];
        let address = self
            .properties
            .full_address
            .or(self.properties.place_name)
            .or(self.properties.name)?;

        Some(GeocodeHit {
            latitude,
            longitude,
            address,
        })
    }
}

pub struct GeocodingService {
    mapbox_token: String,
    client: reqwest::Client,
}

impl GeocodingService {
    pub fn new(mapbox_token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            mapbox_token,
            client,
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<GeocodeHit>, AppError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", "TaxiDispatch/1.0")
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Geocoding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ Geocoding falló con status {}: {}", status, error_text);
            return Err(AppError::ExternalApi(format!(
                "Geocoding failed: {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Geocoding request failed: {}", e)))?;

        Ok(Self::parse_hits(&body)?)
    }

    fn parse_hits(body: &str) -> Result<Vec<GeocodeHit>, AppError> {
        let response: MapboxGeocodingResponse = serde_json::from_str(body)
            .map_err(|e| AppError::ExternalApi(format!("Failed to parse geocoding response: {}", e)))?;

        Ok(response
            .features
            .into_iter()
            .filter_map(MapboxFeature::into_hit)
            .collect())
    }

    /// Buscar coordenadas a partir de texto libre
    pub async fn forward(&self, query: &str) -> Result<Vec<GeocodeHit>, AppError> {
        log::info!("🗺️ Geocoding directo: {}", query);

        let encoded = urlencoding::encode(query);
        let url = format!(
            "https://api.mapbox.com/search/geocode/v6/forward?q={}&access_token={}&limit=5",
            encoded, self.mapbox_token
        );

        self.fetch(&url).await
    }

    /// Resolver la dirección legible de una coordenada
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Option<String>, AppError> {
        log::info!("🗺️ Geocoding inverso: ({}, {})", latitude, longitude);

        let url = format!(
            "https://api.mapbox.com/search/geocode/v6/reverse?longitude={}&latitude={}&access_token={}&limit=1",
            longitude, latitude, self.mapbox_token
        );

        let hits = self.fetch(&url).await?;
        Ok(hits.into_iter().next().map(|hit| hit.address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsea_features_de_mapbox() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-110.9559, 29.0729] },
                    "properties": { "full_address": "Blvd. Hidalgo 12, Hermosillo, Sonora" }
                }
            ]
        }"#;

        let hits = GeocodingService::parse_hits(body).unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].latitude - 29.0729).abs() < 1e-9);
        assert!((hits[0].longitude + 110.9559).abs() < 1e-9);
        assert_eq!(hits[0].address, "Blvd. Hidalgo 12, Hermosillo, Sonora");
    }

    #[test]
    fn test_feature_sin_direccion_se_descarta() {
        let body = r#"{
            "features": [
                { "geometry": { "coordinates": [-110.9, 29.0] }, "properties": {} }
            ]
        }"#;

        let hits = GeocodingService::parse_hits(body).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_sin_features_lista_vacia() {
        let hits = GeocodingService::parse_hits(r#"{ "features": [] }"#).unwrap();
        assert!(hits.is_empty());
    }
}
