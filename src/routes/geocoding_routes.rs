use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::services::geocoding_service::{GeocodeHit, GeocodingService};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_geocoding_router() -> Router<AppState> {
    Router::new()
        .route("/forward", get(forward_geocode))
        .route("/reverse", get(reverse_geocode))
}

#[derive(Debug, Deserialize)]
struct ForwardQuery {
    q: String,
}

#[derive(Debug, Deserialize)]
struct ReverseQuery {
    lat: f64,
    lng: f64,
}

fn service(state: &AppState) -> Result<GeocodingService, AppError> {
    let token = state.config.mapbox_token.clone().ok_or_else(|| {
        AppError::ServiceUnavailable("Geocoding no configurado (falta MAPBOX_TOKEN)".to_string())
    })?;

    Ok(GeocodingService::new(token))
}

async fn forward_geocode(
    State(state): State<AppState>,
    Query(query): Query<ForwardQuery>,
) -> Result<Json<Vec<GeocodeHit>>, AppError> {
    if query.q.trim().is_empty() {
        return Err(AppError::BadRequest(
            "El parámetro 'q' no puede estar vacío".to_string(),
        ));
    }

    let hits = service(&state)?.forward(&query.q).await?;
    Ok(Json(hits))
}

async fn reverse_geocode(
    State(state): State<AppState>,
    Query(query): Query<ReverseQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lng) {
        return Err(AppError::BadRequest("Coordenadas fuera de rango".to_string()));
    }

    let address = service(&state)?.reverse(query.lat, query.lng).await?;
    Ok(Json(serde_json::json!({ "address": address })))
}
