use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::ride_controller::RideController;
use crate::dto::ride_dto::{
    ApiResponse, CreateRideRequest, DriverActionRequest, PassengerActionRequest, QuoteRequest,
    QuoteResponse, RideResponse,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_ride_router() -> Router<AppState> {
    Router::new()
        .route("/quote", post(quote_ride))
        .route("/", post(create_ride))
        .route("/:id", get(get_ride))
        .route("/:id/accept", post(accept_ride))
        .route("/:id/reject", post(reject_ride))
        .route("/:id/complete", post(complete_ride))
        .route("/:id/cancel", post(cancel_ride))
        .route("/:id/mute-alert", post(mute_alert))
        .route("/passenger/:passenger_id/active", get(active_ride_for_passenger))
        .route("/passenger/:passenger_id/history", get(passenger_history))
        .route("/driver/:driver_id/history", get(driver_history))
}

fn controller(state: &AppState) -> RideController {
    RideController::new(
        state.pool.clone(),
        state.routing.clone(),
        state.hub.clone(),
        state.alerts.clone(),
        state.notifier.clone(),
    )
}

async fn quote_ride(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    let response = controller(&state).quote(request).await?;
    Ok(Json(response))
}

async fn create_ride(
    State(state): State<AppState>,
    Json(request): Json<CreateRideRequest>,
) -> Result<Json<ApiResponse<RideResponse>>, AppError> {
    let response = controller(&state).create(request).await?;
    Ok(Json(response))
}

async fn get_ride(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RideResponse>, AppError> {
    let response = controller(&state).get_by_id(id).await?;
    Ok(Json(response))
}

async fn accept_ride(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DriverActionRequest>,
) -> Result<Json<ApiResponse<RideResponse>>, AppError> {
    let response = controller(&state).accept(id, request.driver_id).await?;
    Ok(Json(response))
}

async fn reject_ride(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DriverActionRequest>,
) -> Result<Json<ApiResponse<RideResponse>>, AppError> {
    let response = controller(&state).reject(id, request.driver_id).await?;
    Ok(Json(response))
}

async fn complete_ride(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DriverActionRequest>,
) -> Result<Json<ApiResponse<RideResponse>>, AppError> {
    let response = controller(&state).complete(id, request.driver_id).await?;
    Ok(Json(response))
}

async fn cancel_ride(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PassengerActionRequest>,
) -> Result<Json<ApiResponse<RideResponse>>, AppError> {
    let response = controller(&state).cancel(id, request.passenger_id).await?;
    Ok(Json(response))
}

async fn mute_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let response = controller(&state).mute_alert(id).await?;
    Ok(Json(response))
}

async fn active_ride_for_passenger(
    State(state): State<AppState>,
    Path(passenger_id): Path<Uuid>,
) -> Result<Json<Option<RideResponse>>, AppError> {
    let response = controller(&state).active_for_passenger(passenger_id).await?;
    Ok(Json(response))
}

async fn passenger_history(
    State(state): State<AppState>,
    Path(passenger_id): Path<Uuid>,
) -> Result<Json<Vec<RideResponse>>, AppError> {
    let response = controller(&state).history_for_passenger(passenger_id).await?;
    Ok(Json(response))
}

async fn driver_history(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> Result<Json<Vec<RideResponse>>, AppError> {
    let response = controller(&state).history_for_driver(driver_id).await?;
    Ok(Json(response))
}
