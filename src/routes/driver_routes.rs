use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::driver_controller::DriverController;
use crate::dto::driver_dto::{CreateDriverRequest, DriverResponse, UpdateAvailabilityRequest};
use crate::dto::ride_dto::ApiResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_driver_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_driver))
        .route("/:id", get(get_driver))
        .route("/:id/availability", put(update_availability))
}

async fn create_driver(
    State(state): State<AppState>,
    Json(request): Json<CreateDriverRequest>,
) -> Result<Json<ApiResponse<DriverResponse>>, AppError> {
    let controller = DriverController::new(state.pool.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn get_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DriverResponse>, AppError> {
    let controller = DriverController::new(state.pool.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn update_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<ApiResponse<DriverResponse>>, AppError> {
    let controller = DriverController::new(state.pool.clone());
    let response = controller.set_availability(id, request).await?;
    Ok(Json(response))
}
