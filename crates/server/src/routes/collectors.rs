//! Routes for the collector directory.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{post, put},
};
use db::models::collector::{
    Availability, CollectorProfile, CreateCollectorProfile, DATA_COLLECTOR_ROLE,
};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize, TS)]
pub struct UpdateLocationRequest {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateAvailabilityRequest {
    pub availability: Availability,
}

/// Register a collector profile and grant the data-collector role.
pub async fn create_collector(
    State(state): State<AppState>,
    Json(payload): Json<CreateCollectorProfile>,
) -> Result<ResponseJson<ApiResponse<CollectorProfile>>, ApiError> {
    let id = Uuid::new_v4();
    let profile = CollectorProfile::create(&state.db().pool, &payload, id).await?;
    CollectorProfile::grant_role(&state.db().pool, id, DATA_COLLECTOR_ROLE).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

/// Collectors eligible for assignment (role-filtered, availability not
/// filtered).
pub async fn list_collectors(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<CollectorProfile>>>, ApiError> {
    let collectors = CollectorProfile::find_data_collectors(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(collectors)))
}

pub async fn update_location(
    State(state): State<AppState>,
    Path(collector_id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<ResponseJson<ApiResponse<CollectorProfile>>, ApiError> {
    CollectorProfile::find_by_id(&state.db().pool, collector_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    CollectorProfile::update_location(
        &state.db().pool,
        collector_id,
        payload.latitude,
        payload.longitude,
    )
    .await?;
    let profile = CollectorProfile::find_by_id(&state.db().pool, collector_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub async fn update_availability(
    State(state): State<AppState>,
    Path(collector_id): Path<Uuid>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<ResponseJson<ApiResponse<CollectorProfile>>, ApiError> {
    CollectorProfile::find_by_id(&state.db().pool, collector_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    CollectorProfile::update_availability(&state.db().pool, collector_id, payload.availability)
        .await?;
    let profile = CollectorProfile::find_by_id(&state.db().pool, collector_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/collectors",
        Router::new()
            .route("/", post(create_collector).get(list_collectors))
            .route("/{collector_id}/location", put(update_location))
            .route("/{collector_id}/availability", put(update_availability)),
    )
}
