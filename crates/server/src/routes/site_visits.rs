//! Routes for site visits, including the creation flow that triggers
//! auto-assignment.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::site_visit::{CreateSiteVisit, SiteVisit, VisitStatus};
use serde::{Deserialize, Serialize};
use services::services::assignment::{AssignmentOutcome, AssignmentService};
use tracing::warn;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Clone, Serialize, TS)]
pub struct SiteVisitCreated {
    pub visit: SiteVisit,
    pub assignment: Option<AssignmentOutcome>,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateStatusRequest {
    pub status: VisitStatus,
}

#[derive(Debug, Deserialize, TS)]
pub struct AssignRequest {
    pub collector_id: Uuid,
    pub assigned_by: Option<Uuid>,
}

/// Create a site visit and immediately attempt auto-assignment. A failed
/// attempt never fails the creation; the visit stays pending and manual
/// assignment remains available.
pub async fn create_site_visit(
    State(state): State<AppState>,
    Json(payload): Json<CreateSiteVisit>,
) -> Result<ResponseJson<ApiResponse<SiteVisitCreated>>, ApiError> {
    let visit = SiteVisit::create(&state.db().pool, &payload, Uuid::new_v4()).await?;

    let assignment = if state.config().auto_assign_enabled {
        match AssignmentService::auto_assign(
            &state.db().pool,
            state.notifications(),
            visit.id,
            None,
            state.config().upfront_share,
        )
        .await
        {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(
                    visit_id = %visit.id,
                    error = %e,
                    "Auto-assignment failed; manual assignment remains available"
                );
                None
            }
        }
    } else {
        None
    };

    let visit = SiteVisit::find_by_id(&state.db().pool, visit.id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(ResponseJson(ApiResponse::success(SiteVisitCreated {
        visit,
        assignment,
    })))
}

pub async fn list_site_visits(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<SiteVisit>>>, ApiError> {
    let visits = SiteVisit::find_all(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(visits)))
}

pub async fn get_site_visit(
    State(state): State<AppState>,
    Path(visit_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<SiteVisit>>, ApiError> {
    let visit = SiteVisit::find_by_id(&state.db().pool, visit_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(visit)))
}

pub async fn update_site_visit_status(
    State(state): State<AppState>,
    Path(visit_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<ResponseJson<ApiResponse<SiteVisit>>, ApiError> {
    SiteVisit::find_by_id(&state.db().pool, visit_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    SiteVisit::update_status(&state.db().pool, visit_id, payload.status).await?;
    let visit = SiteVisit::find_by_id(&state.db().pool, visit_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(visit)))
}

/// Assign a specific collector, chosen by a coordinator.
pub async fn assign_site_visit(
    State(state): State<AppState>,
    Path(visit_id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> Result<ResponseJson<ApiResponse<AssignmentOutcome>>, ApiError> {
    let outcome = AssignmentService::assign_manual(
        &state.db().pool,
        state.notifications(),
        visit_id,
        payload.collector_id,
        payload.assigned_by,
        state.config().upfront_share,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(outcome)))
}

pub async fn verify_site_permit(
    State(state): State<AppState>,
    Path(visit_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<SiteVisit>>, ApiError> {
    SiteVisit::find_by_id(&state.db().pool, visit_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    SiteVisit::update_status(&state.db().pool, visit_id, VisitStatus::PermitVerified).await?;
    let visit = SiteVisit::find_by_id(&state.db().pool, visit_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(visit)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/site-visits",
        Router::new()
            .route("/", post(create_site_visit).get(list_site_visits))
            .route("/{visit_id}", get(get_site_visit))
            .route("/{visit_id}/status", put(update_site_visit_status))
            .route("/{visit_id}/assign", post(assign_site_visit))
            .route("/{visit_id}/verify-permit", post(verify_site_permit)),
    )
}
