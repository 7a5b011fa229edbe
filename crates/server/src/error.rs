use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::assignment::AssignmentError;
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    #[error("not found")]
    NotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Assignment(AssignmentError::VisitNotFound) => StatusCode::NOT_FOUND,
            ApiError::Assignment(AssignmentError::CollectorNotFound) => StatusCode::NOT_FOUND,
            ApiError::Assignment(AssignmentError::NotPending) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("internal error: {}", self);
        }

        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}
