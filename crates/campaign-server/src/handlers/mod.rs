//! HTTP handlers

pub mod campaigns;
pub mod fallback;
pub mod health;

pub use health::health;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use campaign_core::CampaignError;
use serde_json::json;

/// Error response carrying a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError(CampaignError);

impl From<CampaignError> for ApiError {
    fn from(e: CampaignError) -> Self {
        ApiError(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(CampaignError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(CampaignError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            CampaignError::NotFound(_) => (StatusCode::NOT_FOUND, "Campaign not found".to_string()),
            CampaignError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            CampaignError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
