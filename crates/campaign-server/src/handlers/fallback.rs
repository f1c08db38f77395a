//! Fallback cache inspection (debugging aid)

use crate::AppState;
use axum::{extract::State, Json};
use campaign_core::Campaign;

pub async fn list(State(state): State<AppState>) -> Json<Vec<Campaign>> {
    Json(state.campaigns.fallback_campaigns().await)
}
