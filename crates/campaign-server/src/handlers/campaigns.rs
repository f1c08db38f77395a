//! Campaign handlers

use super::ApiError;
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    Json,
};
use campaign_core::{Campaign, CampaignId, CampaignStatus, NewCampaign};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    status: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Campaign>> {
    let status = CampaignStatus::from_filter(query.status.as_deref());
    Json(state.campaigns.list_campaigns(status).await)
}

pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<CampaignId>, PathRejection>,
) -> Result<Json<Campaign>, ApiError> {
    let Path(id) = id?;
    let campaign = state.campaigns.get_campaign(id).await?;
    Ok(Json(campaign))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewCampaign>, JsonRejection>,
) -> Result<Json<Campaign>, ApiError> {
    let Json(req_body) = payload?;
    let campaign = state.campaigns.create_campaign(req_body).await?;
    Ok(Json(campaign))
}
