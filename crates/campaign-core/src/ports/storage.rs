//! Storage traits for persistence

use crate::error::StoreResult;
use crate::types::{Campaign, CampaignId, CampaignStatus, NewCampaign};
use async_trait::async_trait;

/// Authoritative campaign store
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// All campaigns ordered by id, optionally restricted to one status.
    async fn list_campaigns(&self, status: Option<CampaignStatus>) -> StoreResult<Vec<Campaign>>;

    async fn get_campaign(&self, id: CampaignId) -> StoreResult<Option<Campaign>>;

    /// Insert and commit; returns the store-assigned id.
    async fn insert_campaign(&self, campaign: &NewCampaign) -> StoreResult<CampaignId>;
}
