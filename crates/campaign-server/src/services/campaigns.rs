//! Campaign service
//!
//! Routes every request to the primary store first and falls back to the
//! cache when the store fails. Successful store reads and writes are
//! mirrored into the cache.

use crate::storage::FallbackCache;
use campaign_core::{
    Campaign, CampaignError, CampaignId, CampaignStatus, CampaignStore, NewCampaign, Result,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct CampaignService {
    store: Arc<dyn CampaignStore>,
    cache: Arc<FallbackCache>,
}

impl CampaignService {
    pub fn new(store: Arc<dyn CampaignStore>, cache: Arc<FallbackCache>) -> Self {
        Self { store, cache }
    }

    /// List campaigns, optionally filtered by status. Never fails: when the
    /// store cannot answer, the cached campaigns are returned instead.
    pub async fn list_campaigns(&self, status: Option<CampaignStatus>) -> Vec<Campaign> {
        match self.store.list_campaigns(status).await {
            Ok(campaigns) => {
                match status {
                    None => self.cache.replace_all(campaigns.clone()).await,
                    // The cache mirrors the whole table, never a filtered view
                    Some(_) => self.refresh_cache().await,
                }
                campaigns
            }
            Err(e) => {
                warn!("Serving campaign list from fallback cache: {}", e);
                match status {
                    Some(status) => self.cache.filter_by_status(status).await,
                    None => self.cache.snapshot().await,
                }
            }
        }
    }

    pub async fn get_campaign(&self, id: CampaignId) -> Result<Campaign> {
        match self.store.get_campaign(id).await {
            Ok(Some(campaign)) => Ok(campaign),
            Ok(None) => Err(CampaignError::NotFound(id)),
            Err(e) if e.is_store_failure() => {
                warn!("Looking up campaign {} in fallback cache: {}", id, e);
                match self.cache.find_by_id(id).await {
                    Some(campaign) => Ok(campaign),
                    None => Err(e.into()),
                }
            }
            Err(e) => {
                error!("Failed to get campaign {}: {}", id, e);
                Err(e.into())
            }
        }
    }

    pub async fn create_campaign(&self, campaign: NewCampaign) -> Result<Campaign> {
        campaign.validate()?;

        match self.store.insert_campaign(&campaign).await {
            Ok(id) => {
                info!("Created campaign {} ({})", id, campaign.campaign_name);
                let record = campaign.with_id(id);
                self.cache.append(record.clone()).await;
                Ok(record)
            }
            Err(e) if e.is_store_failure() => match self.cache.append_new(&campaign).await {
                Some(record) => {
                    warn!(
                        "Created campaign {} ({}) in fallback cache only: {}",
                        record.id, record.campaign_name, e
                    );
                    Ok(record)
                }
                None => {
                    error!("No free campaign id left in fallback cache: {}", e);
                    Err(e.into())
                }
            },
            Err(e) => {
                error!("Failed to create campaign: {}", e);
                Err(e.into())
            }
        }
    }

    /// Current contents of the fallback cache.
    pub async fn fallback_campaigns(&self) -> Vec<Campaign> {
        self.cache.snapshot().await
    }

    async fn refresh_cache(&self) {
        match self.store.list_campaigns(None).await {
            Ok(all) => self.cache.replace_all(all).await,
            Err(e) => debug!("Skipping fallback refresh after filtered list: {}", e),
        }
    }
}
