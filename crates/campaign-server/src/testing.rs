//! In-memory primary store for tests

use async_trait::async_trait;
use campaign_core::{
    Campaign, CampaignId, CampaignStatus, CampaignStore, NewCampaign, StoreError, StoreResult,
};
use std::sync::Mutex;

/// Stand-in for the PostgreSQL store whose availability can be toggled.
#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<Vec<Campaign>>,
    failure: Mutex<Option<StoreError>>,
    list_calls: Mutex<Vec<Option<CampaignStatus>>>,
}

impl InMemoryStore {
    pub fn new(rows: Vec<Campaign>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    /// Make every following call fail with `err`.
    pub fn fail_with(&self, err: StoreError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn rows(&self) -> Vec<Campaign> {
        self.rows.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> Vec<Option<CampaignStatus>> {
        self.list_calls.lock().unwrap().clone()
    }

    fn check(&self) -> StoreResult<()> {
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CampaignStore for InMemoryStore {
    async fn list_campaigns(&self, status: Option<CampaignStatus>) -> StoreResult<Vec<Campaign>> {
        self.list_calls.lock().unwrap().push(status);
        self.check()?;

        let mut rows: Vec<Campaign> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| status.map_or(true, |s| c.has_status(s)))
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.id);
        Ok(rows)
    }

    async fn get_campaign(&self, id: CampaignId) -> StoreResult<Option<Campaign>> {
        self.check()?;
        Ok(self.rows.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn insert_campaign(&self, campaign: &NewCampaign) -> StoreResult<CampaignId> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let id = rows.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        rows.push(campaign.with_id(id));
        Ok(id)
    }
}
