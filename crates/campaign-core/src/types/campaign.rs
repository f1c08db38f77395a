//! Campaign types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CampaignError;

pub type CampaignId = i64;

/// Campaign status values that status-filtered queries understand.
///
/// A stored campaign may carry any status string; only these two can be
/// used as a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignStatus {
    Active,
    Paused,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Active => "Active",
            CampaignStatus::Paused => "Paused",
        }
    }

    /// Interpret an optional query parameter as a filter.
    ///
    /// Unknown or missing values mean "no filter".
    pub fn from_filter(value: Option<&str>) -> Option<Self> {
        value.and_then(|s| s.parse().ok())
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = CampaignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(CampaignStatus::Active),
            "Paused" => Ok(CampaignStatus::Paused),
            other => Err(CampaignError::Validation(format!(
                "unknown campaign status: {}",
                other
            ))),
        }
    }
}

/// A campaign row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub campaign_name: String,
    pub status: String,
    pub clicks: i64,
    pub cost: f64,
    pub impressions: i64,
}

impl Campaign {
    pub fn has_status(&self, status: CampaignStatus) -> bool {
        self.status == status.as_str()
    }
}

/// Payload for creating a campaign. The id is assigned by whichever side
/// accepts the write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCampaign {
    pub campaign_name: String,
    pub status: String,
    #[serde(default)]
    pub clicks: i64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub impressions: i64,
}

impl NewCampaign {
    pub fn new(campaign_name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            campaign_name: campaign_name.into(),
            status: status.into(),
            clicks: 0,
            cost: 0.0,
            impressions: 0,
        }
    }

    pub fn validate(&self) -> Result<(), CampaignError> {
        if self.campaign_name.trim().is_empty() {
            return Err(CampaignError::Validation(
                "campaign_name must not be empty".to_string(),
            ));
        }
        if self.clicks < 0 {
            return Err(CampaignError::Validation(
                "clicks must be non-negative".to_string(),
            ));
        }
        if self.impressions < 0 {
            return Err(CampaignError::Validation(
                "impressions must be non-negative".to_string(),
            ));
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(CampaignError::Validation(
                "cost must be a non-negative amount".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the full record once an id has been assigned.
    pub fn with_id(&self, id: CampaignId) -> Campaign {
        Campaign {
            id,
            campaign_name: self.campaign_name.clone(),
            status: self.status.clone(),
            clicks: self.clicks,
            cost: self.cost,
            impressions: self.impressions,
        }
    }
}

/// Built-in dataset used when no usable snapshot exists.
pub fn default_campaigns() -> Vec<Campaign> {
    vec![
        Campaign {
            id: 1,
            campaign_name: "Sample Campaign A".to_string(),
            status: "Active".to_string(),
            clicks: 100,
            cost: 50.0,
            impressions: 1000,
        },
        Campaign {
            id: 2,
            campaign_name: "Sample Campaign B".to_string(),
            status: "Paused".to_string(),
            clicks: 50,
            cost: 25.0,
            impressions: 500,
        },
        Campaign {
            id: 3,
            campaign_name: "Sample Campaign C".to_string(),
            status: "Active".to_string(),
            clicks: 200,
            cost: 120.0,
            impressions: 3000,
        },
    ]
}
