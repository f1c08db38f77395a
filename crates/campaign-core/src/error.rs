//! Error types for the campaign service

use thiserror::Error;

use crate::types::CampaignId;

pub type Result<T> = std::result::Result<T, CampaignError>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures reported by the primary store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached (connect, network, pool exhaustion).
    #[error("Primary store unreachable: {0}")]
    Unreachable(String),

    /// The store was reached but rejected or mangled the query.
    #[error("Primary store query failed: {0}")]
    Query(String),

    #[error("Unexpected store failure: {0}")]
    Unexpected(String),
}

impl StoreError {
    /// Whether this failure should send the request to the fallback cache.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, StoreError::Unreachable(_) | StoreError::Query(_))
    }
}

/// Errors surfaced by campaign operations
#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Campaign not found: {0}")]
    NotFound(CampaignId),

    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid campaign: {0}")]
    Validation(String),
}
