//! Campaign Core Library
//!
//! Domain types, error taxonomy, and port traits shared by the campaign
//! analytics server.

pub mod error;
pub mod ports;
pub mod types;

pub use error::{CampaignError, Result, StoreError, StoreResult};
pub use ports::{CampaignStore, SnapshotWriter};
pub use types::*;
