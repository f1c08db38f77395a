//! Port traits (interfaces) for dependency injection

pub mod snapshot;
pub mod storage;

pub use snapshot::SnapshotWriter;
pub use storage::CampaignStore;
