//! Storage layer
//!
//! PostgreSQL is the primary store. The fallback cache mirrors its
//! campaigns table in memory and on disk for when it cannot be reached.

pub mod db;
pub mod fallback;
pub mod snapshot;

pub use db::Database;
pub use fallback::FallbackCache;
pub use snapshot::{BackgroundSnapshotWriter, JsonFileSnapshot};
