//! Snapshot persistence port

use crate::types::Campaign;

/// Sink for full copies of the fallback cache.
///
/// Implementations are best-effort: a failed write is logged and dropped,
/// never reported back to the caller.
pub trait SnapshotWriter: Send + Sync {
    fn persist(&self, campaigns: &[Campaign]);
}
