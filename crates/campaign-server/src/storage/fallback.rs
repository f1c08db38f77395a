//! Fallback cache mirroring the campaigns table
//!
//! Holds the last campaigns read from (or written to) the primary store and
//! serves them while the store is unreachable. Every mutation hands a full
//! copy to the snapshot writer before the lock is released, so snapshots
//! reach the writer in mutation order.

use campaign_core::{
    default_campaigns, Campaign, CampaignId, CampaignStatus, NewCampaign, SnapshotWriter,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::snapshot::JsonFileSnapshot;

pub struct FallbackCache {
    records: RwLock<Vec<Campaign>>,
    writer: Arc<dyn SnapshotWriter>,
}

impl FallbackCache {
    pub fn new(records: Vec<Campaign>, writer: Arc<dyn SnapshotWriter>) -> Self {
        Self {
            records: RwLock::new(records),
            writer,
        }
    }

    /// Start from the snapshot on disk, or from the built-in sample set when
    /// the snapshot is missing or unusable. Never fails.
    pub fn load(snapshot: &JsonFileSnapshot, writer: Arc<dyn SnapshotWriter>) -> Self {
        let records = match snapshot.load() {
            Ok(Some(records)) => {
                info!(
                    "Loaded {} fallback campaigns from {}",
                    records.len(),
                    snapshot.path().display()
                );
                records
            }
            Ok(None) => {
                info!(
                    "No fallback snapshot at {}, using built-in campaigns",
                    snapshot.path().display()
                );
                default_campaigns()
            }
            Err(e) => {
                warn!(
                    "Ignoring unreadable fallback snapshot {}: {}",
                    snapshot.path().display(),
                    e
                );
                default_campaigns()
            }
        };

        Self::new(records, writer)
    }

    /// Discard the current contents in favour of a full read from the store.
    pub async fn replace_all(&self, records: Vec<Campaign>) {
        let mut guard = self.records.write().await;
        debug!(
            "Replacing {} fallback campaigns with {}",
            guard.len(),
            records.len()
        );
        *guard = records;
        self.writer.persist(&guard);
    }

    /// Add a record at the end. A record already cached under the same id
    /// is dropped first so ids stay unique.
    pub async fn append(&self, record: Campaign) {
        let mut guard = self.records.write().await;
        push_unique(&mut guard, record);
        self.writer.persist(&guard);
    }

    /// Assign the next free id to `campaign` and append it, as one step.
    /// `None` when the id space is exhausted.
    pub async fn append_new(&self, campaign: &NewCampaign) -> Option<Campaign> {
        let mut guard = self.records.write().await;
        let record = campaign.with_id(next_id(&guard)?);
        guard.push(record.clone());
        self.writer.persist(&guard);
        Some(record)
    }

    pub async fn persist(&self) {
        let guard = self.records.read().await;
        self.writer.persist(&guard);
    }

    pub async fn snapshot(&self) -> Vec<Campaign> {
        self.records.read().await.clone()
    }

    pub async fn filter_by_status(&self, status: CampaignStatus) -> Vec<Campaign> {
        self.records
            .read()
            .await
            .iter()
            .filter(|c| c.has_status(status))
            .cloned()
            .collect()
    }

    pub async fn find_by_id(&self, id: CampaignId) -> Option<Campaign> {
        self.records
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }
}

fn next_id(records: &[Campaign]) -> Option<CampaignId> {
    records.iter().map(|c| c.id).max().unwrap_or(0).checked_add(1)
}

fn push_unique(records: &mut Vec<Campaign>, record: Campaign) {
    if let Some(pos) = records.iter().position(|c| c.id == record.id) {
        warn!(
            "Fallback campaign {} superseded by a newer record with the same id",
            record.id
        );
        records.remove(pos);
    }
    records.push(record);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Keeps every snapshot it is handed.
    #[derive(Default)]
    pub(crate) struct RecordingWriter {
        pub(crate) snapshots: Mutex<Vec<Vec<Campaign>>>,
    }

    impl SnapshotWriter for RecordingWriter {
        fn persist(&self, campaigns: &[Campaign]) {
            self.snapshots.lock().unwrap().push(campaigns.to_vec());
        }
    }

    fn campaign(id: CampaignId, status: &str) -> Campaign {
        Campaign {
            id,
            campaign_name: format!("Campaign {}", id),
            status: status.to_string(),
            clicks: id.saturating_mul(10),
            cost: id as f64,
            impressions: id.saturating_mul(100),
        }
    }

    fn cache_with(records: Vec<Campaign>) -> (FallbackCache, Arc<RecordingWriter>) {
        let writer = Arc::new(RecordingWriter::default());
        (FallbackCache::new(records, writer.clone()), writer)
    }

    #[tokio::test]
    async fn test_filter_by_status_preserves_order() {
        let (cache, _) = cache_with(vec![
            campaign(4, "Paused"),
            campaign(1, "Active"),
            campaign(3, "Archived"),
            campaign(2, "Active"),
            campaign(5, "Paused"),
        ]);

        let active: Vec<_> = cache
            .filter_by_status(CampaignStatus::Active)
            .await
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(active, vec![1, 2]);

        let paused: Vec<_> = cache
            .filter_by_status(CampaignStatus::Paused)
            .await
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(paused, vec![4, 5]);
    }

    #[tokio::test]
    async fn test_replace_all_does_not_merge() {
        let (cache, writer) = cache_with(default_campaigns());
        let replacement = vec![campaign(10, "Active"), campaign(11, "Paused")];

        cache.replace_all(replacement.clone()).await;

        assert_eq!(cache.snapshot().await, replacement);
        assert_eq!(writer.snapshots.lock().unwrap().last(), Some(&replacement));
    }

    #[tokio::test]
    async fn test_append_goes_last() {
        let (cache, writer) = cache_with(default_campaigns());
        let record = campaign(9, "Active");

        cache.append(record.clone()).await;

        let mut expected = default_campaigns();
        expected.push(record);
        assert_eq!(cache.snapshot().await, expected);
        assert_eq!(writer.snapshots.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_append_replaces_same_id() {
        let (cache, _) = cache_with(vec![campaign(1, "Active"), campaign(2, "Paused")]);
        let mut newer = campaign(1, "Paused");
        newer.campaign_name = "From store".to_string();

        cache.append(newer.clone()).await;

        let snapshot = cache.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, 2);
        assert_eq!(snapshot[1], newer);
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id(&[]), Some(1));

        let sparse = vec![
            campaign(1, "Active"),
            campaign(7, "Active"),
            campaign(3, "Paused"),
        ];
        assert_eq!(next_id(&sparse), Some(8));

        assert_eq!(next_id(&[campaign(i64::MAX, "Active")]), None);
    }

    #[tokio::test]
    async fn test_append_new_refuses_exhausted_ids() {
        let (cache, writer) = cache_with(vec![campaign(i64::MAX, "Active")]);

        assert_eq!(cache.append_new(&NewCampaign::new("X", "Active")).await, None);
        assert_eq!(cache.snapshot().await.len(), 1);
        assert!(writer.snapshots.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_new_assigns_ids() {
        let (cache, writer) = cache_with(default_campaigns());

        let first = cache
            .append_new(&NewCampaign::new("X", "Active"))
            .await
            .unwrap();
        let second = cache
            .append_new(&NewCampaign::new("Y", "Paused"))
            .await
            .unwrap();

        assert_eq!(first.id, 4);
        assert_eq!(second.id, 5);
        assert_eq!(cache.find_by_id(4).await, Some(first));
        assert_eq!(writer.snapshots.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_degraded_creates_get_distinct_ids() {
        let (cache, _) = cache_with(default_campaigns());
        let cache = Arc::new(cache);

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    cache
                        .append_new(&NewCampaign::new(format!("C{}", i), "Active"))
                        .await
                        .unwrap()
                        .id
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        assert_eq!(ids, (4..24).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let (cache, _) = cache_with(default_campaigns());
        assert_eq!(
            cache.find_by_id(2).await.map(|c| c.campaign_name),
            Some("Sample Campaign B".to_string())
        );
        assert_eq!(cache.find_by_id(999).await, None);
    }

    #[tokio::test]
    async fn test_load_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let writer = Arc::new(RecordingWriter::default());

        let missing = JsonFileSnapshot::new(dir.path().join("missing.json"));
        let cache = FallbackCache::load(&missing, writer.clone());
        assert_eq!(cache.snapshot().await, default_campaigns());

        let corrupt_path = dir.path().join("corrupt.json");
        std::fs::write(&corrupt_path, b"[{\"id\": 1,").unwrap();
        let corrupt = JsonFileSnapshot::new(&corrupt_path);
        let cache = FallbackCache::load(&corrupt, writer.clone());
        assert_eq!(cache.snapshot().await, default_campaigns());

        // Loading never writes
        assert!(writer.snapshots.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_survives_restart() {
        let dir = tempdir().unwrap();
        let snapshot = Arc::new(JsonFileSnapshot::new(dir.path().join("fallback_data.json")));

        let cache = FallbackCache::load(&snapshot, snapshot.clone());
        cache
            .append_new(&NewCampaign::new("Persisted", "Paused"))
            .await
            .unwrap();

        let reloaded = FallbackCache::load(&snapshot, snapshot.clone());
        let record = reloaded.find_by_id(4).await.unwrap();
        assert_eq!(record.campaign_name, "Persisted");
        assert_eq!(reloaded.snapshot().await.len(), 4);
    }

    #[tokio::test]
    async fn test_mutation_stands_when_snapshot_write_fails() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes every write fail
        let path = dir.path().join("fallback_data.json");
        std::fs::create_dir(&path).unwrap();
        let snapshot = Arc::new(JsonFileSnapshot::new(&path));
        let cache = FallbackCache::new(default_campaigns(), snapshot);

        cache.append(campaign(9, "Paused")).await;
        let created = cache
            .append_new(&NewCampaign::new("Kept", "Active"))
            .await
            .unwrap();

        assert_eq!(created.id, 10);
        assert_eq!(cache.snapshot().await.len(), 5);
        assert_eq!(cache.find_by_id(10).await, Some(created));
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn test_non_finite_cost_does_not_wipe_snapshot_on_restart() {
        let dir = tempdir().unwrap();
        let snapshot = Arc::new(JsonFileSnapshot::new(dir.path().join("fallback_data.json")));
        let cache = FallbackCache::load(&snapshot, snapshot.clone());
        cache.append(campaign(5, "Active")).await;

        let mut bad = campaign(6, "Paused");
        bad.cost = f64::NAN;
        cache.append(bad).await;

        let reloaded = FallbackCache::load(&snapshot, snapshot.clone());
        let ids: Vec<_> = reloaded.snapshot().await.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 5]);
    }
}
