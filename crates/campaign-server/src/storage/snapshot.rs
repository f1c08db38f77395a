//! Snapshot file for the fallback cache
//!
//! The cache is mirrored to a single JSON array on disk. Writes go to a
//! temporary sibling first and are renamed into place, so a crash never
//! leaves a half-written snapshot behind.

use campaign_core::{Campaign, SnapshotWriter};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot contains duplicate campaign id {0}")]
    DuplicateId(i64),

    #[error("Campaign {0} has a cost that cannot be stored as JSON")]
    NonFiniteCost(i64),

    #[error("Campaign id {0} leaves no room for new ids")]
    IdOutOfRange(i64),
}

/// Synchronous JSON snapshot at a fixed path
pub struct JsonFileSnapshot {
    path: PathBuf,
}

impl JsonFileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. `Ok(None)` when no file exists yet.
    pub fn load(&self) -> Result<Option<Vec<Campaign>>, SnapshotError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read(&self.path)?;
        let campaigns: Vec<Campaign> = serde_json::from_slice(&contents)?;

        let mut seen = HashSet::with_capacity(campaigns.len());
        for campaign in &campaigns {
            if !seen.insert(campaign.id) {
                return Err(SnapshotError::DuplicateId(campaign.id));
            }
            if campaign.id == i64::MAX {
                return Err(SnapshotError::IdOutOfRange(campaign.id));
            }
        }

        Ok(Some(campaigns))
    }

    /// Replace the snapshot. serde_json would write a NaN cost as `null`,
    /// which `load` cannot read back, so such sets are refused and the
    /// previous file stays in place.
    pub fn write(&self, campaigns: &[Campaign]) -> Result<(), SnapshotError> {
        if let Some(bad) = campaigns.iter().find(|c| !c.cost.is_finite()) {
            return Err(SnapshotError::NonFiniteCost(bad.id));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_vec_pretty(campaigns)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;

        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotWriter for JsonFileSnapshot {
    fn persist(&self, campaigns: &[Campaign]) {
        match self.write(campaigns) {
            Ok(()) => debug!(
                "Wrote {} campaigns to {}",
                campaigns.len(),
                self.path.display()
            ),
            Err(e) => warn!(
                "Failed to write fallback snapshot {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

enum Command {
    Write(Vec<Campaign>),
    Flush(oneshot::Sender<()>),
}

/// Hands snapshots to a background task so request handlers never wait on
/// disk I/O.
///
/// Each queued snapshot is a complete copy of the cache, so when several are
/// pending only the newest is written.
pub struct BackgroundSnapshotWriter {
    tx: mpsc::UnboundedSender<Command>,
}

impl BackgroundSnapshotWriter {
    /// Must be called from within a tokio runtime.
    pub fn spawn(target: Arc<JsonFileSnapshot>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(target, rx));
        Self { tx }
    }

    /// Wait until every snapshot queued before this call is on disk.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_err() {
            return;
        }
        let _ = done.await;
    }
}

impl SnapshotWriter for BackgroundSnapshotWriter {
    fn persist(&self, campaigns: &[Campaign]) {
        if self.tx.send(Command::Write(campaigns.to_vec())).is_err() {
            warn!("Snapshot writer has stopped, dropping fallback snapshot");
        }
    }
}

async fn run_writer(target: Arc<JsonFileSnapshot>, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(first) = rx.recv().await {
        let mut latest = None;
        let mut acks = Vec::new();

        let mut next = Some(first);
        while let Some(command) = next {
            match command {
                Command::Write(campaigns) => latest = Some(campaigns),
                Command::Flush(ack) => acks.push(ack),
            }
            next = rx.try_recv().ok();
        }

        if let Some(campaigns) = latest {
            let target = target.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || target.persist(&campaigns)).await {
                warn!("Snapshot write task failed: {}", e);
            }
        }

        for ack in acks {
            let _ = ack.send(());
        }
    }

    debug!("Snapshot writer stopped");
}
