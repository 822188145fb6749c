//! Snapshot copies of the database with bounded retention.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use crate::error::DatabaseError;
use crate::store::traits::Database;

/// Number of snapshots kept after each backup.
pub const DEFAULT_KEEP: usize = 5;

const BACKUP_PREFIX: &str = "backup_";

pub struct BackupManager {
    db: Arc<dyn Database>,
    dir: PathBuf,
    keep: usize,
}

impl BackupManager {
    pub fn new(db: Arc<dyn Database>, dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            dir: dir.into(),
            keep: DEFAULT_KEEP,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a new snapshot and prune old ones. Returns the snapshot path.
    pub async fn create_snapshot(&self) -> Result<PathBuf, DatabaseError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DatabaseError::Backup(format!("create {}: {e}", self.dir.display())))?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S%.6f");
        let path = self.dir.join(format!("{BACKUP_PREFIX}{stamp}.db"));
        self.db.backup_to(&path).await?;
        info!(path = %path.display(), "Backup created");

        if let Err(e) = self.prune().await {
            warn!("Backup pruning failed: {e}");
        }
        Ok(path)
    }

    /// Delete all but the newest `keep` snapshots, ordered by filename.
    async fn prune(&self) -> std::io::Result<()> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(BACKUP_PREFIX) {
                names.push(name);
            }
        }
        names.sort();

        let excess = names.len().saturating_sub(self.keep);
        for name in &names[..excess] {
            match tokio::fs::remove_file(self.dir.join(name)).await {
                Ok(()) => info!(file = %name, "Old backup removed"),
                Err(e) => warn!(file = %name, "Failed to remove old backup: {e}"),
            }
        }
        Ok(())
    }
}
