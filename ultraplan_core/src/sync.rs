//! Pulling activities from a source into the stored history.

use crate::activity::ActivitySource;
use crate::history::HistoryStore;
use crate::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

const LOCK_FILE: &str = "sync.lock";

/// Held for the duration of one sync; released on drop
#[derive(Debug)]
pub struct SyncGuard {
    file: File,
}

impl SyncGuard {
    /// Take the in-flight guard in `dir`, failing fast if another sync holds it
    pub fn acquire(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;

        file.try_lock_exclusive().map_err(|e| {
            if e.kind() == fs2::lock_contended_error().kind() {
                Error::SyncInProgress
            } else {
                Error::Io(e)
            }
        })?;

        Ok(Self { file })
    }
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release sync lock: {}", e);
        }
    }
}

/// Outcome of one sync
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub added: usize,
}

/// Fetch from `source` and merge the result into `store`
pub fn sync_from(
    source: &dyn ActivitySource,
    store: &HistoryStore,
    guard_dir: &Path,
) -> Result<SyncReport> {
    let _guard = SyncGuard::acquire(guard_dir)?;

    tracing::info!("Syncing activities from {}", source.name());
    let fetched = source.fetch()?;
    let outcome = store.merge_and_save(&fetched)?;

    let report = SyncReport {
        fetched: fetched.len(),
        added: outcome.added,
    };
    tracing::info!(
        "Sync from {} done: {} fetched, {} new",
        source.name(),
        report.fetched,
        report.added
    );
    Ok(report)
}
