//! Logged activity history: per-day aggregation, merging and persistence.
//!
//! History is kept as a single JSON array on disk. Imports and syncs never edit
//! entries in place; they merge new entries in and replace the whole file.

use crate::{Error, HistoryEntry, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Label given to synthetic entries built from several logged activities
pub const AGGREGATED: &str = "Aggregated";

/// Collapse every entry logged on `date` into one.
///
/// A single entry is returned unchanged. Several entries are summed, with
/// their distinct sport labels joined by `" + "` in first-seen order.
pub fn aggregate_for_date(date: NaiveDate, entries: &[HistoryEntry]) -> Option<HistoryEntry> {
    let day: Vec<&HistoryEntry> = entries.iter().filter(|e| e.date == date).collect();

    match day.as_slice() {
        [] => None,
        [single] => Some((*single).clone()),
        many => {
            let duration_min = many.iter().map(|e| e.duration_min).sum();
            let distance_km = many.iter().map(|e| e.distance_km.unwrap_or(0.0)).sum();

            let mut seen = HashSet::new();
            let sports: Vec<&str> = many
                .iter()
                .map(|e| e.sport.as_str())
                .filter(|s| seen.insert(*s))
                .collect();

            Some(HistoryEntry {
                date,
                sport: sports.join(" + "),
                duration_min,
                distance_km: Some(distance_km),
                original_string: Some(AGGREGATED.into()),
            })
        }
    }
}

/// Entries whose date lies in `start..=end`
pub fn entries_between(
    entries: &[HistoryEntry],
    start: NaiveDate,
    end: NaiveDate,
) -> impl Iterator<Item = &HistoryEntry> {
    entries.iter().filter(move |e| e.date >= start && e.date <= end)
}

/// Result of merging new entries into a history
#[derive(Clone, Debug)]
pub struct MergeOutcome {
    /// Deduplicated entries, newest date first
    pub entries: Vec<HistoryEntry>,
    /// How many entries the merge added
    pub added: usize,
}

/// Merge `incoming` into `existing`.
///
/// Entries are unique by `(date, sport, duration_min)`; the first occurrence
/// wins, so existing entries are never replaced by incoming ones.
pub fn merge_entries(existing: &[HistoryEntry], incoming: &[HistoryEntry]) -> MergeOutcome {
    let mut seen = HashSet::new();
    let mut entries: Vec<HistoryEntry> = existing
        .iter()
        .chain(incoming)
        .filter(|e| seen.insert((e.date, e.sport.clone(), e.duration_min)))
        .cloned()
        .collect();

    // Stable sort keeps same-day entries in arrival order
    entries.sort_by(|a, b| b.date.cmp(&a.date));

    let added = entries.len().saturating_sub(existing.len());
    tracing::debug!(
        "Merged {} incoming entries: {} added, {} total",
        incoming.len(),
        added,
        entries.len()
    );

    MergeOutcome { entries, added }
}

/// JSON-file backed history
#[derive(Clone, Debug)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data_dir>/history.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("history.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all entries with shared locking
    ///
    /// Returns an empty history if the file doesn't exist. A corrupted file is
    /// an error: silently starting over would drop the user's log on next save.
    pub fn load(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            tracing::info!("No history file at {:?}, starting empty", self.path);
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        let entries: Vec<HistoryEntry> = serde_json::from_str(&contents).map_err(|e| {
            tracing::warn!("Failed to parse history file {:?}: {}", self.path, e);
            Error::Json(e)
        })?;

        tracing::debug!("Loaded {} history entries from {:?}", entries.len(), self.path);
        Ok(entries)
    }

    /// Save entries with exclusive locking
    ///
    /// Atomically writes history by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, entries: &[HistoryEntry]) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "history path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, entries)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} history entries to {:?}", entries.len(), self.path);
        Ok(())
    }

    /// Load, merge `incoming` and save the result
    pub fn merge_and_save(&self, incoming: &[HistoryEntry]) -> Result<MergeOutcome> {
        let existing = self.load()?;
        let outcome = merge_entries(&existing, incoming);
        if outcome.added > 0 {
            self.save(&outcome.entries)?;
        }
        tracing::info!(
            "History now holds {} entries ({} new)",
            outcome.entries.len(),
            outcome.added
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_iso_date;

    fn entry(date: &str, sport: &str, minutes: u32, km: Option<f64>) -> HistoryEntry {
        HistoryEntry {
            date: parse_iso_date(date).unwrap(),
            sport: sport.into(),
            duration_min: minutes,
            distance_km: km,
            original_string: Some(format!("CSV: {}", sport)),
        }
    }

    #[test]
    fn test_aggregate_single_entry_unchanged() {
        let e = entry("2025-12-14", "Wandern", 135, Some(9.8));
        let history = vec![e.clone(), entry("2025-12-15", "Laufen", 40, None)];

        let actual = aggregate_for_date(e.date, &history).unwrap();
        assert_eq!(actual, e);
    }

    #[test]
    fn test_aggregate_multiple_entries() {
        let history = vec![
            entry("2025-12-13", "Walk", 60, Some(5.0)),
            entry("2025-12-13", "Rudern", 30, Some(7.2)),
            entry("2025-12-13", "Walk", 15, None),
        ];

        let actual = aggregate_for_date(history[0].date, &history).unwrap();
        assert_eq!(actual.sport, "Walk + Rudern");
        assert_eq!(actual.duration_min, 105);
        assert!((actual.distance_km.unwrap() - 12.2).abs() < 1e-9);
        assert_eq!(actual.original_string.as_deref(), Some(AGGREGATED));
    }

    #[test]
    fn test_aggregate_empty_day() {
        let history = vec![entry("2025-12-13", "Walk", 60, None)];
        assert!(aggregate_for_date(parse_iso_date("2025-12-14").unwrap(), &history).is_none());
    }

    #[test]
    fn test_merge_deduplicates() {
        let existing = vec![
            entry("2025-12-13", "Walk", 60, None),
            entry("2025-12-14", "Ruck", 135, None),
        ];
        let incoming = vec![
            entry("2025-12-14", "Ruck", 135, Some(11.0)),
            entry("2025-12-15", "Zwift", 45, None),
        ];

        let outcome = merge_entries(&existing, &incoming);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.entries.len(), 3);
        // Newest first, and the existing duplicate wins
        assert_eq!(outcome.entries[0].sport, "Zwift");
        assert_eq!(outcome.entries[1].distance_km, None);
    }

    #[test]
    fn test_merge_exact_duplicate_keeps_count() {
        let existing = vec![entry("2025-12-13", "Walk", 60, None)];
        let outcome = merge_entries(&existing, &existing);
        assert_eq!(outcome.added, 0);
        assert_eq!(outcome.entries.len(), 1);
    }

    #[test]
    fn test_entries_between() {
        let history = vec![
            entry("2025-12-07", "Walk", 60, None),
            entry("2025-12-08", "Walk", 60, None),
            entry("2025-12-14", "Walk", 60, None),
            entry("2025-12-15", "Walk", 60, None),
        ];
        let start = parse_iso_date("2025-12-08").unwrap();
        let end = parse_iso_date("2025-12-14").unwrap();
        assert_eq!(entries_between(&history, start, end).count(), 2);
    }

    #[test]
    fn test_store_roundtrip_and_merge() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::in_dir(temp_dir.path());

        assert!(store.load().unwrap().is_empty());

        let first = store
            .merge_and_save(&[entry("2025-12-13", "Walk", 60, Some(4.5))])
            .unwrap();
        assert_eq!(first.added, 1);

        let second = store
            .merge_and_save(&[
                entry("2025-12-13", "Walk", 60, Some(4.5)),
                entry("2025-12-14", "Ruck", 135, None),
            ])
            .unwrap();
        assert_eq!(second.added, 1);

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].sport, "Ruck");
    }

    #[test]
    fn test_corrupted_store_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::in_dir(temp_dir.path());
        std::fs::write(store.path(), "[{ not json").unwrap();

        assert!(matches!(store.load(), Err(Error::Json(_))));
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::in_dir(temp_dir.path());
        store.save(&[entry("2025-12-13", "Walk", 60, None)]).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "history.json")
            .collect();
        assert!(extras.is_empty(), "unexpected files: {:?}", extras);
    }
}
