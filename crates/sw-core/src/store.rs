use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::types::MonitorEntry;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// MonitorLedger
// ---------------------------------------------------------------------------

/// In-memory view of the monitor store: task id -> entry.
///
/// At most one entry exists per task id. Keys are kept sorted so the
/// persisted file is stable across runs that change nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitorLedger {
    entries: BTreeMap<String, MonitorEntry>,
}

impl MonitorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&MonitorEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Insert or replace the entry for `id`, returning the previous one.
    pub fn insert(&mut self, id: impl Into<String>, entry: MonitorEntry) -> Option<MonitorEntry> {
        self.entries.insert(id.into(), entry)
    }

    pub fn remove(&mut self, id: &str) -> Option<MonitorEntry> {
        self.entries.remove(id)
    }

    /// Drop every entry whose id is not in `present`, returning what was dropped.
    pub fn retain_present(&mut self, present: &HashSet<&str>) -> Vec<(String, MonitorEntry)> {
        let orphaned: Vec<String> = self
            .entries
            .keys()
            .filter(|id| !present.contains(id.as_str()))
            .cloned()
            .collect();
        orphaned
            .into_iter()
            .filter_map(|id| self.entries.remove(&id).map(|entry| (id, entry)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MonitorEntry)> {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// MonitorStore
// ---------------------------------------------------------------------------

const CORRUPT_MARKER: &str = ".corrupted_";

/// Loads and saves the [`MonitorLedger`] as a JSON file on disk.
///
/// A file that cannot be read or parsed is renamed to
/// `<file>.corrupted_<timestamp>` and the ledger starts empty; at most
/// `retained_backups` such files are kept (never fewer than one).
pub struct MonitorStore {
    path: PathBuf,
    retained_backups: usize,
}

impl MonitorStore {
    pub fn new(path: impl Into<PathBuf>, retained_backups: usize) -> Self {
        Self {
            path: path.into(),
            retained_backups,
        }
    }

    /// Load the ledger. Never fails: missing or corrupt files yield an empty ledger.
    pub fn load(&self) -> MonitorLedger {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no monitor store yet, starting empty");
            return MonitorLedger::new();
        }

        let parsed = fs::read_to_string(&self.path)
            .map_err(StoreError::from)
            .and_then(|text| serde_json::from_str::<MonitorLedger>(&text).map_err(StoreError::from));

        match parsed {
            Ok(ledger) => {
                debug!(path = %self.path.display(), entries = ledger.len(), "monitor store loaded");
                ledger
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "monitor store unreadable, starting empty");
                self.quarantine();
                MonitorLedger::new()
            }
        }
    }

    /// Persist the ledger via write-to-temp-then-rename.
    pub fn save(&self, ledger: &MonitorLedger) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(ledger)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), entries = ledger.len(), "monitor store saved");
        Ok(())
    }

    /// Return the file path this store reads/writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Existing corrupt-file backups, oldest first.
    pub fn backups(&self) -> Vec<PathBuf> {
        let (Some(dir), Some(file_name)) = (self.dir(), self.path.file_name()) else {
            return Vec::new();
        };
        let prefix = format!("{}{CORRUPT_MARKER}", file_name.to_string_lossy());
        let Ok(read_dir) = fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut found: Vec<PathBuf> = read_dir
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().starts_with(&prefix))
                    .unwrap_or(false)
            })
            .collect();
        // Timestamp suffixes sort lexicographically in chronological order.
        found.sort();
        found
    }

    fn quarantine(&self) {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let mut backup = self.path.clone().into_os_string();
        backup.push(format!("{CORRUPT_MARKER}{stamp}"));
        let backup = PathBuf::from(backup);

        match fs::rename(&self.path, &backup) {
            Ok(()) => info!(backup = %backup.display(), "corrupt monitor store moved aside"),
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to move corrupt monitor store aside");
                return;
            }
        }

        let backups = self.backups();
        // The backup just written always survives.
        let excess = backups.len().saturating_sub(self.retained_backups.max(1));
        for old in backups.into_iter().take(excess) {
            match fs::remove_file(&old) {
                Ok(()) => debug!(path = %old.display(), "pruned old store backup"),
                Err(e) => warn!(path = %old.display(), error = %e, "failed to prune old store backup"),
            }
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    fn dir(&self) -> Option<PathBuf> {
        match self.path.parent() {
            Some(p) if p.as_os_str().is_empty() => Some(PathBuf::from(".")),
            Some(p) => Some(p.to_path_buf()),
            None => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
