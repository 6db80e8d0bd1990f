use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// On-disk shape of the state file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedKeys {
    // Older state files called this "processed_videos".
    #[serde(default, alias = "processed_videos")]
    processed_keys: Vec<String>,
}

/// Append-only set of already-notified record keys, persisted as JSON.
///
/// Keys are only ever added. A missing or corrupt file loads as an empty
/// set, which means everything looks new again; that costs duplicate
/// notifications, never lost ones. Writes happen only through `flush`.
pub struct DedupStore {
    path: PathBuf,
    keys: HashSet<String>,
    dirty: bool,
}

impl DedupStore {
    pub fn load(path: &Path) -> Self {
        let keys = match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<PersistedKeys>(&raw) {
                Ok(persisted) => {
                    let keys: HashSet<String> = persisted.processed_keys.into_iter().collect();
                    info!(count = keys.len(), path = %path.display(), "Loaded dedup state");
                    keys
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Corrupt dedup state, starting fresh");
                    HashSet::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "No dedup state yet, starting fresh");
                HashSet::new()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Could not read dedup state, starting fresh");
                HashSet::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            keys,
            dirty: false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Mark a key as notified. The change is in memory until `flush`.
    pub fn record(&mut self, key: &str) {
        if self.keys.insert(key.to_string()) {
            self.dirty = true;
        }
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Write the full set back to disk, sorted so the file stays diffable.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create state dir {}", parent.display()))?;
            }
        }

        let mut processed_keys: Vec<String> = self.keys.iter().cloned().collect();
        processed_keys.sort();
        let json = serde_json::to_string_pretty(&PersistedKeys { processed_keys })?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write dedup state to {}", self.path.display()))?;

        self.dirty = false;
        info!(count = self.keys.len(), path = %self.path.display(), "Flushed dedup state");
        Ok(())
    }
}
