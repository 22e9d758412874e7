use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage keys, kept compatible with earlier builds.
pub const KEY_TOTAL_SECONDS: &str = "stillness.totalSeconds.today";
pub const KEY_DATE: &str = "stillness.date";
pub const KEY_SESSION_IDX: &str = "stillness.lastSessionIdx";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// String-keyed get/set persistence boundary.
///
/// Callers never depend on a store working: every read degrades to a default
/// and every write failure is swallowed, so a broken store costs at most the
/// current run's accumulated time.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// On-disk shape: a flat JSON object of string keys and values.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDoc {
    #[serde(flatten)]
    entries: BTreeMap<String, String>,
}

/// JSON-file-backed store under the platform state directory.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    path: PathBuf,
}

impl FileKvStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self { path: Self::default_path() }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    /// `~/.local/state/stillness/store.json`, falling back to the platform
    /// data dir, falling back to the working directory.
    fn default_path() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("stillness")
                .join("store.json")
        } else if let Some(pd) = ProjectDirs::from("", "", "stillness") {
            pd.data_local_dir().join("store.json")
        } else {
            PathBuf::from("stillness_store.json")
        }
    }

    fn read_doc(&self) -> StoreDoc {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(doc) = serde_json::from_slice::<StoreDoc>(&bytes) {
                return doc;
            }
        }
        StoreDoc::default()
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_doc().entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut doc = self.read_doc();
        doc.entries.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&doc)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// In-memory store for headless tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    map: BTreeMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.map.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Today's calendar-day key, e.g. `2026-08-29`.
pub fn today_key() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Read today's accumulated practice seconds, handling day rollover: a stored
/// date other than today resets the counter to zero and rewrites the date.
pub fn load_accum_seconds_today(store: &mut dyn KvStore) -> u64 {
    let today = today_key();
    match store.get(KEY_DATE) {
        Some(ref d) if *d == today => store
            .get(KEY_TOTAL_SECONDS)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0),
        _ => {
            let _ = store.set(KEY_DATE, &today);
            let _ = store.set(KEY_TOTAL_SECONDS, "0");
            0
        }
    }
}

pub fn save_accum_seconds_today(store: &mut dyn KvStore, total_seconds: u64) {
    let _ = store.set(KEY_DATE, &today_key());
    let _ = store.set(KEY_TOTAL_SECONDS, &total_seconds.to_string());
}

/// Last-used session index, wrapped into registry bounds on read.
pub fn load_last_session_idx(store: &dyn KvStore, registry_len: usize) -> usize {
    let raw = store
        .get(KEY_SESSION_IDX)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0);
    raw.rem_euclid(registry_len as i64) as usize
}

pub fn save_last_session_idx(store: &mut dyn KvStore, idx: usize) {
    let _ = store.set(KEY_SESSION_IDX, &idx.to_string());
}
