// Detection History Store
// Bounded, most-recent-first persistence of past results over a pluggable
// key-value storage slot. Persistence is best-effort: failures are logged
// and never surfaced to the caller.

use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

use crate::models::{DetectionResult, StoredDetection};

/// Storage slot holding the serialized history array.
pub const HISTORY_KEY: &str = "cleansight_detections";

/// Entries kept per history; older ones are evicted from the tail.
const HISTORY_CAP: usize = 100;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable string-keyed storage, injectable so the store can be tested
/// without a real profile directory.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One `{key}.json` file per slot under a data directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Default per-user data directory.
    pub fn default_data_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|p| p.join("cleansight"))
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.slot_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-memory storage for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Bounded history of detection results over one storage slot.
///
/// Not transactional: concurrent record/clear on the same slot is
/// last-writer-wins, which is acceptable for the single-user profile this
/// store is scoped to.
pub struct HistoryStore<S: StorageBackend> {
    storage: S,
}

impl<S: StorageBackend> HistoryStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Prepend a result (stamped with the capture time) and truncate to the
    /// most recent entries. Never fails: a submission that succeeded is not
    /// turned into an error by history bookkeeping.
    pub fn record(&self, result: &DetectionResult) {
        let mut history = self.list();
        history.insert(
            0,
            StoredDetection {
                result: result.clone(),
                timestamp: Utc::now().timestamp_millis(),
            },
        );
        history.truncate(HISTORY_CAP);

        match serde_json::to_string(&history) {
            Ok(json) => {
                if let Err(e) = self.storage.set(HISTORY_KEY, &json) {
                    warn!(error = %e, "failed to save detection history");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize detection history"),
        }
    }

    /// Stored history, most recent first. Missing or corrupt data reads as
    /// empty rather than failing.
    pub fn list(&self) -> Vec<StoredDetection> {
        match self.storage.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(items) => items,
                Err(e) => {
                    warn!(key = HISTORY_KEY, error = %e, "stored history is corrupt, treating as empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = HISTORY_KEY, error = %e, "failed to read stored history");
                Vec::new()
            }
        }
    }

    /// Drop the stored history entirely.
    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(HISTORY_KEY) {
            warn!(error = %e, "failed to clear detection history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageDimensions;

    fn result(processing_time: f64) -> DetectionResult {
        DetectionResult {
            success: true,
            detections: Vec::new(),
            processing_time,
            image_dimensions: ImageDimensions {
                width: 800,
                height: 600,
            },
        }
    }

    #[test]
    fn test_record_then_list() {
        let store = HistoryStore::new(MemoryStorage::new());
        let before = Utc::now().timestamp_millis();
        store.record(&result(1.25));

        let history = store.list();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].result.processing_time, 1.25);
        assert!(history[0].timestamp >= before);
    }

    #[test]
    fn test_most_recent_first() {
        let store = HistoryStore::new(MemoryStorage::new());
        store.record(&result(1.0));
        store.record(&result(2.0));
        store.record(&result(3.0));

        let history = store.list();
        assert_eq!(history[0].result.processing_time, 3.0);
        assert_eq!(history[2].result.processing_time, 1.0);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let store = HistoryStore::new(MemoryStorage::new());
        for i in 0..105 {
            store.record(&result(i as f64));
        }

        let history = store.list();
        assert_eq!(history.len(), 100);
        assert_eq!(history[0].result.processing_time, 104.0);
        // The first five records fell off the tail
        assert_eq!(history[99].result.processing_time, 5.0);
    }

    #[test]
    fn test_clear() {
        let store = HistoryStore::new(MemoryStorage::new());
        store.record(&result(1.0));
        store.clear();
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_empty_storage_lists_empty() {
        let store = HistoryStore::new(MemoryStorage::new());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_corrupt_slot_lists_empty() {
        let storage = MemoryStorage::new();
        storage.set(HISTORY_KEY, "{not json").unwrap();
        let store = HistoryStore::new(storage);
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_record_recovers_from_corrupt_slot() {
        let storage = MemoryStorage::new();
        storage.set(HISTORY_KEY, "[[[").unwrap();
        let store = HistoryStore::new(storage);
        store.record(&result(4.0));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(FileStorage::new(dir.path().join("data")));
        assert!(store.list().is_empty());

        store.record(&result(1.5));
        store.record(&result(2.5));
        assert_eq!(store.list().len(), 2);

        store.clear();
        assert!(store.list().is_empty());
        // Clearing an already-empty slot is fine
        store.clear();
    }
}
