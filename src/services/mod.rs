// CleanSight Core Services
// Validation gate, detection client, history store, statistics

pub mod config;
pub mod detector;
pub mod history;
pub mod stats;
pub mod validator;

pub use config::CleanSightConfig;
pub use detector::{
    DetectError, DetectionBackend, DetectionService, HttpDetectionClient, SimulatedDetectionClient,
};
pub use history::{
    FileStorage, HistoryStore, MemoryStorage, StorageBackend, StorageError, HISTORY_KEY,
};
pub use stats::{detection_stats, summarize_upload};
pub use validator::validate;
