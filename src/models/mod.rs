// CleanSight Data Models
// Shapes shared between the detection pipeline and the presentation layer

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::Path;

// ============ Upload ============

/// An uploaded image or video, as handed to the pipeline by the caller.
///
/// `size` is the declared size in bytes. `from_bytes` derives it from the
/// payload; callers validating ahead of a full read may set it from file
/// metadata instead.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn from_bytes(file_name: &str, mime_type: &str, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            size: data.len() as u64,
            data,
        }
    }

    /// Read a file from disk, deriving the MIME type from its extension.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let mime_type = mime_for_extension(
            path.extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_default()
                .as_str(),
        );
        Ok(Self {
            file_name,
            mime_type: mime_type.to_string(),
            size: data.len() as u64,
            data,
        })
    }
}

pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

// ============ Validation ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

// ============ Detection ============

/// One detected object instance: category label, confidence in [0,1] and a
/// `[x1, y1, x2, y2]` pixel bounding box with x1<=x2, y1<=y2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: i64,
    pub r#type: String,
    pub confidence: f64,
    pub bbox: [f64; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// One completed submission, in the exact shape the detection API returns.
/// Field names stay verbatim (`processing_time`, `image_dimensions`); the
/// remote shape is trusted as-is with no remapping or defaulting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub success: bool,
    pub detections: Vec<Detection>,
    pub processing_time: f64,
    pub image_dimensions: ImageDimensions,
}

/// A `DetectionResult` as persisted in history, stamped at record time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDetection {
    #[serde(flatten)]
    pub result: DetectionResult,
    /// Capture time, epoch milliseconds.
    pub timestamp: i64,
}

// ============ Statistics ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DetectionStats {
    pub total_uploads: u64,
    pub total_detections: u64,
    /// Mean confidence over every detection in the history, as a 0-100
    /// integer. Distinct from the per-upload mean in `UploadSummary`.
    pub average_confidence: u32,
    pub detections_by_type: HashMap<String, u64>,
    pub clean_images: u64,
}

/// Per-upload display summary: detection count and mean confidence (0-100).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub total_detections: u64,
    pub confidence: u32,
}
