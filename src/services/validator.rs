// Upload Validation
// Size and MIME-type gate run before anything touches the network

use crate::models::{UploadFile, ValidationResult};
use crate::services::config::CleanSightConfig;

/// Validate an upload against the configured size and format policy.
///
/// Both checks run even when the first fails, so the caller gets every
/// violation in one pass. A missing file short-circuits with a single error.
pub fn validate(file: Option<&UploadFile>, config: &CleanSightConfig) -> ValidationResult {
    let mut errors = Vec::new();

    let Some(file) = file else {
        errors.push("No file provided".to_string());
        return ValidationResult {
            is_valid: false,
            errors,
        };
    };

    if file.size > config.max_file_size {
        errors.push(format!(
            "File size exceeds {}MB limit",
            config.max_file_size_mb()
        ));
    }

    if !config.supported_formats.iter().any(|f| f == &file.mime_type) {
        errors.push(format!(
            "Unsupported file format. Supported formats: {}",
            config.supported_formats.join(", ")
        ));
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}
