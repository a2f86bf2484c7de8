// Pipeline Configuration
// Explicit config struct handed to the validator and detection client;
// env overrides are applied only through from_env()

use std::env;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

fn default_supported_formats() -> Vec<String> {
    [
        "image/jpeg",
        "image/png",
        "image/webp",
        "video/mp4",
        "video/webm",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone)]
pub struct CleanSightConfig {
    /// Base URL of the detection backend; requests go to `{base}/api/detect`.
    pub api_base_url: String,
    /// Maximum accepted upload size in bytes.
    pub max_file_size: u64,
    /// MIME types accepted for upload.
    pub supported_formats: Vec<String>,
}

impl Default for CleanSightConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            supported_formats: default_supported_formats(),
        }
    }
}

impl CleanSightConfig {
    /// Defaults with `CLEANSIGHT_API_URL`, `CLEANSIGHT_MAX_FILE_SIZE` and
    /// `CLEANSIGHT_SUPPORTED_FORMATS` (comma-separated) applied on top.
    pub fn from_env() -> Self {
        let api_base_url =
            env::var("CLEANSIGHT_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let max_file_size = env::var("CLEANSIGHT_MAX_FILE_SIZE")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_FILE_SIZE);
        let supported_formats = env::var("CLEANSIGHT_SUPPORTED_FORMATS")
            .ok()
            .map(|v| parse_formats(&v))
            .filter(|f| !f.is_empty())
            .unwrap_or_else(default_supported_formats);

        Self {
            api_base_url,
            max_file_size,
            supported_formats,
        }
    }

    /// The size limit expressed in megabytes, for error messages. Exact
    /// quotient, so a fractional limit reports as e.g. "1.5".
    pub fn max_file_size_mb(&self) -> f64 {
        self.max_file_size as f64 / (1024.0 * 1024.0)
    }
}

fn parse_formats(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CleanSightConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.max_file_size, 10_485_760);
        assert_eq!(config.max_file_size_mb(), 10.0);
        assert_eq!(config.supported_formats.len(), 5);
        assert!(config.supported_formats.iter().any(|f| f == "video/webm"));
    }

    #[test]
    fn test_fractional_size_limit_keeps_exact_quotient() {
        let config = CleanSightConfig {
            max_file_size: 1_572_864, // 1.5 MiB
            ..CleanSightConfig::default()
        };
        assert_eq!(config.max_file_size_mb(), 1.5);
        assert_eq!(format!("{}MB", config.max_file_size_mb()), "1.5MB");
    }

    #[test]
    fn test_parse_formats() {
        let formats = parse_formats("image/jpeg, image/png ,,video/mp4");
        assert_eq!(formats, vec!["image/jpeg", "image/png", "video/mp4"]);
        assert!(parse_formats("  ").is_empty());
    }
}
