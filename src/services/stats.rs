// Statistics Aggregation
// Pure summaries over a history snapshot; nothing here is persisted

use std::collections::HashMap;

use crate::models::{DetectionResult, DetectionStats, StoredDetection, UploadSummary};

/// Aggregate a history snapshot into summary statistics.
///
/// `average_confidence` is the mean over the flattened detection list of the
/// whole history (0-100). That is deliberately not the mean of per-upload
/// means: uploads with more detections weigh more. The per-upload notion
/// lives in [`summarize_upload`].
pub fn detection_stats(history: &[StoredDetection]) -> DetectionStats {
    if history.is_empty() {
        return DetectionStats::default();
    }

    let total_uploads = history.len() as u64;
    let total_detections = history
        .iter()
        .map(|entry| entry.result.detections.len() as u64)
        .sum();
    let clean_images = history
        .iter()
        .filter(|entry| entry.result.detections.is_empty())
        .count() as u64;

    let mut detections_by_type: HashMap<String, u64> = HashMap::new();
    let mut confidence_sum = 0.0;
    let mut detection_count = 0u64;
    for detection in history.iter().flat_map(|e| e.result.detections.iter()) {
        *detections_by_type
            .entry(detection.r#type.clone())
            .or_insert(0) += 1;
        confidence_sum += detection.confidence;
        detection_count += 1;
    }

    let average_confidence = if detection_count > 0 {
        (confidence_sum / detection_count as f64 * 100.0).round() as u32
    } else {
        0
    };

    DetectionStats {
        total_uploads,
        total_detections,
        average_confidence,
        detections_by_type,
        clean_images,
    }
}

/// Per-upload display summary: detection count plus the upload's own mean
/// confidence as a 0-100 integer (0 for a clean result).
pub fn summarize_upload(result: &DetectionResult) -> UploadSummary {
    let total_detections = result.detections.len() as u64;
    let confidence = if result.detections.is_empty() {
        0
    } else {
        let mean = result.detections.iter().map(|d| d.confidence).sum::<f64>()
            / result.detections.len() as f64;
        (mean * 100.0).round() as u32
    };

    UploadSummary {
        total_detections,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Detection, ImageDimensions};

    fn entry(confidences: &[f64]) -> StoredDetection {
        entry_typed(&confidences.iter().map(|&c| ("litter", c)).collect::<Vec<_>>())
    }

    fn entry_typed(detections: &[(&str, f64)]) -> StoredDetection {
        StoredDetection {
            result: DetectionResult {
                success: true,
                detections: detections
                    .iter()
                    .enumerate()
                    .map(|(i, (kind, confidence))| Detection {
                        id: i as i64 + 1,
                        r#type: kind.to_string(),
                        confidence: *confidence,
                        bbox: [0.0, 0.0, 10.0, 10.0],
                    })
                    .collect(),
                processing_time: 1.0,
                image_dimensions: ImageDimensions {
                    width: 800,
                    height: 600,
                },
            },
            timestamp: 0,
        }
    }

    #[test]
    fn test_empty_history() {
        let stats = detection_stats(&[]);
        assert_eq!(stats, DetectionStats::default());
        assert_eq!(stats.total_uploads, 0);
        assert_eq!(stats.average_confidence, 0);
        assert!(stats.detections_by_type.is_empty());
    }

    #[test]
    fn test_mixed_history() {
        let history = vec![entry(&[0.9]), entry(&[0.7]), entry(&[])];
        let stats = detection_stats(&history);
        assert_eq!(stats.total_uploads, 3);
        assert_eq!(stats.total_detections, 2);
        assert_eq!(stats.average_confidence, 80);
        assert_eq!(stats.clean_images, 1);
    }

    #[test]
    fn test_all_clean_history_has_zero_confidence() {
        let history = vec![entry(&[]), entry(&[])];
        let stats = detection_stats(&history);
        assert_eq!(stats.total_uploads, 2);
        assert_eq!(stats.total_detections, 0);
        assert_eq!(stats.average_confidence, 0);
        assert_eq!(stats.clean_images, 2);
    }

    #[test]
    fn test_detections_by_type() {
        let history = vec![
            entry_typed(&[("plastic_bottle", 0.9), ("cigarette_butt", 0.8)]),
            entry_typed(&[("plastic_bottle", 0.7)]),
        ];
        let stats = detection_stats(&history);
        assert_eq!(stats.detections_by_type.len(), 2);
        assert_eq!(stats.detections_by_type["plastic_bottle"], 2);
        assert_eq!(stats.detections_by_type["cigarette_butt"], 1);
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let history = vec![
            entry_typed(&[("plastic_bottle", 0.92), ("food_wrapper", 0.78)]),
            entry(&[]),
            entry(&[0.5]),
        ];
        assert_eq!(detection_stats(&history), detection_stats(&history));
    }

    #[test]
    fn test_global_mean_weighs_busy_uploads() {
        // One upload with two high-confidence detections, one with a single
        // low-confidence detection: flattened mean != mean of upload means.
        let history = vec![entry(&[1.0, 1.0]), entry(&[0.4])];
        let stats = detection_stats(&history);
        assert_eq!(stats.average_confidence, 80); // (1.0+1.0+0.4)/3
    }

    #[test]
    fn test_summarize_upload() {
        let busy = entry_typed(&[
            ("plastic_bottle", 0.92),
            ("cigarette_butt", 0.85),
            ("food_wrapper", 0.78),
        ]);
        let summary = summarize_upload(&busy.result);
        assert_eq!(summary.total_detections, 3);
        assert_eq!(summary.confidence, 85);

        let clean = entry(&[]);
        let summary = summarize_upload(&clean.result);
        assert_eq!(summary.total_detections, 0);
        assert_eq!(summary.confidence, 0);
    }
}
