use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use std::path::Path;

use cleansight::models::{DetectionResult, StoredDetection, UploadFile};
use cleansight::services::{
    detection_stats, summarize_upload, CleanSightConfig, DetectionService, FileStorage,
    HistoryStore, HttpDetectionClient, SimulatedDetectionClient,
};

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn usage() {
    eprintln!(
        "Usage:\n  cleansight detect <path> [--simulate] [--api-url <url>] [--no-save] [--json]\n  cleansight history [--limit <n>] [--json]\n  cleansight stats [--json]\n  cleansight clear\n\nNotes:\n  - `detect` validates the file, submits it to the detection API at\n    CLEANSIGHT_API_URL (default http://localhost:8000) and saves the result\n    to local history unless --no-save is given.\n  - `--simulate` uses the built-in simulated backend instead of the API."
    );
}

fn history_store() -> HistoryStore<FileStorage> {
    let data_dir =
        FileStorage::default_data_dir().unwrap_or_else(|| Path::new(".cleansight").to_path_buf());
    HistoryStore::new(FileStorage::new(data_dir))
}

fn print_result(result: &DetectionResult) {
    let summary = summarize_upload(result);
    println!(
        "success: {}  detections: {}  confidence: {}%  processed in {:.2}s ({}x{})",
        result.success,
        summary.total_detections,
        summary.confidence,
        result.processing_time,
        result.image_dimensions.width,
        result.image_dimensions.height,
    );
    for detection in &result.detections {
        println!(
            "  #{} {} {:.0}%  bbox [{:.0}, {:.0}, {:.0}, {:.0}]",
            detection.id,
            detection.r#type,
            detection.confidence * 100.0,
            detection.bbox[0],
            detection.bbox[1],
            detection.bbox[2],
            detection.bbox[3],
        );
    }
}

fn print_entry(entry: &StoredDetection) {
    let when = Utc
        .timestamp_millis_opt(entry.timestamp)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("@{}", entry.timestamp));
    let summary = summarize_upload(&entry.result);
    println!(
        "{}  detections: {}  confidence: {}%",
        when, summary.total_detections, summary.confidence
    );
}

async fn run_detect(args: &[String]) -> Result<()> {
    let path = args
        .first()
        .filter(|a| !a.starts_with("--"))
        .context("detect requires a file path")?;
    let file = UploadFile::from_path(Path::new(path))
        .with_context(|| format!("failed to read {}", path))?;

    let mut config = CleanSightConfig::from_env();
    if let Some(url) = parse_arg_value(args, "--api-url") {
        config.api_base_url = url;
    }

    let result = if has_flag(args, "--simulate") {
        DetectionService::new(config, SimulatedDetectionClient::default())
            .submit(&file)
            .await?
    } else {
        let backend = HttpDetectionClient::new(&config);
        DetectionService::new(config, backend).submit(&file).await?
    };

    if !has_flag(args, "--no-save") {
        history_store().record(&result);
    }

    if has_flag(args, "--json") {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn run_history(args: &[String]) -> Result<()> {
    let limit: usize = parse_arg_value(args, "--limit")
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);
    let history = history_store().list();

    if has_flag(args, "--json") {
        let page: Vec<_> = history.iter().take(limit).collect();
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No saved detections.");
        return Ok(());
    }
    for entry in history.iter().take(limit) {
        print_entry(entry);
    }
    if history.len() > limit {
        println!("... and {} more", history.len() - limit);
    }
    Ok(())
}

fn run_stats(args: &[String]) -> Result<()> {
    let stats = detection_stats(&history_store().list());

    if has_flag(args, "--json") {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("uploads:            {}", stats.total_uploads);
    println!("detections:         {}", stats.total_detections);
    println!("average confidence: {}%", stats.average_confidence);
    println!("clean images:       {}", stats.clean_images);
    let mut by_type: Vec<_> = stats.detections_by_type.iter().collect();
    by_type.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (kind, count) in by_type {
        println!("  {:<20} {}", kind, count);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    cleansight::init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        usage();
        return Ok(());
    };

    match command.as_str() {
        "detect" => run_detect(&args[1..]).await,
        "history" => run_history(&args[1..]),
        "stats" => run_stats(&args[1..]),
        "clear" => {
            history_store().clear();
            println!("History cleared.");
            Ok(())
        }
        other => {
            usage();
            bail!("unknown command: {}", other);
        }
    }
}
