//! Terminal banner and run summary

use sentinel_core::{SentinelConfig, StatsSnapshot};
use std::time::Duration;

const RULE: &str = "============================================================";

pub fn print_banner(config: &SentinelConfig, source: &str, provider: &str) {
    println!("\n{RULE}");
    println!("Sentinel - Weapon Detection System (terminal mode)");
    println!("{RULE}");
    println!("Source: {source}");
    println!("Inference: {provider}");
    println!(
        "Confidence threshold: {:.2}",
        config.detection.confidence_threshold
    );
    println!(
        "Debounce: {} frames | Cooldown: {:.1}s",
        config.detection.min_consecutive_frames, config.detection.cooldown_secs
    );
    println!("{RULE}\n");
}

pub fn print_summary(stats: &StatsSnapshot, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    let fps = if secs > 0.0 {
        stats.frames_processed as f64 / secs
    } else {
        0.0
    };

    println!("\n{RULE}");
    println!("Detection Summary");
    println!("{RULE}");
    println!("Total frames: {}", stats.frames_processed);
    println!("Dropped frames: {}", stats.frames_dropped);
    println!("Total detections: {}", stats.detections);
    println!("Malformed detections dropped: {}", stats.malformed_dropped);
    println!("Alerts raised: {}", stats.alerts_raised);
    println!("Notifications dropped: {}", stats.notifications_dropped);
    println!("Inference errors: {}", stats.inference_errors);
    println!("Runtime: {secs:.1} seconds");
    println!("Average FPS: {fps:.1}");
    println!("{RULE}\n");
}

pub fn rule() -> &'static str {
    RULE
}
