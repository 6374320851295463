// Sentinel Command Line Interface
// Terminal-mode weapon detection: live watch, self-check, and alert history.

mod console;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sentinel_alert::sink::{resolve_snapshot_dir, NotificationSink};
use sentinel_alert::{
    AlertDispatcher, AlertEngine, AlertPolicy, ConsoleSink, EventLogSink, SnapshotSink,
};
use sentinel_core::{PipelineStats, SentinelConfig};
use sentinel_eye::capture::SourceFactory;
use sentinel_eye::{
    CaptureSupervisor, DetectionPipeline, FrameQueue, FrameSource, InferenceProvider,
    ScriptedProvider, SyntheticSource, VideoSource,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Sentinel - terminal weapon detection over a live video feed", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./sentinel.toml when present)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a video source and raise alerts
    Watch {
        /// Video source: webcam index (0, 1, ...) or an RTSP URL
        #[arg(long, short)]
        source: Option<String>,

        /// Detection confidence threshold (0.0 - 1.0)
        #[arg(long, short = 't')]
        confidence: Option<f32>,

        /// Run without camera or model: synthetic frames and a scripted
        /// detection schedule
        #[arg(long)]
        synthetic: bool,

        /// Detection model path (overrides the configured one)
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Validate configuration, alert storage, and the detection model
    Check {
        /// Detection model path (overrides the configured one)
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Show recent alerts from the event log
    Alerts {
        /// Number of alerts to show
        #[arg(long, short = 'n', default_value = "10")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Watch {
            source,
            confidence,
            synthetic,
            model,
        } => {
            if let Some(source) = source {
                config.capture.source = source;
            }
            if let Some(confidence) = confidence {
                config.detection.confidence_threshold = confidence;
            }
            config
                .validate()
                .context("invalid configuration for watch")?;
            watch(config, synthetic, model).await
        }
        Commands::Check { model } => check(&config, model),
        Commands::Alerts { count } => alerts(&config, count),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SentinelConfig> {
    match path {
        Some(path) => {
            SentinelConfig::load(path).with_context(|| format!("loading {}", path.display()))
        }
        None => {
            let default_path = Path::new("sentinel.toml");
            if default_path.exists() {
                SentinelConfig::load(default_path).context("loading ./sentinel.toml")
            } else {
                Ok(SentinelConfig::default())
            }
        }
    }
}

async fn watch(
    config: SentinelConfig,
    synthetic: bool,
    model: Option<PathBuf>,
) -> anyhow::Result<()> {
    let source: VideoSource = config.capture.source.parse()?;
    let stats = Arc::new(PipelineStats::new());
    let queue = Arc::new(FrameQueue::new(config.capture.queue_capacity));
    let snapshot_dir = resolve_snapshot_dir(&config.alerts.snapshot_dir);

    let event_log = Arc::new(EventLogSink::new(
        config.alerts.event_log.clone(),
        config.alerts.recent_capacity,
    ));
    let sinks: Vec<Arc<dyn NotificationSink>> = vec![
        Arc::new(ConsoleSink::new(config.alerts.console_bell)),
        Arc::new(SnapshotSink::new()),
        event_log.clone(),
    ];
    let dispatcher = AlertDispatcher::spawn(sinks, config.alerts.dispatch_capacity, stats.clone());

    let (provider, provider_desc): (Arc<dyn InferenceProvider>, String) = if synthetic {
        (
            Arc::new(ScriptedProvider::demo()),
            "scripted demo".to_string(),
        )
    } else {
        build_model_provider(&config, model)?
    };

    let engine = AlertEngine::new(AlertPolicy {
        confidence_threshold: config.detection.confidence_threshold,
        min_consecutive_frames: config.detection.min_consecutive_frames,
        cooldown: config.detection.cooldown(),
    });

    let factory: SourceFactory = if synthetic {
        let (width, height) = config.capture.resolution;
        Box::new(move || {
            Ok(Box::new(SyntheticSource::new(width, height)) as Box<dyn FrameSource>)
        })
    } else {
        build_camera_factory(&config, &source)?
    };

    let source_desc = if synthetic {
        "synthetic".to_string()
    } else {
        source.to_string()
    };
    console::print_banner(&config, &source_desc, &provider_desc);
    println!("Press Ctrl+C to stop.\n");

    let pipeline = DetectionPipeline::new(
        queue.clone(),
        provider,
        engine,
        dispatcher,
        stats.clone(),
        snapshot_dir,
        config.detection.inference_timeout(),
    );

    let supervisor = CaptureSupervisor::start(factory, queue, config.capture.frame_rate);
    let started = Instant::now();
    let runner = tokio::spawn(pipeline.run());

    // Ctrl+C stops capture; the closed queue lets the pipeline drain and
    // finish on its own.
    let stopper = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            info!("stop requested");
        }
        supervisor.stop();
    });

    let result = runner.await.context("pipeline task failed")?;
    stopper.abort();

    console::print_summary(&stats.snapshot(), started.elapsed());
    println!("Alerts this session: {}", event_log.count());

    result.map_err(Into::into)
}

#[cfg(feature = "onnx")]
fn build_model_provider(
    config: &SentinelConfig,
    model: Option<PathBuf>,
) -> anyhow::Result<(Arc<dyn InferenceProvider>, String)> {
    let path = model.unwrap_or_else(|| config.detection.model_path.clone());
    let detector = sentinel_eye::OnnxWeaponDetector::load(
        &path,
        config.detection.classes.clone(),
        config.detection.confidence_threshold,
    )?;
    Ok((Arc::new(detector), format!("onnx ({})", path.display())))
}

#[cfg(not(feature = "onnx"))]
fn build_model_provider(
    _config: &SentinelConfig,
    _model: Option<PathBuf>,
) -> anyhow::Result<(Arc<dyn InferenceProvider>, String)> {
    anyhow::bail!(
        "this build has no ONNX support; run with --synthetic or rebuild with --features onnx"
    )
}

#[cfg(feature = "opencv")]
fn build_camera_factory(
    config: &SentinelConfig,
    source: &VideoSource,
) -> anyhow::Result<SourceFactory> {
    let resolution = config.capture.resolution;
    let frame_rate = config.capture.frame_rate;
    let source = source.clone();
    Ok(Box::new(move || {
        Ok(Box::new(sentinel_eye::CameraSource::open(
            &source, resolution, frame_rate,
        )?) as Box<dyn FrameSource>)
    }))
}

#[cfg(not(feature = "opencv"))]
fn build_camera_factory(
    _config: &SentinelConfig,
    _source: &VideoSource,
) -> anyhow::Result<SourceFactory> {
    anyhow::bail!(
        "camera capture requires the opencv feature; run with --synthetic or rebuild with --features opencv"
    )
}

fn check(config: &SentinelConfig, model: Option<PathBuf>) -> anyhow::Result<()> {
    let rule = console::rule();
    println!("\n{rule}");
    println!("Sentinel Self-Check");
    println!("{rule}\n");

    let mut failures = 0usize;

    match config.validate() {
        Ok(()) => println!("[ok] configuration valid"),
        Err(e) => {
            println!("[!!] configuration: {e}");
            failures += 1;
        }
    }

    let snapshot_dir = resolve_snapshot_dir(&config.alerts.snapshot_dir);
    let probe = snapshot_dir.join(".sentinel-write-probe");
    match std::fs::write(&probe, b"probe") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            println!("[ok] snapshot folder writable: {}", snapshot_dir.display());
        }
        Err(e) => {
            println!("[!!] snapshot folder not writable: {e}");
            failures += 1;
        }
    }

    let model_path = model.unwrap_or_else(|| config.detection.model_path.clone());
    failures += check_model(config, &model_path);

    println!("\n{rule}");
    if failures == 0 {
        println!("All checks passed.");
        println!("{rule}\n");
        Ok(())
    } else {
        println!("{failures} check(s) failed.");
        println!("{rule}\n");
        anyhow::bail!("self-check failed")
    }
}

#[cfg(feature = "onnx")]
fn check_model(config: &SentinelConfig, model_path: &Path) -> usize {
    match sentinel_eye::OnnxWeaponDetector::load(
        model_path,
        config.detection.classes.clone(),
        config.detection.confidence_threshold,
    ) {
        Ok(_) => {
            println!("[ok] model loads: {}", model_path.display());
            println!("     classes: {}", config.detection.classes.join(", "));
            0
        }
        Err(e) => {
            println!("[!!] model: {e}");
            1
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn check_model(config: &SentinelConfig, model_path: &Path) -> usize {
    if model_path.exists() {
        println!(
            "[ok] model file present: {} (load not verified; built without onnx)",
            model_path.display()
        );
        println!("     classes: {}", config.detection.classes.join(", "));
        0
    } else {
        println!("[!!] model not found at {}", model_path.display());
        1
    }
}

fn alerts(config: &SentinelConfig, count: usize) -> anyhow::Result<()> {
    if !config.alerts.event_log.exists() {
        println!("No alerts recorded yet.");
        return Ok(());
    }

    let records = EventLogSink::read_recent(&config.alerts.event_log, count)?;
    if records.is_empty() {
        println!("No alerts recorded yet.");
        return Ok(());
    }

    println!("Most recent {} alert(s):", records.len());
    for record in records {
        let snapshot = record
            .snapshot
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "[{}] {} {:.2}% snapshot: {}",
            record.raised_at.format("%Y-%m-%d %H:%M:%S"),
            record.class.label().to_uppercase(),
            record.confidence * 100.0,
            snapshot
        );
    }
    Ok(())
}
