use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vdr_replay::core::{TimeSource, TimeSourceDetails};
use vdr_replay::{
    PlaybackEngine, ScanReport, Settings, SystemClock, TokioTimer, WriterSink,
};

/// Replay voyage data recordings at their original pace.
#[derive(Debug, Parser)]
#[command(name = "vdr-replay", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan a recording and report its time sources.
    Scan {
        file: PathBuf,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Replay a recording to stdout, one CRLF-terminated sentence per line.
    Play {
        file: PathBuf,

        /// Speed multiplier, 0.1 to 1000.
        #[arg(long)]
        speed: Option<f64>,

        /// Start at this fraction of the recording, 0.0 to 1.0.
        #[arg(long, default_value_t = 0.0)]
        from: f64,

        /// Pace by every time source instead of only the primary one.
        #[arg(long)]
        any_source: bool,

        /// Remember these options as the new defaults.
        #[arg(long)]
        save: bool,
    },
}

#[derive(Serialize)]
struct ScanSummary<'a> {
    file: String,
    #[serde(flatten)]
    report: &'a ScanReport,
    first_timestamp: Option<DateTime<Utc>>,
    last_timestamp: Option<DateTime<Utc>>,
    primary_source: Option<&'a TimeSource>,
    sources: Vec<SourceSummary<'a>>,
}

#[derive(Serialize)]
struct SourceSummary<'a> {
    #[serde(flatten)]
    source: &'a TimeSource,
    #[serde(flatten)]
    details: &'a TimeSourceDetails,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // stdout carries the replayed sentences
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Scan { file, json } => scan(file, json),
        Command::Play {
            file,
            speed,
            from,
            any_source,
            save,
        } => {
            let mut settings = Settings::load();
            if let Some(speed) = speed {
                settings.playback.speed = speed;
            }
            if any_source {
                settings.playback.lock_primary_source = false;
            }
            if save {
                settings.save().context("failed to save settings")?;
                info!("Saved settings");
            }
            play(file, &settings, from).await
        }
    }
}

fn scan(file: PathBuf, json: bool) -> Result<()> {
    // Scanning never arms the timer
    let (timer, _) = TokioTimer::new();
    let mut engine = PlaybackEngine::new(
        Settings::load().playback,
        Box::new(SystemClock),
        Box::new(timer),
        Box::new(|_: &str| {}),
    );
    engine
        .load_file(&file)
        .with_context(|| format!("cannot scan {}", file.display()))?;
    let report = engine
        .scan_file_timestamps()
        .with_context(|| format!("scan of {} failed", file.display()))?;

    let summary = ScanSummary {
        file: file.display().to_string(),
        report: &report,
        first_timestamp: engine.first_timestamp(),
        last_timestamp: engine.last_timestamp(),
        primary_source: engine.primary_source(),
        sources: engine
            .time_sources()
            .iter()
            .map(|(source, details)| SourceSummary { source, details })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", summary.file);
    println!("  format: {}", if report.is_csv { "CSV" } else { "NMEA" });
    println!(
        "  records: {} valid, {} invalid, {} timestamped",
        report.valid_records, report.invalid_records, report.timestamped_records
    );
    match (summary.first_timestamp, summary.last_timestamp) {
        (Some(first), Some(last)) if report.has_valid_timestamps => {
            println!("  start: {}", first.to_rfc3339());
            println!("  end:   {}", last.to_rfc3339());
            println!("  duration: {}s", (last - first).num_seconds());
        }
        _ => println!("  no usable timestamps, playback is paced by batches"),
    }
    for entry in &summary.sources {
        let primary = summary.primary_source == Some(entry.source);
        println!(
            "  {} {}: chronological={} {} .. {}",
            if primary { "*" } else { " " },
            entry.source,
            entry.details.is_chronological,
            entry.details.start_time.to_rfc3339(),
            entry.details.end_time.to_rfc3339()
        );
    }
    Ok(())
}

async fn play(file: PathBuf, settings: &Settings, from: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&from) {
        bail!("--from must be between 0.0 and 1.0, got {from}");
    }

    let (timer, mut wake_ups) = TokioTimer::new();
    let mut engine = PlaybackEngine::new(
        settings.playback.clone(),
        Box::new(SystemClock),
        Box::new(timer),
        Box::new(WriterSink::new(std::io::stdout())),
    );

    engine
        .load_file(&file)
        .with_context(|| format!("cannot play {}", file.display()))?;
    let report = engine
        .scan_file_timestamps()
        .with_context(|| format!("scan of {} failed", file.display()))?;
    if from > 0.0 && !engine.seek_to_fraction(from) {
        bail!("cannot seek to {from} in {}", file.display());
    }

    info!(
        "Playing {} at {}x ({})",
        file.display(),
        engine.speed_multiplier(),
        if report.has_valid_timestamps { "timed" } else { "batched" }
    );
    engine.start();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while engine.is_playing() {
        tokio::select! {
            Some(token) = wake_ups.recv() => engine.on_timer(token),
            _ = &mut ctrl_c => {
                info!("Interrupted at {:.1}%", engine.progress_fraction() * 100.0);
                engine.stop();
                break;
            }
        }
    }

    info!("Playback finished in state {:?}", engine.state());
    Ok(())
}
