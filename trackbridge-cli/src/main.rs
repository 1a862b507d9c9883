// File: trackbridge-cli/src/main.rs

mod scene;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::time;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use trackbridge_common::models::ControllerParams;
use trackbridge_common::Error;
use trackbridge_core::device::SimulatedConnector;
use trackbridge_core::logfile::{decode_log, verify_log_buffer};
use trackbridge_core::TrackerController;

use crate::scene::{Scene, SceneSink};

#[derive(Parser, Debug)]
#[command(name = "trackbridge")]
#[command(author, version, about = "Optical tracker to scene bridge with frame recording")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive an in-process scene from the simulated tracker
    Run {
        /// JSON controller parameters; defaults to the move-bone preset
        #[arg(long)]
        config: Option<PathBuf>,

        /// How often scene poses are updated
        #[arg(long, default_value_t = 60.0)]
        rate_hz: f32,

        /// Stop after this many seconds (runs until Ctrl-C otherwise)
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Record every received frame and save on exit
        #[arg(long, default_value = "false")]
        record: bool,

        /// Where the recording is saved; a timestamped name in the current directory if omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Check a saved log and summarize its frames
    Inspect {
        file: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("trackbridge=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(sub).is_err() {
        eprintln!("A global tracing subscriber was already installed");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    match args.command {
        Command::Run {
            config,
            rate_hz,
            duration_secs,
            record,
            output,
        } => run(config, rate_hz, duration_secs, record, output).await,
        Command::Inspect { file } => inspect(file),
    }
}

async fn run(
    config: Option<PathBuf>,
    rate_hz: f32,
    duration_secs: Option<u64>,
    record: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let period = tick_period(rate_hz)?;
    let params = match &config {
        Some(path) => ControllerParams::from_json_file(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => ControllerParams::default(),
    };
    info!("Starting with {} motion configs", params.motion_configs.len());

    let scene = Arc::new(Scene::for_params(&params));
    let mut controller = TrackerController::new(
        params,
        Box::new(SimulatedConnector::default()),
        scene.clone(),
        Box::new(SceneSink(scene.clone())),
    );
    controller.start()?;
    if record {
        controller.start_recording();
    }

    let mut ticker = time::interval(period);
    let deadline = time::sleep(Duration::from_secs(duration_secs.unwrap_or(0)));
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut ticks: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match controller.tick() {
                    Ok(_) => ticks += 1,
                    Err(Error::Device(fault)) => {
                        error!("Tracker fault: {fault}");
                        break;
                    }
                    Err(e) => warn!("Update skipped: {e}"),
                }
            }
            _ = &mut deadline, if duration_secs.is_some() => {
                info!("Run duration elapsed");
                break;
            }
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    error!("Failed to listen for Ctrl-C: {:?}", e);
                }
                info!("Ctrl-C detected; shutting down...");
                break;
            }
        }
    }

    if record {
        let path = controller.save_recording(output);
        info!("Recording handed off to {}", path.display());
    }
    controller.stop();

    for report in controller.save_reports().try_iter() {
        if report.is_success() {
            info!("Saved {} frames to {}", report.message_count, report.path.display());
        } else {
            error!("Save to {} failed: {:?}", report.path.display(), report.outcome);
        }
    }

    info!(
        "{} updates over {} tracker frames",
        ticks,
        controller.frames_received()
    );
    for (handle, placement) in scene.placements() {
        let t = placement.transform.translation;
        info!(
            "{} ({}) in {}: [{:.4}, {:.4}, {:.4}] m after {} updates",
            scene.name_of(handle).unwrap_or("?"),
            handle,
            scene.name_of(placement.reference).unwrap_or("?"),
            t.x,
            t.y,
            t.z,
            placement.updates
        );
    }

    match controller.fault() {
        Some(fault) => Err(Error::from(fault).into()),
        None => Ok(()),
    }
}

/// Interval between updates; `interval` rejects a zero period.
fn tick_period(rate_hz: f32) -> anyhow::Result<Duration> {
    anyhow::ensure!(
        rate_hz.is_finite() && rate_hz > 0.0,
        "--rate-hz must be a positive number, got {rate_hz}"
    );
    let period = Duration::try_from_secs_f64(1.0 / f64::from(rate_hz))
        .with_context(|| format!("--rate-hz {rate_hz} is out of range"))?;
    anyhow::ensure!(!period.is_zero(), "--rate-hz {rate_hz} is too high");
    Ok(period)
}

fn inspect(file: PathBuf) -> anyhow::Result<()> {
    let bytes = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
    let summary = verify_log_buffer(&bytes)?;
    let frames = decode_log(&bytes)?;

    println!("{}: {} frames, {} bytes", file.display(), summary.message_count, summary.byte_len);
    let (Some(first), Some(last)) = (frames.first(), frames.last()) else {
        return Ok(());
    };
    let geometries: BTreeSet<u32> = frames
        .iter()
        .flat_map(|f| f.markers.iter().map(|m| m.geometry_id))
        .collect();
    let span_us = last.device_timestamp_us.saturating_sub(first.device_timestamp_us);
    let span_ms = span_us as f64 / 1000.0;

    println!("  device serial  : {:#x}", first.device_serial);
    println!("  frame counters : {} .. {}", first.frame_counter, last.frame_counter);
    println!("  device span    : {span_ms:.1} ms");
    if let Some(received) = chrono::DateTime::from_timestamp_micros(first.received_at_us) {
        println!("  first received : {}", received.to_rfc3339());
    }
    println!("  geometries     : {geometries:?}");
    Ok(())
}
