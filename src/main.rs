//! Posture monitor: replays a recorded landmark trace through the pipeline.
//!
//! Each input line is a JSON event; each output line is the JSON result.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use posture_monitor::{
    config::{Config, EXAMPLE_CONFIG},
    landmarks::FrameInput,
    monitor::{CalibrationResult, ClassificationResult, PostureMonitor},
    session::SessionStatistics,
    thresholds::{RawThresholdUpdate, SensitivityUpdate},
    Error,
};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON-lines trace of frames and control events
    #[arg(short, long, required_unless_present = "print_config")]
    trace: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Calibrate on the first frame that yields a baseline
    #[arg(long)]
    calibrate_first: bool,

    /// Use OpenCV's solvePnP instead of the built-in solver
    #[cfg(feature = "opencv")]
    #[arg(long)]
    opencv: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

/// One line of the input trace
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TraceEvent {
    Frame(FrameInput),
    Calibrate(FrameInput),
    Sensitivity(SensitivityUpdate),
    Thresholds(RawThresholdUpdate),
    Statistics,
    ResetStatistics,
}

/// One line of output
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TraceOutput {
    Classification(ClassificationResult),
    Calibration(CalibrationResult),
    Statistics(SessionStatistics),
    Updated,
    Error { line: usize, message: String },
}

#[cfg(feature = "opencv")]
fn build_monitor(args: &Args, config: &Config) -> Result<PostureMonitor> {
    if args.opencv {
        let solver = Box::new(posture_monitor::solver::opencv::OpenCvSolver::new());
        return Ok(PostureMonitor::with_solver(config, solver)?);
    }
    Ok(PostureMonitor::from_config(config)?)
}

#[cfg(not(feature = "opencv"))]
fn build_monitor(_args: &Args, config: &Config) -> Result<PostureMonitor> {
    Ok(PostureMonitor::from_config(config)?)
}

fn handle_event(
    monitor: &mut PostureMonitor,
    event: TraceEvent,
    needs_calibration: &mut bool,
) -> posture_monitor::Result<Vec<TraceOutput>> {
    let mut outputs = Vec::new();
    match event {
        TraceEvent::Frame(frame) => {
            if *needs_calibration {
                let calibration = monitor.calibrate(&frame)?;
                if calibration.success {
                    *needs_calibration = false;
                    outputs.push(TraceOutput::Calibration(calibration));
                }
            }
            outputs.push(TraceOutput::Classification(monitor.classify(&frame)?));
        }
        TraceEvent::Calibrate(frame) => {
            let calibration = monitor.calibrate(&frame)?;
            if calibration.success {
                *needs_calibration = false;
            }
            outputs.push(TraceOutput::Calibration(calibration));
        }
        TraceEvent::Sensitivity(update) => {
            monitor.update_sensitivity(&update)?;
            outputs.push(TraceOutput::Updated);
        }
        TraceEvent::Thresholds(update) => {
            monitor.update_raw_thresholds(&update)?;
            outputs.push(TraceOutput::Updated);
        }
        TraceEvent::Statistics => outputs.push(TraceOutput::Statistics(monitor.statistics())),
        TraceEvent::ResetStatistics => {
            monitor.reset_statistics();
            outputs.push(TraceOutput::Updated);
        }
    }
    Ok(outputs)
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    if args.print_config {
        print!("{}", EXAMPLE_CONFIG);
        return Ok(());
    }

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Posture Monitor ({})", env!("BUILD_TARGET"));

    // Load configuration if provided
    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file(path).with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => Config::default(),
    };

    let mut monitor = build_monitor(&args, &config)?;
    info!("Using {} solver", monitor.solver_name());

    let Some(trace_path) = &args.trace else {
        bail!("--trace is required");
    };
    let reader = BufReader::new(
        File::open(trace_path).with_context(|| format!("Failed to open trace {}", trace_path.display()))?,
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut needs_calibration = args.calibrate_first;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        // A bad line is reported and skipped; the rest of the trace still replays
        let outputs = serde_json::from_str::<TraceEvent>(&line)
            .map_err(|e| Error::Serialization(format!("Malformed trace event: {e}")))
            .and_then(|event| handle_event(&mut monitor, event, &mut needs_calibration))
            .unwrap_or_else(|e| {
                log::warn!("Line {}: {}", line_number, e);
                vec![TraceOutput::Error {
                    line: line_number,
                    message: e.to_string(),
                }]
            });

        for output in outputs {
            serde_json::to_writer(&mut out, &output)?;
            writeln!(out)?;
        }
    }

    let statistics = monitor.statistics();
    info!(
        "Session finished: {:.1}s bad in total, longest bad streak {:.1}s, longest good streak {:.1}s",
        statistics.total_bad_duration, statistics.longest_bad_streak, statistics.longest_good_streak
    );

    Ok(())
}
