//! trueno-anomaly: real-time anomaly detection on a synthetic data stream.
//!
//! Generates a seasonal signal with noise, classifies every sample with a
//! sliding-window z-score detector and prints the stream with anomalies
//! marked.
//!
//! Run: `trueno-anomaly --window-size 25 --threshold 2.5`

#![cfg_attr(test, allow(clippy::unwrap_used))]

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use trueno_anomaly::prelude::*;

/// trueno-anomaly: visualize a data stream with anomalies
#[derive(Parser, Debug)]
#[command(name = "trueno-anomaly")]
#[command(author = "PAIML Team")]
#[command(version)]
#[command(about = "Detect anomalies in a continuous data stream", long_about = None)]
struct Cli {
    /// Amplitude of the signal [default: 10.0]
    #[arg(long)]
    amplitude: Option<f64>,

    /// Frequency of the signal in Hz [default: 0.1]
    #[arg(long)]
    frequency: Option<f64>,

    /// Seasonality of the signal in seconds [default: 24]
    #[arg(long)]
    seasonality: Option<u32>,

    /// Noise level of the signal [default: 2.0]
    #[arg(long)]
    noise_level: Option<f64>,

    /// Interval between data points in seconds [default: 1]
    #[arg(long, allow_negative_numbers = true)]
    interval: Option<f64>,

    /// Maximum number of points to visualize [default: 100]
    #[arg(long)]
    max_points: Option<usize>,

    /// Window size for anomaly detection [default: 100]
    #[arg(long, allow_negative_numbers = true)]
    window_size: Option<i64>,

    /// Threshold for anomaly detection [default: 2.5]
    #[arg(long, allow_negative_numbers = true)]
    threshold: Option<f64>,

    /// Drift sensitivity for anomaly detection [default: 0.01]
    #[arg(long, allow_negative_numbers = true)]
    drift_sensitivity: Option<f64>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many samples (runs until Ctrl-C otherwise)
    #[arg(short = 'n', long)]
    samples: Option<u64>,

    /// Seed for the noise generator
    #[arg(long)]
    seed: Option<u64>,

    /// Use a logical clock starting at t=0 instead of wall time
    #[arg(long)]
    logical_clock: bool,

    /// Do not sleep between samples
    #[arg(long)]
    no_pacing: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Applies CLI overrides on top of the file (or default) configuration.
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => Config::default_path().map(Config::load_or_default).unwrap_or_default(),
        };

        if let Some(v) = self.amplitude {
            config.signal.amplitude = v;
        }
        if let Some(v) = self.frequency {
            config.signal.frequency = v;
        }
        if let Some(v) = self.seasonality {
            config.signal.seasonality = v;
        }
        if let Some(v) = self.noise_level {
            config.signal.noise_level = v;
        }
        if let Some(secs) = self.interval {
            // Non-positive or NaN saturate to 0 ms and fail validation.
            config.signal.interval_ms = (secs * 1000.0).round() as u64;
        }
        if let Some(v) = self.max_points {
            config.display.max_points = v;
        }
        if let Some(v) = self.window_size {
            config.detector.window_size = v;
        }
        if let Some(v) = self.threshold {
            config.detector.threshold = v;
        }
        if let Some(v) = self.drift_sensitivity {
            config.detector.drift_sensitivity = v;
        }

        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Logs go to stderr so they never interleave with the stream on stdout.
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.resolve_config()?;
    debug!(?config, "resolved configuration");
    config.validate().context("invalid configuration")?;

    let detector = config.detector.build()?;

    let mut generator = SignalGenerator::new(config.signal)?;
    if cli.logical_clock {
        generator = generator.with_clock(Clock::logical());
    }
    if let Some(seed) = cli.seed {
        generator = generator.with_seed(seed);
    }

    let history = HistorySink::from_config(&config.display).parameters([
        ("Window Size", config.detector.window_size.to_string()),
        ("Noise Level", config.signal.noise_level.to_string()),
        ("Amplitude", config.signal.amplitude.to_string()),
        ("Interval", format!("{}s", config.signal.interval().as_secs_f64())),
        ("Threshold", config.detector.threshold.to_string()),
    ]);
    let sink = TerminalSink::new(io::stdout().lock(), history, config.display.redraw_every);

    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))
        .context("installing Ctrl-C handler")?;

    let pacing = (!cli.no_pacing).then(|| config.signal.interval());
    let mut pipeline = Pipeline::new(generator, detector, sink)
        .max_samples(cli.samples)
        .pacing(pacing)
        .stop_flag(stop);

    let summary = pipeline.run()?;
    if summary.stop == StopReason::Interrupted {
        info!("plotting stopped by the user");
    }

    let mut sink = pipeline.into_sink();
    sink.finish()?;

    Ok(())
}
