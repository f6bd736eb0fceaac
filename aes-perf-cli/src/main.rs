// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! aes-perf CLI
//!
//! Measures the latency of AES operations executed in the secure domain.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use aes_perf_benchmark::{BenchmarkReport, JsonReporter, RunSummary, TimingHarness};
use aes_perf_core::config::{DEFAULT_BUFFER_SIZE, DEFAULT_INNER_LOOPS, DEFAULT_OUTER_LOOPS};
use aes_perf_core::shm::DEFAULT_SHM_QUOTA;
use aes_perf_core::{
    AesPerfError, BenchmarkConfig, CipherMode, ConfigLoader, Direction, HardValidationError,
    KeySize, MonotonicClock, TeeContext,
};

/// aes-perf - AES latency benchmark across the secure-domain boundary
#[derive(Parser, Debug)]
#[command(name = "aes-perf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Buffer size in bytes
    #[arg(short = 's', long = "size", default_value_t = DEFAULT_BUFFER_SIZE)]
    pub size: usize,

    /// Number of measured iterations
    #[arg(short = 'n', long = "loops", default_value_t = DEFAULT_OUTER_LOOPS)]
    pub loops: u32,

    /// Process calls per measured iteration
    #[arg(short = 'l', long = "inner-loops", default_value_t = DEFAULT_INNER_LOOPS)]
    pub inner_loops: u32,

    /// Cipher mode: ECB, CBC, CTR or XTS
    #[arg(short = 'm', long = "mode", default_value = "ECB", value_parser = parse_mode)]
    pub mode: CipherMode,

    /// Key size in bits: 128, 192 or 256
    #[arg(short = 'k', long = "key-size", default_value_t = 128, value_parser = parse_key_size)]
    pub key_size: u32,

    /// Decrypt instead of encrypt
    #[arg(short = 'd', long)]
    pub decrypt: bool,

    /// Use one shared buffer as both input and output
    #[arg(short = 'i', long = "in-place")]
    pub in_place: bool,

    /// Refresh the input with random bytes before every iteration
    #[arg(short = 'r', long)]
    pub random: bool,

    /// Seconds of CPU warm-up before measuring
    #[arg(long, default_value_t = 2)]
    pub warmup: u64,

    /// Read the run parameters from a YAML profile instead
    #[arg(
        long,
        conflicts_with_all = [
            "size", "loops", "inner_loops", "mode", "key_size",
            "decrypt", "in_place", "random", "warmup",
        ]
    )]
    pub config: Option<PathBuf>,

    /// Also write a JSON report into this directory
    #[arg(long, value_name = "DIR")]
    pub json: Option<PathBuf>,

    /// Shared memory quota in bytes
    #[arg(long, default_value_t = DEFAULT_SHM_QUOTA)]
    pub shm_quota: usize,

    /// Increase verbosity (-v progress and info logs, -vv debug logs)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn parse_mode(value: &str) -> Result<CipherMode, String> {
    value.parse().map_err(|e: HardValidationError| e.to_string())
}

fn parse_key_size(value: &str) -> Result<u32, String> {
    let bits: u32 = value.parse().map_err(|_| format!("not a number: {}", value))?;
    KeySize::try_from(bits)
        .map(|size| size.bits())
        .map_err(|e| e.to_string())
}

impl Cli {
    /// Resolve the run configuration from the profile or the flags.
    pub fn benchmark_config(&self) -> anyhow::Result<BenchmarkConfig> {
        if let Some(path) = &self.config {
            return ConfigLoader::load_file(path)
                .with_context(|| format!("loading profile {}", path.display()));
        }

        if self.loops == 0 {
            return Err(AesPerfError::from(HardValidationError::InvalidFieldValue {
                field: "loops",
                value: "0".to_string(),
                reason: "Must be at least 1".to_string(),
            })
            .into());
        }

        let config = BenchmarkConfig::builder()
            .buffer_size(self.size)
            .outer_loops(self.loops)
            .inner_loops(self.inner_loops)
            .mode(self.mode)
            .key_size(KeySize::try_from(self.key_size)?)
            .direction(if self.decrypt {
                Direction::Decrypt
            } else {
                Direction::Encrypt
            })
            .in_place(self.in_place)
            .random_input(self.random)
            .warmup(Duration::from_secs(self.warmup))
            .build()?;
        Ok(config)
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.benchmark_config()?;

    let resolution_ns = MonotonicClock::new()
        .resolution_ns()
        .map_err(AesPerfError::from)?;
    println!("Note: clock resolution is {} ns.", resolution_ns);

    let context = TeeContext::new(cli.shm_quota);
    let mut session = context.open_session()?;

    println!(
        "Starting test: {}, {}crypt, keysize={} bits, size={} bytes, loops={}",
        config.mode(),
        config.direction().prefix(),
        config.key_size().bits(),
        config.buffer_size(),
        config.outer_loops(),
    );

    let warmup_secs = config.warmup().as_secs_f64();
    let mut harness = TimingHarness::new(config).verbosity(cli.verbose);
    let summary = harness.run(&mut session)?;
    session.close();

    println!("{}", summary);

    if let Some(dir) = &cli.json {
        let reporter = JsonReporter::new(dir)
            .with_context(|| format!("creating report directory {}", dir.display()))?;
        let path = reporter
            .save(&build_report(cli, summary, resolution_ns, warmup_secs))
            .context("writing JSON report")?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

/// Report for a finished run, annotated with the run setup that the summary
/// does not carry.
fn build_report(
    cli: &Cli,
    summary: RunSummary,
    resolution_ns: u64,
    warmup_secs: f64,
) -> BenchmarkReport {
    let mut report = BenchmarkReport::new(summary)
        .with_clock_resolution(resolution_ns)
        .with_metadata("warmup_secs", warmup_secs)
        .with_metadata("shm_quota", cli.shm_quota);
    if let Some(profile) = &cli.config {
        report = report.with_metadata("profile", profile.display().to_string());
    }
    report
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if let Some(code) = err
                .downcast_ref::<AesPerfError>()
                .and_then(AesPerfError::status_code)
            {
                eprintln!("Secure domain returned {:#010x}", code);
            }
            ExitCode::FAILURE
        }
    }
}
