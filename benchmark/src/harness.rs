// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Timing harness for secure-domain cipher latency.
//!
//! Each outer iteration times `inner_loops` back-to-back `Process` calls
//! between two monotonic clock readings. Input refresh and progress output
//! happen outside that interval.

use std::io::{self, Write};
use std::sync::Arc;

use aes_perf_core::{
    AesPerfResult, BenchmarkConfig, ClockError, CommandProtocolClient, EntropySource,
    MonotonicClock, RunningStatistics, SharedBuffers, TeeSession,
};

use crate::metrics::{RunSummary, ThroughputMetrics};

/// Number of progress markers emitted over a full run.
const PROGRESS_MARKS: u32 = 10;

/// Drives one benchmark run over an open session.
pub struct TimingHarness {
    config: BenchmarkConfig,
    verbosity: u8,
    clock: MonotonicClock,
    entropy: EntropySource,
}

impl TimingHarness {
    /// Create a harness for `config`, reading random input from
    /// `/dev/urandom` when enabled.
    pub fn new(config: BenchmarkConfig) -> Self {
        Self {
            config,
            verbosity: 0,
            clock: MonotonicClock::new(),
            entropy: EntropySource::new(),
        }
    }

    /// Set the verbosity level. Progress markers are printed from level 1.
    pub fn verbosity(mut self, level: u8) -> Self {
        self.verbosity = level;
        self
    }

    /// Use a different random input source.
    pub fn entropy(mut self, source: EntropySource) -> Self {
        self.entropy = source;
        self
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Run the full measurement series.
    ///
    /// Any allocation, protocol or clock failure aborts the run; no partial
    /// summary is returned. Shared buffers are released on every path.
    pub fn run(&mut self, session: &mut TeeSession) -> AesPerfResult<RunSummary> {
        let config = &self.config;
        let registry = Arc::clone(session.context().registry());

        let mut buffers =
            SharedBuffers::allocate(&registry, config.buffer_size(), config.in_place())?;
        buffers.input_mut().as_mut_slice().fill(0);

        let mut client = CommandProtocolClient::new(session);
        client.prepare_key(config.direction(), config.key_size(), config.mode())?;
        client.bind(&mut buffers);

        self.warm_up()?;

        let config = &self.config;
        let outer_loops = config.outer_loops();
        let inner_loops = config.inner_loops();
        let progress_every = progress_interval(outer_loops);
        let show_progress = self.verbosity >= 1 && outer_loops > 0;

        let mut stats = RunningStatistics::new();
        let mut refresh_failures: u64 = 0;
        let mut output_size = 0;

        tracing::info!(
            mode = %config.mode(),
            key_bits = config.key_size().bits(),
            direction = %config.direction(),
            size = config.buffer_size(),
            outer_loops = outer_loops,
            inner_loops = inner_loops,
            in_place = config.in_place(),
            "Starting measurement loop"
        );

        let run_start = self.clock.now()?;
        for n in 0..outer_loops {
            if config.random_input() {
                if let Some(bound) = client.buffers_mut() {
                    if let Err(e) = self.entropy.fill(bound.input_mut().as_mut_slice()) {
                        if refresh_failures == 0 {
                            tracing::warn!(error = %e, "Random input refresh failed; continuing with stale input");
                        }
                        refresh_failures += 1;
                    }
                }
            }

            let t0 = self.clock.now()?;
            output_size = client.process_batch(inner_loops)?;
            let t1 = self.clock.now()?;

            stats.update(MonotonicClock::elapsed_ns(t0, t1)?);

            if show_progress && (n + 1) % progress_every == 0 {
                print_progress_mark();
            }
        }
        let run_end = self.clock.now()?;

        if show_progress {
            println!();
        }

        let process_calls = client.process_calls();
        drop(client);
        buffers.release();

        if refresh_failures > 0 {
            tracing::warn!(
                failures = refresh_failures,
                iterations = outer_loops,
                "Random input refresh failed during the run"
            );
        }

        let wall_clock_ns = MonotonicClock::elapsed_ns(run_start, run_end)?;
        let total_bytes = config.buffer_size() as u64 * u64::from(outer_loops);

        Ok(RunSummary {
            mode: config.mode(),
            key_size: config.key_size(),
            direction: config.direction(),
            buffer_size: config.buffer_size(),
            outer_loops,
            inner_loops,
            in_place: config.in_place(),
            random_input: config.random_input(),
            statistics: stats.summary(),
            process_calls,
            output_size,
            input_refresh_failures: refresh_failures,
            throughput: ThroughputMetrics::calculate(total_bytes, wall_clock_ns),
        })
    }

    /// Spin on the CPU for the configured warm-up period so frequency
    /// scaling settles before the first sample.
    fn warm_up(&self) -> Result<(), ClockError> {
        let budget = self.config.warmup();
        if budget.is_zero() {
            return Ok(());
        }

        tracing::info!(seconds = budget.as_secs_f64(), "Warming up CPU");
        let budget_ns = u64::try_from(budget.as_nanos()).unwrap_or(u64::MAX);
        let start = self.clock.now()?;
        let mut spins: u64 = 0;
        while MonotonicClock::elapsed_ns(start, self.clock.now()?)? < budget_ns {
            spins = spins.wrapping_add(1);
            std::hint::spin_loop();
        }
        tracing::debug!(spins = spins, "Warm-up done");
        Ok(())
    }
}

/// Iterations between progress markers: `ceil(outer_loops / 10)`, at least 1.
fn progress_interval(outer_loops: u32) -> u32 {
    outer_loops.div_ceil(PROGRESS_MARKS).max(1)
}

fn print_progress_mark() {
    let mut stdout = io::stdout().lock();
    // Progress is cosmetic; a closed stdout must not abort the run.
    let _ = write!(stdout, "#");
    let _ = stdout.flush();
}
