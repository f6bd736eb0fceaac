// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! aes-perf Benchmarking Framework
//!
//! Drives the secure-domain cipher over a session and reports per-call
//! latency.
//!
//! # Components
//!
//! - **TimingHarness**: the measurement loop, with input refresh and
//!   progress output kept outside the timed interval
//! - **Metrics**: run summary, throughput and host information
//! - **Reporter**: timestamped JSON reports
//!
//! # Data Output
//!
//! The human-readable summary is the primary output; JSON is opt-in.

pub mod harness;
pub mod metrics;
pub mod reporter;

pub use harness::TimingHarness;
pub use metrics::{BenchmarkReport, RunSummary, SystemInfo, ThroughputMetrics};
pub use reporter::{JsonReporter, ReporterError};
