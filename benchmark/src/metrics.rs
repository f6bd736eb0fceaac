// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Metrics types for benchmark results.
//!
//! Latencies are kept in nanoseconds everywhere and converted to
//! microseconds only for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use sysinfo::System;

use aes_perf_core::{CipherMode, Direction, KeySize, StatisticsSummary};

/// Aggregate throughput of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputMetrics {
    /// Bytes processed per wall-clock second
    pub bytes_per_sec: f64,
    /// Bytes counted toward throughput
    pub total_bytes: u64,
    /// Wall-clock duration of the measurement loop in nanoseconds
    pub duration_ns: u64,
}

impl ThroughputMetrics {
    /// Calculate throughput from a byte count and duration.
    /// A zero duration yields zero throughput.
    pub fn calculate(bytes: u64, duration_ns: u64) -> Self {
        let bytes_per_sec = if duration_ns == 0 {
            0.0
        } else {
            bytes as f64 / (duration_ns as f64 / 1_000_000_000.0)
        };
        Self {
            bytes_per_sec,
            total_bytes: bytes,
            duration_ns,
        }
    }

    /// Format throughput in human-readable form.
    pub fn format_bytes_per_sec(bps: f64) -> String {
        if bps < 1_000.0 {
            format!("{:.2} B/s", bps)
        } else if bps < 1_000_000.0 {
            format!("{:.2} KB/s", bps / 1_000.0)
        } else if bps < 1_000_000_000.0 {
            format!("{:.2} MB/s", bps / 1_000_000.0)
        } else {
            format!("{:.2} GB/s", bps / 1_000_000_000.0)
        }
    }
}

/// Outcome of one completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: CipherMode,
    pub key_size: KeySize,
    pub direction: Direction,
    pub buffer_size: usize,
    pub outer_loops: u32,
    pub inner_loops: u32,
    pub in_place: bool,
    pub random_input: bool,
    /// Per-iteration latency; each sample spans all inner calls.
    pub statistics: StatisticsSummary,
    /// `Process` invocations issued over the run
    pub process_calls: u64,
    /// Output size reported by the last `Process` call
    pub output_size: usize,
    /// Iterations whose random input refresh failed and ran on stale input
    #[serde(default)]
    pub input_refresh_failures: u64,
    pub throughput: ThroughputMetrics,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.statistics;
        writeln!(
            f,
            "Done. count={} min={}μs max={}μs mean={}μs stddev={}μs",
            s.count,
            StatisticsSummary::to_micros(s.min_ns),
            StatisticsSummary::to_micros(s.max_ns),
            StatisticsSummary::to_micros(s.mean_ns),
            StatisticsSummary::to_micros(s.stddev_ns),
        )?;
        write!(
            f,
            "Throughput: {} ({} Process calls)",
            ThroughputMetrics::format_bytes_per_sec(self.throughput.bytes_per_sec),
            self.process_calls
        )?;
        if self.input_refresh_failures > 0 {
            write!(
                f,
                "\nWarning: random input refresh failed in {} of {} iterations",
                self.input_refresh_failures, self.outer_loops
            )?;
        }
        Ok(())
    }
}

/// System information captured at benchmark time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// OS version
    pub os_version: String,
    /// Kernel version (Linux)
    pub kernel_version: Option<String>,
    /// CPU model name
    pub cpu_model: String,
    /// Number of CPU cores
    pub cpu_cores: usize,
    /// Total system memory in bytes
    pub memory_bytes: u64,
    /// Hostname
    pub hostname: String,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// Machine-readable record of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Suite identifier
    pub benchmark_suite: String,
    /// Framework version
    pub version: String,
    /// Timestamp when the run finished
    pub timestamp: DateTime<Utc>,
    /// System information
    pub system_info: SystemInfo,
    /// Monotonic clock resolution in nanoseconds, if it was queried
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock_resolution_ns: Option<u64>,
    pub summary: RunSummary,
    /// Free-form annotations
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl BenchmarkReport {
    /// Create a report for a finished run.
    pub fn new(summary: RunSummary) -> Self {
        Self {
            benchmark_suite: "aes-perf".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            system_info: SystemInfo::collect(),
            clock_resolution_ns: None,
            summary,
            metadata: HashMap::new(),
        }
    }

    pub fn with_clock_resolution(mut self, resolution_ns: u64) -> Self {
        self.clock_resolution_ns = Some(resolution_ns);
        self
    }

    /// Add metadata to the report. Values that fail to serialize are skipped.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.metadata.insert(key.into(), value);
            }
            Err(e) => tracing::warn!(error = %e, "Dropping unserializable report metadata"),
        }
        self
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_summary() -> RunSummary {
        RunSummary {
            mode: CipherMode::Cbc,
            key_size: KeySize::Aes256,
            direction: Direction::Encrypt,
            buffer_size: 1024,
            outer_loops: 4,
            inner_loops: 1,
            in_place: false,
            random_input: false,
            statistics: StatisticsSummary {
                count: 4,
                mean_ns: 2_500.0,
                stddev_ns: 500.0,
                min_ns: 2_000.0,
                max_ns: 3_000.0,
            },
            process_calls: 4,
            output_size: 1024,
            input_refresh_failures: 0,
            throughput: ThroughputMetrics::calculate(4096, 1_000_000),
        }
    }

    #[test]
    fn test_throughput_calculation() {
        let metrics = ThroughputMetrics::calculate(1_000_000, 1_000_000_000);
        assert!((metrics.bytes_per_sec - 1_000_000.0).abs() < 0.01);

        let metrics = ThroughputMetrics::calculate(4096, 0);
        assert_eq!(metrics.bytes_per_sec, 0.0);
    }

    #[test]
    fn test_throughput_format() {
        assert_eq!(ThroughputMetrics::format_bytes_per_sec(500.0), "500.00 B/s");
        assert_eq!(ThroughputMetrics::format_bytes_per_sec(4_096_000.0), "4.10 MB/s");
    }

    #[test]
    fn test_summary_display_in_micros() {
        let text = sample_summary().to_string();
        assert!(text.starts_with("Done. count=4 min=2μs max=3μs mean=2.5μs stddev=0.5μs"));
        assert!(text.contains("4.10 MB/s"));
        assert!(text.contains("4 Process calls"));
        assert!(!text.contains("Warning"));
    }

    #[test]
    fn test_summary_display_reports_refresh_failures() {
        let mut summary = sample_summary();
        summary.input_refresh_failures = 3;
        assert!(summary
            .to_string()
            .ends_with("Warning: random input refresh failed in 3 of 4 iterations"));
    }

    #[test]
    fn test_empty_summary_display() {
        let mut summary = sample_summary();
        summary.statistics = aes_perf_core::RunningStatistics::new().summary();
        assert!(summary.to_string().contains("stddev=NaNμs"));
    }

    #[test]
    fn test_system_info_collect() {
        let info = SystemInfo::collect();
        assert!(!info.os.is_empty());
        assert!(info.cpu_cores > 0);
        assert!(info.memory_bytes > 0);
    }

    #[test]
    fn test_report_serialization() {
        let report = BenchmarkReport::new(sample_summary())
            .with_clock_resolution(1)
            .with_metadata("host_tag", "ci");

        let json = serde_json::to_string_pretty(&report).unwrap();
        assert!(json.contains("\"mode\": \"CBC\""));
        assert!(json.contains("\"key_size\": 256"));
        assert!(json.contains("host_tag"));
        assert!(json.contains("clock_resolution_ns"));
    }
}
