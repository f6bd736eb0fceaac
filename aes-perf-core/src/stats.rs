// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Running latency statistics.
//!
//! Summarizes a stream of samples in O(1) space using Welford's recurrence
//! for the mean and the sum of squared deviations.

use serde::{Deserialize, Serialize};

/// Incremental accumulator of count, mean, variance, min and max.
#[derive(Debug, Clone, Default)]
pub struct RunningStatistics {
    count: u64,
    mean: f64,
    /// Sum of squared deviations from the current mean (Welford's M2).
    m2: f64,
    min: f64,
    max: f64,
    initialized: bool,
}

impl RunningStatistics {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Incorporate one sample, in nanoseconds.
    pub fn update(&mut self, sample_ns: u64) {
        let x = sample_ns as f64;
        let delta = x - self.mean;

        self.count += 1;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);

        if !self.initialized {
            self.min = x;
            self.max = x;
            self.initialized = true;
        } else {
            self.min = self.min.min(x);
            self.max = self.max.max(x);
        }
    }

    /// Number of samples seen so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Population standard deviation. NaN with fewer than two samples.
    pub fn stddev(&self) -> f64 {
        if self.count < 2 {
            return f64::NAN;
        }
        (self.m2 / self.count as f64).sqrt()
    }

    /// Snapshot of the accumulated statistics.
    pub fn summary(&self) -> StatisticsSummary {
        if !self.initialized {
            return StatisticsSummary {
                count: 0,
                mean_ns: f64::NAN,
                stddev_ns: f64::NAN,
                min_ns: f64::NAN,
                max_ns: f64::NAN,
            };
        }

        StatisticsSummary {
            count: self.count,
            mean_ns: self.mean,
            stddev_ns: self.stddev(),
            min_ns: self.min,
            max_ns: self.max,
        }
    }
}

/// Summary of a latency series. Undefined values are NaN, serialized as
/// null and read back as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub count: u64,
    #[serde(with = "nan_as_null")]
    pub mean_ns: f64,
    #[serde(with = "nan_as_null")]
    pub stddev_ns: f64,
    #[serde(with = "nan_as_null")]
    pub min_ns: f64,
    #[serde(with = "nan_as_null")]
    pub max_ns: f64,
}

mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

impl StatisticsSummary {
    /// Convert a nanosecond value to microseconds for display.
    pub fn to_micros(ns: f64) -> f64 {
        ns / 1_000.0
    }
}
