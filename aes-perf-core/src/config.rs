// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark configuration with strict validation.
//!
//! A `BenchmarkConfig` is immutable once built. It can be assembled with the
//! builder (CLI, tests) or loaded from a YAML profile.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AesPerfError, AesPerfResult, HardValidationError};
use crate::types::{BufferSize, CipherMode, Direction, KeySize};

/// Default buffer size processed per call (bytes).
pub const DEFAULT_BUFFER_SIZE: usize = 1024;
/// Default number of measurements.
pub const DEFAULT_OUTER_LOOPS: u32 = 100_000;
/// Default number of `Process` calls per measurement.
pub const DEFAULT_INNER_LOOPS: u32 = 1;

/// Raw profile as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBenchmarkConfig {
    #[serde(default = "default_buffer_size")]
    buffer_size: usize,
    #[serde(default = "default_outer_loops")]
    outer_loops: u32,
    #[serde(default = "default_inner_loops")]
    inner_loops: u32,
    #[serde(default = "default_mode")]
    mode: String,
    #[serde(default = "default_key_size")]
    key_size: u32,
    #[serde(default)]
    direction: Direction,
    #[serde(default)]
    in_place: bool,
    #[serde(default)]
    random_input: bool,
    #[serde(default)]
    warmup_secs: u64,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_outer_loops() -> u32 {
    DEFAULT_OUTER_LOOPS
}

fn default_inner_loops() -> u32 {
    DEFAULT_INNER_LOOPS
}

fn default_mode() -> String {
    CipherMode::Ecb.name().to_string()
}

fn default_key_size() -> u32 {
    KeySize::Aes128.bits()
}

/// Validated, immutable benchmark configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkConfig {
    buffer_size: BufferSize,
    outer_loops: u32,
    inner_loops: u32,
    mode: CipherMode,
    key_size: KeySize,
    direction: Direction,
    in_place: bool,
    random_input: bool,
    warmup: Duration,
}

impl BenchmarkConfig {
    /// Start a builder populated with the defaults.
    pub fn builder() -> BenchmarkConfigBuilder {
        BenchmarkConfigBuilder::default()
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size.bytes()
    }

    pub fn outer_loops(&self) -> u32 {
        self.outer_loops
    }

    pub fn inner_loops(&self) -> u32 {
        self.inner_loops
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn key_size(&self) -> KeySize {
        self.key_size
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn in_place(&self) -> bool {
        self.in_place
    }

    pub fn random_input(&self) -> bool {
        self.random_input
    }

    pub fn warmup(&self) -> Duration {
        self.warmup
    }
}

/// Builder for `BenchmarkConfig`. Validation happens in `build`.
#[derive(Debug, Clone)]
pub struct BenchmarkConfigBuilder {
    buffer_size: usize,
    outer_loops: u32,
    inner_loops: u32,
    mode: CipherMode,
    key_size: KeySize,
    direction: Direction,
    in_place: bool,
    random_input: bool,
    warmup: Duration,
}

impl Default for BenchmarkConfigBuilder {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            outer_loops: DEFAULT_OUTER_LOOPS,
            inner_loops: DEFAULT_INNER_LOOPS,
            mode: CipherMode::Ecb,
            key_size: KeySize::Aes128,
            direction: Direction::Encrypt,
            in_place: false,
            random_input: false,
            warmup: Duration::ZERO,
        }
    }
}

impl BenchmarkConfigBuilder {
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes;
        self
    }

    /// Number of measurements. Zero yields an empty summary.
    pub fn outer_loops(mut self, loops: u32) -> Self {
        self.outer_loops = loops;
        self
    }

    pub fn inner_loops(mut self, loops: u32) -> Self {
        self.inner_loops = loops;
        self
    }

    pub fn mode(mut self, mode: CipherMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn key_size(mut self, key_size: KeySize) -> Self {
        self.key_size = key_size;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn in_place(mut self, in_place: bool) -> Self {
        self.in_place = in_place;
        self
    }

    pub fn random_input(mut self, random_input: bool) -> Self {
        self.random_input = random_input;
        self
    }

    pub fn warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<BenchmarkConfig, HardValidationError> {
        let buffer_size = BufferSize::new(self.buffer_size)?;

        if self.inner_loops == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "inner_loops",
                value: self.inner_loops.to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        Ok(BenchmarkConfig {
            buffer_size,
            outer_loops: self.outer_loops,
            inner_loops: self.inner_loops,
            mode: self.mode,
            key_size: self.key_size,
            direction: self.direction,
            in_place: self.in_place,
            random_input: self.random_input,
            warmup: self.warmup,
        })
    }
}

/// Loader for YAML benchmark profiles.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a profile from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> AesPerfResult<BenchmarkConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(AesPerfError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| AesPerfError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate a profile from a YAML string.
    ///
    /// Malformed YAML is a parse error. Well-formed YAML with unknown keys or
    /// mistyped values fails schema validation.
    pub fn load_string(content: &str) -> AesPerfResult<BenchmarkConfig> {
        let document: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| AesPerfError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;
        let raw: RawBenchmarkConfig = serde_yaml::from_value(document).map_err(|e| {
            HardValidationError::SchemaValidation {
                message: e.to_string(),
            }
        })?;

        Ok(Self::validate(raw)?)
    }

    fn validate(raw: RawBenchmarkConfig) -> Result<BenchmarkConfig, HardValidationError> {
        // A profile describes a real run; an empty series is never intended.
        if raw.outer_loops == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "outer_loops",
                value: raw.outer_loops.to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        BenchmarkConfig::builder()
            .buffer_size(raw.buffer_size)
            .outer_loops(raw.outer_loops)
            .inner_loops(raw.inner_loops)
            .mode(raw.mode.parse()?)
            .key_size(KeySize::try_from(raw.key_size)?)
            .direction(raw.direction)
            .in_place(raw.in_place)
            .random_input(raw.random_input)
            .warmup(Duration::from_secs(raw.warmup_secs))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = BenchmarkConfig::builder().build().unwrap();
        assert_eq!(config.buffer_size(), 1024);
        assert_eq!(config.outer_loops(), 100_000);
        assert_eq!(config.inner_loops(), 1);
        assert_eq!(config.mode(), CipherMode::Ecb);
        assert_eq!(config.key_size(), KeySize::Aes128);
        assert_eq!(config.direction(), Direction::Encrypt);
        assert!(!config.in_place());
        assert!(!config.random_input());
    }

    #[test]
    fn test_builder_rejects_zero_inner_loops() {
        assert!(BenchmarkConfig::builder().inner_loops(0).build().is_err());
        assert!(BenchmarkConfig::builder().buffer_size(0).build().is_err());
    }

    #[test]
    fn test_builder_allows_zero_outer_loops() {
        let config = BenchmarkConfig::builder().outer_loops(0).build().unwrap();
        assert_eq!(config.outer_loops(), 0);
    }

    #[test]
    fn test_load_full_profile() {
        let yaml = r#"
buffer_size: 4096
outer_loops: 500
inner_loops: 8
mode: cbc
key_size: 256
direction: decrypt
in_place: true
random_input: true
warmup_secs: 1
"#;
        let config = ConfigLoader::load_string(yaml).unwrap();
        assert_eq!(config.buffer_size(), 4096);
        assert_eq!(config.outer_loops(), 500);
        assert_eq!(config.inner_loops(), 8);
        assert_eq!(config.mode(), CipherMode::Cbc);
        assert_eq!(config.key_size(), KeySize::Aes256);
        assert_eq!(config.direction(), Direction::Decrypt);
        assert!(config.in_place());
        assert!(config.random_input());
        assert_eq!(config.warmup(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_partial_profile_uses_defaults() {
        let config = ConfigLoader::load_string("mode: XTS\n").unwrap();
        assert_eq!(config.mode(), CipherMode::Xts);
        assert_eq!(config.buffer_size(), DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        assert!(matches!(
            ConfigLoader::load_string("key_size: 100\n"),
            Err(AesPerfError::HardValidation(
                HardValidationError::UnsupportedKeySize { bits: 100 }
            ))
        ));
        assert!(ConfigLoader::load_string("mode: OFB\n").is_err());
        assert!(ConfigLoader::load_string("outer_loops: 0\n").is_err());
    }

    #[test]
    fn test_load_separates_syntax_from_schema_errors() {
        assert!(matches!(
            ConfigLoader::load_string("mode: [ECB\n"),
            Err(AesPerfError::ConfigParse { .. })
        ));
        assert!(matches!(
            ConfigLoader::load_string("buffer_sz: 16\n"),
            Err(AesPerfError::HardValidation(
                HardValidationError::SchemaValidation { .. }
            ))
        ));
        assert!(matches!(
            ConfigLoader::load_string("outer_loops: many\n"),
            Err(AesPerfError::HardValidation(
                HardValidationError::SchemaValidation { .. }
            ))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ConfigLoader::load_file("/nonexistent/aes-perf.yaml"),
            Err(AesPerfError::ConfigNotFound { .. })
        ));
    }
}
