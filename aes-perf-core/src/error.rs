//! Custom error types for aes-perf.
//!
//! Every failure category of a benchmark run is an explicit enum.
//! No `Box<dyn Error>`, no `anyhow::Result` - all errors are strongly typed.

use std::path::PathBuf;

use thiserror::Error;

use crate::protocol::{ReturnOrigin, TeeStatus};

/// Top-level error type for a benchmark run.
/// Every variant except `Entropy` aborts the run.
#[derive(Debug, Error)]
pub enum AesPerfError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Shared Memory Errors - Fatal Before Any Measurement
    // =========================================================================
    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),

    // =========================================================================
    // Secure Domain Errors - No Retry
    // =========================================================================
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    // =========================================================================
    // Timing Errors
    // =========================================================================
    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),

    // =========================================================================
    // Input Generation Errors (non-fatal inside the harness)
    // =========================================================================
    #[error("Entropy error: {0}")]
    Entropy(#[from] EntropyError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl AesPerfError {
    /// Status code reported by the secure domain, if this error came from it.
    pub fn status_code(&self) -> Option<u32> {
        match self {
            Self::Protocol(err) => Some(err.code()),
            _ => None,
        }
    }
}

/// Hard validation errors prevent a run from starting.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Buffer size out of bounds: {size} bytes (min: {min}, max: {max})")]
    BufferSizeOutOfBounds { size: usize, min: usize, max: usize },

    #[error("Unsupported cipher mode: {value}")]
    UnsupportedMode { value: String },

    #[error("Unsupported key size: {bits} bits (expected 128, 192 or 256)")]
    UnsupportedKeySize { bits: u32 },

    #[error("Schema validation failed: {message}")]
    SchemaValidation { message: String },
}

/// Shared memory errors - fatal for the run, never retried.
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("Failed to create shared memory region: {name} - {reason}")]
    CreateFailed { name: String, reason: String },

    #[error("Failed to map shared memory: {reason}")]
    MapFailed { reason: String },

    #[error("Shared memory quota exhausted: requested {requested} bytes, {available} of {quota} available")]
    QuotaExceeded {
        requested: usize,
        available: usize,
        quota: usize,
    },

    #[error("Invalid shared buffer size: {size}")]
    InvalidSize { size: usize },
}

/// Errors raised across the client/secure-domain boundary.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("{command} failed: {status} ({code:#010x}, origin: {origin})", code = .status.code())]
    CommandFailed {
        command: &'static str,
        status: TeeStatus,
        origin: ReturnOrigin,
    },

    #[error("Secure domain session is closed")]
    SessionClosed,

    #[error("Malformed reply from secure domain: {reason}")]
    MalformedReply { reason: String },
}

impl ProtocolError {
    /// The 32-bit status code surfaced to the operator.
    pub fn code(&self) -> u32 {
        match self {
            Self::CommandFailed { status, .. } => status.code(),
            Self::SessionClosed => TeeStatus::Communication.code(),
            Self::MalformedReply { .. } => TeeStatus::Generic.code(),
        }
    }

    /// The status reported by the secure domain, if any.
    pub fn status(&self) -> Option<TeeStatus> {
        match self {
            Self::CommandFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Monotonic clock failures. Timing is the purpose of a run, so these are fatal.
#[derive(Debug, Error)]
pub enum ClockError {
    #[error("Monotonic clock unavailable: {call} - {reason}")]
    Unavailable { call: &'static str, reason: String },

    #[error("Non-monotonic reading: end {end_secs}.{end_nanos:09} precedes start {start_secs}.{start_nanos:09}")]
    NonMonotonic {
        start_secs: i64,
        start_nanos: i64,
        end_secs: i64,
        end_nanos: i64,
    },

    #[error("Elapsed time overflows 64-bit nanoseconds")]
    Overflow,
}

/// Random input source errors. Input randomness does not affect latency
/// correctness, so the harness downgrades these to warnings.
#[derive(Debug, Error)]
pub enum EntropyError {
    #[error("Failed to open entropy source {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read entropy source: {0}")]
    Read(#[source] std::io::Error),

    #[error("Short read from entropy source: requested {requested} bytes, got {got}")]
    ShortRead { requested: usize, got: usize },
}

/// State transition errors for the secure-domain session state machine.
#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("Cannot transition from {from} to {to} in session {session_id}")]
    InvalidTransition {
        session_id: u32,
        from: &'static str,
        to: &'static str,
    },
}

/// Result type alias using AesPerfError.
pub type AesPerfResult<T> = Result<T, AesPerfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_validation_error_display() {
        let err = HardValidationError::InvalidFieldValue {
            field: "inner_loops",
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        };
        assert!(err.to_string().contains("inner_loops"));
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_error_chain() {
        let alloc_err = AllocationError::InvalidSize { size: 0 };
        let err: AesPerfError = alloc_err.into();
        assert!(matches!(err, AesPerfError::Allocation(_)));
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_protocol_error_surfaces_code() {
        let err = ProtocolError::CommandFailed {
            command: "Process",
            status: TeeStatus::BadParameters,
            origin: ReturnOrigin::TrustedApp,
        };
        assert_eq!(err.code(), 0xFFFF_0006);
        assert!(err.to_string().contains("0xffff0006"));

        let err: AesPerfError = err.into();
        assert_eq!(err.status_code(), Some(0xFFFF_0006));
    }
}
