// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! aes-perf Core Library
//!
//! Core of the AES latency benchmark: running statistics, the monotonic
//! clock, validated configuration, shared buffers visible across the
//! secure-domain boundary, the two-command protocol and both of its ends.

pub mod client;
pub mod clock;
pub mod config;
pub mod entropy;
pub mod error;
pub mod protocol;
pub mod secure;
pub mod shm;
pub mod state;
pub mod stats;
pub mod tee;
pub mod types;

// Re-export commonly used types
pub use client::CommandProtocolClient;
pub use clock::{MonotonicClock, Timestamp};
pub use config::{BenchmarkConfig, BenchmarkConfigBuilder, ConfigLoader};
pub use entropy::EntropySource;
pub use error::{
    AesPerfError, AesPerfResult, AllocationError, ClockError, EntropyError,
    HardValidationError, ProtocolError,
};
pub use secure::SecureCipherProcessor;
pub use shm::{SharedBuffer, SharedBuffers, SharedMemoryRegistry};
pub use state::{SessionState, SessionStateMachine};
pub use stats::{RunningStatistics, StatisticsSummary};
pub use tee::{TeeContext, TeeSession};
pub use types::{BufferSize, CipherMode, Direction, KeySize, AES_BLOCK_SIZE};
