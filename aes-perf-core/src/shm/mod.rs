// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Shared memory visible across the client/secure-domain boundary.
//!
//! Zero-copy buffer passing using POSIX shared memory: the client owns the
//! regions, the secure domain reads and writes them in place during a call.

mod buffer;
mod region;
mod registry;

pub use buffer::{SharedBuffer, SharedBuffers, TransferDirection};
pub use region::SharedMemoryRegion;
pub use registry::{SharedMemoryRegistry, DEFAULT_SHM_QUOTA};
