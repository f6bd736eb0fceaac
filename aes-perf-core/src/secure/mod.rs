// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Secure-domain side of the boundary.
//!
//! Nothing here is called by the client directly: a `TeeSession` forwards
//! each invocation to a worker that owns one `SecureCipherProcessor`.

mod cipher;
mod processor;

pub use cipher::{required_key_bytes, CipherSession};
pub use processor::{SecureCipherProcessor, DEFAULT_KEY_MATERIAL};
