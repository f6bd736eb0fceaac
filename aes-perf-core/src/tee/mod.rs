// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Client-side handles to the secure domain.
//!
//! A `TeeContext` owns the shared memory registry. Each `TeeSession` runs
//! its `SecureCipherProcessor` on a dedicated worker thread and talks to it
//! only by message passing; a call blocks until the worker replies.

mod context;
mod session;

pub use context::TeeContext;
pub use session::TeeSession;
