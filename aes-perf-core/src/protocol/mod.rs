// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Client/secure-domain command protocol.
//!
//! The wire contract is a command identifier plus an `Operation` of four
//! typed parameter slots. The secure side decodes an operation into a
//! `Command` only after its parameter shape matches the command exactly.

mod command;
mod params;
mod status;

pub use command::{Command, CommandId};
pub use params::{MemRef, Operation, ParamType, ParamTypes, Parameter, ShmId};
pub use status::{ReturnOrigin, TeeStatus};
