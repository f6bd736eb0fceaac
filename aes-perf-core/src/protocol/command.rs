// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! The two commands understood by the secure cipher processor.

use std::fmt;

use crate::protocol::params::{MemRef, Operation, ParamType, ParamTypes, Parameter};
use crate::protocol::status::TeeStatus;
use crate::types::{CipherMode, Direction, KeySize};

/// Numeric command identifiers. Stable across the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandId {
    PrepareKey = 0,
    Process = 1,
}

impl CommandId {
    pub const fn value(&self) -> u32 {
        *self as u32
    }

    pub const fn from_value(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::PrepareKey),
            1 => Some(Self::Process),
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::PrepareKey => "PrepareKey",
            Self::Process => "Process",
        }
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A decoded, shape-checked request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Build key material and a cipher operation bound to these parameters.
    PrepareKey {
        direction: Direction,
        key_size: KeySize,
        mode: CipherMode,
    },
    /// Run one finalized cipher transform from `input` into `output`.
    Process { input: MemRef, output: MemRef },
}

impl Command {
    /// Slot layout of `PrepareKey`: `[value(direction, key bits), value(mode)]`.
    pub const PREPARE_KEY_TYPES: ParamTypes = ParamTypes::new(
        ParamType::ValueInput,
        ParamType::ValueInput,
        ParamType::None,
        ParamType::None,
    );

    /// Slot layout of `Process`: `[memref input, memref output]`.
    pub const PROCESS_TYPES: ParamTypes = ParamTypes::new(
        ParamType::MemrefInput,
        ParamType::MemrefOutput,
        ParamType::None,
        ParamType::None,
    );

    pub fn id(&self) -> CommandId {
        match self {
            Self::PrepareKey { .. } => CommandId::PrepareKey,
            Self::Process { .. } => CommandId::Process,
        }
    }

    /// Marshal into the wire representation.
    pub fn encode(&self) -> (CommandId, Operation) {
        let operation = match *self {
            Self::PrepareKey {
                direction,
                key_size,
                mode,
            } => Operation::new(
                Self::PREPARE_KEY_TYPES,
                [
                    Parameter::Value {
                        a: direction.flag(),
                        b: key_size.bits(),
                    },
                    Parameter::Value {
                        a: mode.id(),
                        b: 0,
                    },
                    Parameter::None,
                    Parameter::None,
                ],
            ),
            Self::Process { input, output } => Operation::new(
                Self::PROCESS_TYPES,
                [
                    Parameter::Memref(input),
                    Parameter::Memref(output),
                    Parameter::None,
                    Parameter::None,
                ],
            ),
        };
        (self.id(), operation)
    }

    /// Validate the parameter shape for `command_id` and decode.
    ///
    /// Any mismatch between the declared slot types and the expected layout,
    /// or between a declared type and the slot content, is `BadParameters`.
    pub fn decode(command_id: u32, operation: &Operation) -> Result<Self, TeeStatus> {
        let id = CommandId::from_value(command_id).ok_or(TeeStatus::BadParameters)?;

        match id {
            CommandId::PrepareKey => {
                if operation.param_types != Self::PREPARE_KEY_TYPES {
                    return Err(TeeStatus::BadParameters);
                }
                let (flag, bits, mode_id) = match operation.params {
                    [Parameter::Value { a: flag, b: bits }, Parameter::Value { a: mode_id, .. }, Parameter::None, Parameter::None] => {
                        (flag, bits, mode_id)
                    }
                    _ => return Err(TeeStatus::BadParameters),
                };

                Ok(Self::PrepareKey {
                    direction: Direction::from_flag(flag),
                    key_size: KeySize::try_from(bits).map_err(|_| TeeStatus::BadParameters)?,
                    mode: CipherMode::try_from(mode_id).map_err(|_| TeeStatus::BadParameters)?,
                })
            }
            CommandId::Process => {
                if operation.param_types != Self::PROCESS_TYPES {
                    return Err(TeeStatus::BadParameters);
                }
                match operation.params {
                    [Parameter::Memref(input), Parameter::Memref(output), Parameter::None, Parameter::None] => {
                        Ok(Self::Process { input, output })
                    }
                    _ => Err(TeeStatus::BadParameters),
                }
            }
        }
    }
}
