// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Parameter slots carried by every invocation.

use std::fmt;

/// Number of parameter slots in an operation.
pub const PARAM_SLOTS: usize = 4;

/// Identifier of a shared memory region registered with a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShmId(u64);

impl ShmId {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shm#{}", self.0)
    }
}

/// Declared type of one parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ParamType {
    None = 0x0,
    ValueInput = 0x1,
    ValueOutput = 0x2,
    ValueInout = 0x3,
    MemrefInput = 0x5,
    MemrefOutput = 0x6,
    MemrefInout = 0x7,
}

/// The four slot types, packed four bits per slot into a `u32` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamTypes([ParamType; PARAM_SLOTS]);

impl ParamTypes {
    pub const fn new(
        p0: ParamType,
        p1: ParamType,
        p2: ParamType,
        p3: ParamType,
    ) -> Self {
        Self([p0, p1, p2, p3])
    }

    /// Packed representation.
    pub fn raw(&self) -> u32 {
        self.0
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, t)| acc | ((*t as u32) << (i * 4)))
    }

    pub fn get(&self, index: usize) -> ParamType {
        self.0[index]
    }
}

impl Default for ParamTypes {
    fn default() -> Self {
        Self([ParamType::None; PARAM_SLOTS])
    }
}

/// Reference to a window of a registered shared memory region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemRef {
    pub shm: ShmId,
    pub offset: usize,
    /// Bytes in the window. For output slots the secure side overwrites
    /// this with the number of bytes actually produced.
    pub size: usize,
}

/// Content of one parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parameter {
    #[default]
    None,
    Value {
        a: u32,
        b: u32,
    },
    Memref(MemRef),
}

/// An invocation payload: declared slot types plus slot contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Operation {
    pub param_types: ParamTypes,
    pub params: [Parameter; PARAM_SLOTS],
}

impl Operation {
    pub fn new(param_types: ParamTypes, params: [Parameter; PARAM_SLOTS]) -> Self {
        Self {
            param_types,
            params,
        }
    }
}
