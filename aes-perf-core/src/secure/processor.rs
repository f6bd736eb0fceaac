// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! The two-command secure cipher processor.
//!
//! Owns the single `CipherSession` of a secure-domain session and resolves
//! `Process` memory references against the shared memory registry. Every
//! request is shape-checked by `Command::decode` before any state or buffer
//! is touched.

use std::sync::Arc;

use crate::protocol::{Command, MemRef, Operation, Parameter, TeeStatus};
use crate::secure::CipherSession;
use crate::shm::SharedMemoryRegistry;
use crate::state::{SessionState, SessionStateMachine};
use crate::types::{CipherMode, Direction, KeySize};

/// Static key material held by the secure domain: bytes `00 01 .. 1F`.
pub const DEFAULT_KEY_MATERIAL: [u8; 32] = {
    let mut key = [0u8; 32];
    let mut i = 0;
    while i < key.len() {
        key[i] = i as u8;
        i += 1;
    }
    key
};

/// Secure-side command handler for one session.
pub struct SecureCipherProcessor {
    registry: Arc<SharedMemoryRegistry>,
    key_material: Vec<u8>,
    state: SessionStateMachine,
    session: Option<CipherSession>,
    transform_count: u64,
}

impl SecureCipherProcessor {
    /// Create a processor using the default key material.
    pub fn new(registry: Arc<SharedMemoryRegistry>, session_id: u32) -> Self {
        Self::with_key_material(registry, session_id, DEFAULT_KEY_MATERIAL.to_vec())
    }

    /// Create a processor with caller-loaded key material.
    pub fn with_key_material(
        registry: Arc<SharedMemoryRegistry>,
        session_id: u32,
        key_material: Vec<u8>,
    ) -> Self {
        Self {
            registry,
            key_material,
            state: SessionStateMachine::new(session_id),
            session: None,
            transform_count: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.state()
    }

    /// The bound cipher session, if a key has been prepared.
    pub fn session(&self) -> Option<&CipherSession> {
        self.session.as_ref()
    }

    /// Number of cipher transforms actually executed.
    pub fn transform_count(&self) -> u64 {
        self.transform_count
    }

    /// Handle one invocation.
    ///
    /// For `Process` the output memref size in `operation` is updated on
    /// success and on `ShortBuffer`, where it reports the required size.
    pub fn invoke(&mut self, command_id: u32, operation: &mut Operation) -> Result<(), TeeStatus> {
        if self.state.state() == SessionState::Closed {
            return Err(TeeStatus::BadState);
        }

        match Command::decode(command_id, operation)? {
            Command::PrepareKey {
                direction,
                key_size,
                mode,
            } => self.prepare_key(direction, key_size, mode),
            Command::Process { input, mut output } => {
                let result = self.process(input, &mut output);
                operation.params[1] = Parameter::Memref(output);
                result
            }
        }
    }

    fn prepare_key(
        &mut self,
        direction: Direction,
        key_size: KeySize,
        mode: CipherMode,
    ) -> Result<(), TeeStatus> {
        // Reject before releasing anything, so a bad request leaves the
        // current session usable.
        CipherSession::validate(mode, key_size, &self.key_material)?;

        self.session = None;

        match CipherSession::new(mode, key_size, direction, &self.key_material) {
            Ok(session) => {
                self.session = Some(session);
                self.state
                    .transition_to(SessionState::KeyReady)
                    .map_err(|_| TeeStatus::BadState)?;
                tracing::debug!(
                    session_id = self.state.session_id(),
                    mode = %mode,
                    key_bits = key_size.bits(),
                    direction = %direction,
                    "Prepared key"
                );
                Ok(())
            }
            Err(status) => {
                self.state.reset();
                Err(status)
            }
        }
    }

    fn process(&mut self, input: MemRef, output: &mut MemRef) -> Result<(), TeeStatus> {
        let session = match (&self.session, self.state.is_key_ready()) {
            (Some(session), true) => session,
            _ => return Err(TeeStatus::BadState),
        };

        let len = input.size;
        session.check_input_len(len)?;

        if output.size < len {
            output.size = len;
            return Err(TeeStatus::ShortBuffer);
        }

        let in_region = self
            .registry
            .lookup(input.shm)
            .ok_or(TeeStatus::BadParameters)?;
        let out_region = self
            .registry
            .lookup(output.shm)
            .ok_or(TeeStatus::BadParameters)?;

        if !fits(&input, in_region.capacity()) || !fits_len(output.offset, len, out_region.capacity()) {
            return Err(TeeStatus::BadParameters);
        }

        let same_region = input.shm == output.shm;
        if same_region && input.offset == output.offset {
            // SAFETY: the client is blocked in this invocation, so the secure
            // domain has exclusive access to its regions. Bounds were checked.
            let data = unsafe { out_region.slice_mut(output.offset, len) }
                .ok_or(TeeStatus::BadParameters)?;
            session.apply(data);
        } else {
            if same_region && overlaps(input.offset, output.offset, len) {
                return Err(TeeStatus::BadParameters);
            }
            // SAFETY: as above; the two windows are in different regions or
            // are disjoint within one region.
            let (src, dst) = unsafe {
                (
                    in_region.slice(input.offset, len),
                    out_region.slice_mut(output.offset, len),
                )
            };
            let (src, dst) = src.zip(dst).ok_or(TeeStatus::BadParameters)?;
            dst.copy_from_slice(src);
            session.apply(dst);
        }

        output.size = len;
        self.transform_count += 1;
        Ok(())
    }

    /// Destroy the cipher session and refuse further commands.
    pub fn close(&mut self) {
        self.session = None;
        if self.state.transition_to(SessionState::Closed).is_ok() {
            tracing::debug!(
                session_id = self.state.session_id(),
                transforms = self.transform_count,
                "Secure session closed"
            );
        }
    }
}

impl std::fmt::Debug for SecureCipherProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureCipherProcessor")
            .field("state", &self.state)
            .field("session", &self.session)
            .field("transform_count", &self.transform_count)
            .finish_non_exhaustive()
    }
}

fn fits(window: &MemRef, capacity: usize) -> bool {
    fits_len(window.offset, window.size, capacity)
}

fn fits_len(offset: usize, len: usize, capacity: usize) -> bool {
    offset.checked_add(len).is_some_and(|end| end <= capacity)
}

fn overlaps(a: usize, b: usize, len: usize) -> bool {
    a < b + len && b < a + len
}
