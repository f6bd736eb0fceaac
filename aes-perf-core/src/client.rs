// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CommandProtocolClient - marshals benchmark commands over a session.
//!
//! `PrepareKey` is sent once per run. The `Process` operation is built once
//! by `bind` and reused for every call, so the measured path does no
//! marshalling beyond copying the operation across the boundary.
//!
//! A bound client holds the shared buffers mutably. Client-side views of
//! the buffers go through the client, so none can be alive while a `Process`
//! call lets the secure domain write into them.
//!
//! ```compile_fail
//! use aes_perf_core::{CommandProtocolClient, SharedBuffers, TeeContext};
//!
//! let context = TeeContext::default();
//! let mut buffers = SharedBuffers::allocate(context.registry(), 16, false).unwrap();
//! let mut session = context.open_session().unwrap();
//! let mut client = CommandProtocolClient::new(&mut session);
//! client.bind(&mut buffers);
//!
//! let output = buffers.output().as_slice();
//! client.process().unwrap();
//! assert_eq!(output.len(), 16);
//! ```

use crate::error::ProtocolError;
use crate::protocol::{Command, CommandId, Operation, Parameter};
use crate::shm::SharedBuffers;
use crate::tee::TeeSession;
use crate::types::{CipherMode, Direction, KeySize};

/// Client half of the command protocol, borrowing a session and its bound
/// buffers exclusively.
#[derive(Debug)]
pub struct CommandProtocolClient<'a> {
    session: &'a mut TeeSession,
    buffers: Option<&'a mut SharedBuffers>,
    process_op: Option<Operation>,
    process_calls: u64,
}

impl<'a> CommandProtocolClient<'a> {
    pub fn new(session: &'a mut TeeSession) -> Self {
        Self {
            session,
            buffers: None,
            process_op: None,
            process_calls: 0,
        }
    }

    /// Ask the secure domain to build a cipher session.
    pub fn prepare_key(
        &mut self,
        direction: Direction,
        key_size: KeySize,
        mode: CipherMode,
    ) -> Result<(), ProtocolError> {
        let (id, mut operation) = Command::PrepareKey {
            direction,
            key_size,
            mode,
        }
        .encode();
        self.session.invoke(id, &mut operation)
    }

    /// Point subsequent `Process` calls at `buffers`. In place, the single
    /// region is passed as both input and output.
    pub fn bind(&mut self, buffers: &'a mut SharedBuffers) {
        let (_, operation) = Command::Process {
            input: buffers.input().memref(),
            output: buffers.output().memref(),
        }
        .encode();
        self.process_op = Some(operation);
        self.buffers = Some(buffers);
    }

    /// The bound buffers, between calls.
    pub fn buffers(&self) -> Option<&SharedBuffers> {
        self.buffers.as_deref()
    }

    /// The bound buffers, mutably, for refreshing input between calls.
    pub fn buffers_mut(&mut self) -> Option<&mut SharedBuffers> {
        self.buffers.as_deref_mut()
    }

    /// Issue one `Process` call and return the output size reported back.
    ///
    /// The size is also recorded as the output buffer's current size.
    pub fn process(&mut self) -> Result<usize, ProtocolError> {
        let template = self.process_op.ok_or(ProtocolError::MalformedReply {
            reason: "Process issued before any buffers were bound".to_string(),
        })?;

        let mut operation = template;
        self.process_calls += 1;
        self.session.invoke(CommandId::Process, &mut operation)?;

        let size = match operation.params[1] {
            Parameter::Memref(output) => output.size,
            other => {
                return Err(ProtocolError::MalformedReply {
                    reason: format!("output slot came back as {:?}", other),
                })
            }
        };
        if let Some(buffers) = self.buffers.as_deref_mut() {
            buffers.output_mut().set_current_size(size);
        }
        Ok(size)
    }

    /// Issue `count` back-to-back `Process` calls; returns the last output
    /// size. Stops at the first failure.
    pub fn process_batch(&mut self, count: u32) -> Result<usize, ProtocolError> {
        let mut produced = 0;
        for _ in 0..count {
            produced = self.process()?;
        }
        Ok(produced)
    }

    /// Number of `Process` invocations issued so far, failed ones included.
    pub fn process_calls(&self) -> u64 {
        self.process_calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TeeStatus;
    use crate::tee::TeeContext;

    #[test]
    fn test_process_without_bind_is_rejected_locally() {
        let context = TeeContext::default();
        let mut session = context.open_session().unwrap();
        let mut client = CommandProtocolClient::new(&mut session);

        assert!(client.buffers().is_none());
        assert!(matches!(
            client.process(),
            Err(ProtocolError::MalformedReply { .. })
        ));
        assert_eq!(client.process_calls(), 0);
    }

    #[test]
    fn test_process_before_prepare_key_is_bad_state() {
        let context = TeeContext::default();
        let mut buffers = SharedBuffers::allocate(context.registry(), 16, false).unwrap();
        let mut session = context.open_session().unwrap();
        let mut client = CommandProtocolClient::new(&mut session);
        client.bind(&mut buffers);

        let err = client.process().unwrap_err();
        assert_eq!(err.status(), Some(TeeStatus::BadState));
        assert_eq!(client.process_calls(), 1);
    }

    #[test]
    fn test_batch_counts_every_call() {
        let context = TeeContext::default();
        let mut buffers = SharedBuffers::allocate(context.registry(), 64, false).unwrap();
        let mut session = context.open_session().unwrap();
        let mut client = CommandProtocolClient::new(&mut session);

        client
            .prepare_key(Direction::Encrypt, KeySize::Aes128, CipherMode::Ctr)
            .unwrap();
        client.bind(&mut buffers);

        assert_eq!(client.process_batch(3).unwrap(), 64);
        assert_eq!(client.process_batch(0).unwrap(), 0);
        assert_eq!(client.process_calls(), 3);
    }

    #[test]
    fn test_process_records_reported_output_size() {
        let context = TeeContext::default();
        let mut buffers = SharedBuffers::allocate(context.registry(), 48, false).unwrap();
        buffers.output_mut().set_current_size(0);

        let mut session = context.open_session().unwrap();
        let mut client = CommandProtocolClient::new(&mut session);
        client
            .prepare_key(Direction::Encrypt, KeySize::Aes128, CipherMode::Cbc)
            .unwrap();
        client.bind(&mut buffers);
        assert_eq!(client.buffers().unwrap().output().current_size(), 0);

        assert_eq!(client.process().unwrap(), 48);
        assert_eq!(client.buffers().unwrap().output().current_size(), 48);
    }

    #[test]
    fn test_views_go_through_the_client_between_calls() {
        let context = TeeContext::default();
        let mut buffers = SharedBuffers::allocate(context.registry(), 16, false).unwrap();
        let mut session = context.open_session().unwrap();
        let mut client = CommandProtocolClient::new(&mut session);
        client
            .prepare_key(Direction::Encrypt, KeySize::Aes128, CipherMode::Ecb)
            .unwrap();
        client.bind(&mut buffers);

        let before = client.buffers().unwrap().output().as_slice().to_vec();
        assert_eq!(before, [0u8; 16]);
        client.process().unwrap();
        let after = client.buffers().unwrap().output().as_slice().to_vec();
        assert_ne!(after, before);

        // Refreshing the input changes the next result.
        client
            .buffers_mut()
            .unwrap()
            .input_mut()
            .as_mut_slice()
            .fill(0xFF);
        client.process().unwrap();
        assert_ne!(client.buffers().unwrap().output().as_slice(), after.as_slice());
    }
}
