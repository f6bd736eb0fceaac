// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

use std::thread::{self, JoinHandle};

use tokio::sync::{mpsc, oneshot};

use crate::error::{AesPerfError, AesPerfResult, ProtocolError};
use crate::protocol::{CommandId, Operation, ReturnOrigin, TeeStatus};
use crate::secure::SecureCipherProcessor;
use crate::tee::TeeContext;

/// Name of the worker thread hosting the secure side of a session.
const WORKER_THREAD_NAME: &str = "secure-domain";

/// One invocation crossing the boundary.
struct Request {
    command_id: u32,
    operation: Operation,
    reply: oneshot::Sender<Reply>,
}

/// The secure side's answer, carrying back the updated operation.
struct Reply {
    operation: Operation,
    result: Result<(), TeeStatus>,
}

/// An open session to the secure domain.
///
/// Invocations take `&mut self`, so at most one call is in flight per
/// session.
#[derive(Debug)]
pub struct TeeSession {
    id: u32,
    context: TeeContext,
    sender: Option<mpsc::Sender<Request>>,
    worker: Option<JoinHandle<()>>,
}

impl TeeSession {
    pub(crate) fn spawn(
        context: TeeContext,
        id: u32,
        mut processor: SecureCipherProcessor,
    ) -> AesPerfResult<Self> {
        let (sender, mut receiver) = mpsc::channel::<Request>(1);

        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                while let Some(mut request) = receiver.blocking_recv() {
                    let result = processor.invoke(request.command_id, &mut request.operation);
                    let reply = Reply {
                        operation: request.operation,
                        result,
                    };
                    // The client gave up waiting; nothing to report back.
                    let _ = request.reply.send(reply);
                }
                processor.close();
            })
            .map_err(|source| AesPerfError::Io {
                context: "spawning secure-domain worker",
                source,
            })?;

        tracing::debug!(session_id = id, "Opened secure session");

        Ok(Self {
            id,
            context,
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// The context this session was opened on.
    pub fn context(&self) -> &TeeContext {
        &self.context
    }

    pub fn is_open(&self) -> bool {
        self.sender.is_some()
    }

    /// Invoke a known command and block until the secure domain replies.
    pub fn invoke(
        &mut self,
        command: CommandId,
        operation: &mut Operation,
    ) -> Result<(), ProtocolError> {
        self.invoke_raw(command.value(), operation)
    }

    /// Invoke by numeric command id. Unknown ids are forwarded unchanged and
    /// rejected by the secure side.
    ///
    /// `operation` is updated with whatever the secure side wrote back, also
    /// when the command fails.
    pub fn invoke_raw(
        &mut self,
        command_id: u32,
        operation: &mut Operation,
    ) -> Result<(), ProtocolError> {
        let command = CommandId::from_value(command_id).map_or("Unknown", |id| id.name());
        let sender = self.sender.as_ref().ok_or(ProtocolError::SessionClosed)?;

        let communication_failure = || ProtocolError::CommandFailed {
            command,
            status: TeeStatus::Communication,
            origin: ReturnOrigin::Communication,
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let request = Request {
            command_id,
            operation: *operation,
            reply: reply_tx,
        };

        sender
            .blocking_send(request)
            .map_err(|_| communication_failure())?;
        let reply = reply_rx
            .blocking_recv()
            .map_err(|_| communication_failure())?;

        *operation = reply.operation;
        reply.result.map_err(|status| ProtocolError::CommandFailed {
            command,
            status,
            origin: ReturnOrigin::TrustedApp,
        })
    }

    /// Close the session, destroying the secure-side cipher session.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender ends the worker loop.
        if self.sender.take().is_none() {
            return;
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!(session_id = self.id, "Secure-domain worker panicked");
            }
        }
        tracing::debug!(session_id = self.id, "Closed secure session");
    }
}

impl Drop for TeeSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Command;
    use crate::types::{CipherMode, Direction, KeySize};

    fn prepare_op(mode: CipherMode, key_size: KeySize) -> Operation {
        Command::PrepareKey {
            direction: Direction::Encrypt,
            key_size,
            mode,
        }
        .encode()
        .1
    }

    #[test]
    fn test_prepare_key_round_trip() {
        let context = TeeContext::default();
        let mut session = context.open_session().unwrap();
        assert!(session.is_open());

        let mut op = prepare_op(CipherMode::Cbc, KeySize::Aes256);
        session.invoke(CommandId::PrepareKey, &mut op).unwrap();
        session.close();
    }

    #[test]
    fn test_secure_error_carries_status_and_origin() {
        let context = TeeContext::default();
        let mut session = context.open_session().unwrap();

        let mut op = prepare_op(CipherMode::Xts, KeySize::Aes256);
        let err = session
            .invoke(CommandId::PrepareKey, &mut op)
            .unwrap_err();
        match err {
            ProtocolError::CommandFailed {
                command,
                status,
                origin,
            } => {
                assert_eq!(command, "PrepareKey");
                assert_eq!(status, TeeStatus::BadParameters);
                assert_eq!(origin, ReturnOrigin::TrustedApp);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unknown_command_id() {
        let context = TeeContext::default();
        let mut session = context.open_session().unwrap();
        let mut op = Operation::default();
        let err = session.invoke_raw(42, &mut op).unwrap_err();
        assert_eq!(err.code(), TeeStatus::BadParameters.code());
        assert!(err.to_string().starts_with("Unknown failed"));
    }

    #[test]
    fn test_invoke_after_shutdown_is_session_closed() {
        let context = TeeContext::default();
        let mut session = context.open_session().unwrap();
        session.shutdown();
        assert!(!session.is_open());

        let mut op = prepare_op(CipherMode::Ecb, KeySize::Aes128);
        assert!(matches!(
            session.invoke(CommandId::PrepareKey, &mut op),
            Err(ProtocolError::SessionClosed)
        ));
    }
}
