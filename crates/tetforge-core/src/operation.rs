//! Operation-scoped context and completion capability.
//!
//! The context is handed by reference into the meshing algorithm, so the
//! algorithm's progress and cancellation traffic is bound to exactly one
//! operation regardless of what the process-wide handler slot holds.

use std::path::PathBuf;

use crate::cancel::CancelToken;
use crate::handler::HandlerPtr;
use crate::level::Level;

/// Per-operation capability bundle: the handler receiving messages and the
/// token gating continuation. Lifetime equals the operation's lifetime.
pub struct OperationContext {
    handler: HandlerPtr,
    token: CancelToken,
}

impl OperationContext {
    pub fn new(handler: HandlerPtr, token: CancelToken) -> Self {
        Self { handler, token }
    }

    /// Deliver a message to this operation's handler.
    pub fn emit(&self, level: Level, text: impl AsRef<str>) {
        if level == Level::Off {
            return;
        }
        self.handler.on_message(level, text.as_ref());
    }

    pub fn trace(&self, text: impl AsRef<str>) {
        self.emit(Level::Trace, text);
    }

    pub fn debug(&self, text: impl AsRef<str>) {
        self.emit(Level::Debug, text);
    }

    pub fn info(&self, text: impl AsRef<str>) {
        self.emit(Level::Info, text);
    }

    pub fn warn(&self, text: impl AsRef<str>) {
        self.emit(Level::Warn, text);
    }

    pub fn error(&self, text: impl AsRef<str>) {
        self.emit(Level::Error, text);
    }

    pub fn critical(&self, text: impl AsRef<str>) {
        self.emit(Level::Critical, text);
    }

    /// Whether the operation should keep running. False once the token is
    /// cancelled or the handler votes to stop.
    pub fn should_continue(&self) -> bool {
        !self.token.is_cancelled() && self.handler.should_continue()
    }

    /// Emit an info-level checkpoint and poll for cancellation in one
    /// step. Algorithms call this between coarse units of work; a `false`
    /// return means wind down and return without further checkpoints.
    pub fn checkpoint(&self, text: impl AsRef<str>) -> bool {
        self.emit(Level::Info, text);
        self.should_continue()
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

/// How an operation ended. Delivered to the completion handler exactly
/// once per started operation, on the worker thread.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    /// The algorithm ran to completion (and the mesh was exported, when an
    /// output path was given).
    Completed {
        tet_count: usize,
        output_path: Option<PathBuf>,
    },
    /// The operation wound down after a cancellation request.
    Cancelled,
    /// The algorithm failed or panicked, or the export failed.
    Failed { reason: String },
}

impl OperationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, OperationOutcome::Completed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OperationOutcome::Cancelled)
    }
}

/// Capability invoked when an operation finishes, however it finishes.
pub trait CompletionHandler: Send + Sync {
    fn on_complete(&self, outcome: &OperationOutcome);
}

impl<F> CompletionHandler for F
where
    F: Fn(&OperationOutcome) + Send + Sync,
{
    fn on_complete(&self, outcome: &OperationOutcome) {
        self(outcome)
    }
}
