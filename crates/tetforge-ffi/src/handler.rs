//! Host-bound handler: binds one operation's message stream to the
//! registered host callbacks.

use std::sync::{Arc, Mutex, PoisonError};

use tetforge_core::{
    CancelToken, CompletionHandler, Level, OperationOutcome, ProgressHandler, StepProgress,
};

use crate::bridge::HostBridge;

/// Completion status codes on the wire.
pub const STATUS_COMPLETED: i32 = 0;
pub const STATUS_CANCELLED: i32 = 1;
pub const STATUS_FAILED: i32 = 2;

/// Routes an operation's messages into the host bridge.
///
/// Every message goes to the log sink with its category; info messages
/// additionally advance the step counter and drive the progress callback.
/// A host that returns `false` from the progress callback cancels the
/// shared token, which `should_continue` reflects at the next poll.
pub struct HostHandler {
    bridge: Arc<HostBridge>,
    progress: Mutex<StepProgress>,
    token: CancelToken,
}

impl HostHandler {
    pub fn new(bridge: Arc<HostBridge>, total_steps: u32, token: CancelToken) -> Self {
        Self {
            bridge,
            progress: Mutex::new(StepProgress::new(total_steps)),
            token,
        }
    }
}

impl ProgressHandler for HostHandler {
    fn on_message(&self, level: Level, text: &str) {
        self.bridge.emit_log(level, text);

        if level == Level::Info {
            let percent = self
                .progress
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .advance();
            if !self.bridge.emit_progress(percent, text) {
                self.token.cancel();
            }
        }
    }

    fn should_continue(&self) -> bool {
        !self.token.is_cancelled()
    }
}

/// Forwards the operation outcome to the host completion callback.
pub struct HostCompletion {
    bridge: Arc<HostBridge>,
}

impl HostCompletion {
    pub fn new(bridge: Arc<HostBridge>) -> Self {
        Self { bridge }
    }
}

impl CompletionHandler for HostCompletion {
    fn on_complete(&self, outcome: &OperationOutcome) {
        self.bridge.emit_complete(status_code(outcome));
    }
}

/// Wire status for an outcome.
pub fn status_code(outcome: &OperationOutcome) -> i32 {
    match outcome {
        OperationOutcome::Completed { .. } => STATUS_COMPLETED,
        OperationOutcome::Cancelled => STATUS_CANCELLED,
        OperationOutcome::Failed { .. } => STATUS_FAILED,
    }
}
