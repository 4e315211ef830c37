//! Progress handler capability and the process-wide handler slot.
//!
//! A [`ProgressHandler`] is the listener side of the broker: it receives
//! leveled messages from a running operation and answers whether that
//! operation should keep going. Exactly one handler is active at a time,
//! held by a weak reference so the handler's true owner (usually a worker
//! thread) can go away without emitters ever observing a dangling pointer:
//! resolution of a dead handler degrades to the always-alive default.

use std::sync::{Arc, PoisonError, RwLock, Weak};

use once_cell::sync::Lazy;

use crate::level::Level;

/// Trait for receiving leveled progress messages and gating continuation.
pub trait ProgressHandler: Send + Sync {
    /// Called for every message an operation emits.
    fn on_message(&self, level: Level, text: &str);

    /// Called when the operation polls for cancellation. Returning `false`
    /// asks the operation to wind down gracefully at its next checkpoint.
    fn should_continue(&self) -> bool;
}

pub type HandlerPtr = Arc<dyn ProgressHandler>;

/// Fallback handler: routes every message into `tracing` and always
/// continues. Kept alive for the lifetime of the process.
#[derive(Debug, Default)]
pub struct DefaultHandler;

impl ProgressHandler for DefaultHandler {
    fn on_message(&self, level: Level, text: &str) {
        match level {
            Level::Trace => tracing::trace!(target: "tetforge", "{}", text),
            Level::Debug => tracing::debug!(target: "tetforge", "{}", text),
            Level::Info => tracing::info!(target: "tetforge", "{}", text),
            Level::Warn => tracing::warn!(target: "tetforge", "{}", text),
            Level::Error => tracing::error!(target: "tetforge", "{}", text),
            Level::Critical => tracing::error!(target: "tetforge", severity = %level, "{}", text),
            Level::Off => {}
        }
    }

    fn should_continue(&self) -> bool {
        true
    }
}

static DEFAULT_HANDLER: Lazy<HandlerPtr> = Lazy::new(|| Arc::new(DefaultHandler));

/// The process-wide slot. Holds a weak reference only; the active
/// handler's lifetime is owned by whoever installed it.
static ACTIVE_HANDLER: Lazy<RwLock<Weak<dyn ProgressHandler>>> =
    Lazy::new(|| RwLock::new(Arc::downgrade(&*DEFAULT_HANDLER)));

/// Install `handler` as the active progress handler, or revert to the
/// default when `None` is passed.
///
/// The slot does not keep the handler alive. Once the last strong
/// reference is dropped, [`handler`] resolves to the default again without
/// any explicit unsubscription.
pub fn set_handler(handler: Option<&HandlerPtr>) {
    let weak = match handler {
        Some(h) => Arc::downgrade(h),
        None => Arc::downgrade(&*DEFAULT_HANDLER),
    };
    let mut slot = ACTIVE_HANDLER
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *slot = weak;
}

/// Resolve the currently active handler.
///
/// Always returns a usable handler: the installed one while it is alive,
/// the default otherwise. Callers never special-case "no handler".
pub fn handler() -> HandlerPtr {
    let slot = ACTIVE_HANDLER
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    slot.upgrade().unwrap_or_else(|| Arc::clone(&*DEFAULT_HANDLER))
}

/// The process-lifetime default handler.
pub fn default_handler() -> HandlerPtr {
    Arc::clone(&*DEFAULT_HANDLER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Mutex;

    /// Records every delivery; `should_continue` is a settable flag.
    pub(crate) struct RecordingHandler {
        pub messages: Mutex<Vec<(Level, String)>>,
        pub keep_going: std::sync::atomic::AtomicBool,
    }

    impl RecordingHandler {
        pub(crate) fn new() -> Self {
            Self {
                messages: Mutex::new(Vec::new()),
                keep_going: std::sync::atomic::AtomicBool::new(true),
            }
        }
    }

    impl ProgressHandler for RecordingHandler {
        fn on_message(&self, level: Level, text: &str) {
            self.messages
                .lock()
                .unwrap()
                .push((level, text.to_string()));
        }

        fn should_continue(&self) -> bool {
            self.keep_going.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    #[test]
    #[serial]
    fn test_installed_handler_receives_messages() {
        let recorder = Arc::new(RecordingHandler::new());
        let handler_ptr: HandlerPtr = recorder.clone();
        set_handler(Some(&handler_ptr));

        handler().on_message(Level::Info, "step one");

        let messages = recorder.messages.lock().unwrap();
        assert_eq!(messages.as_slice(), &[(Level::Info, "step one".to_string())]);
        drop(messages);

        set_handler(None);
    }

    #[test]
    #[serial]
    fn test_dropped_handler_falls_back_to_default() {
        let recorder = Arc::new(RecordingHandler::new());
        let handler_ptr: HandlerPtr = recorder.clone();
        set_handler(Some(&handler_ptr));

        drop(handler_ptr);
        drop(recorder);

        // The weak reference is dead; resolution must yield the default,
        // and emission must not crash.
        let resolved = handler();
        assert!(resolved.should_continue());
        resolved.on_message(Level::Info, "after drop");

        set_handler(None);
    }

    #[test]
    #[serial]
    fn test_set_none_reverts_to_default() {
        let recorder = Arc::new(RecordingHandler::new());
        let handler_ptr: HandlerPtr = recorder.clone();
        set_handler(Some(&handler_ptr));
        set_handler(None);

        handler().on_message(Level::Info, "routed to default");
        assert!(recorder.messages.lock().unwrap().is_empty());
    }

    #[test]
    #[serial]
    fn test_replacement_reroutes_messages() {
        let first = Arc::new(RecordingHandler::new());
        let second = Arc::new(RecordingHandler::new());
        let first_ptr: HandlerPtr = first.clone();
        let second_ptr: HandlerPtr = second.clone();

        set_handler(Some(&first_ptr));
        set_handler(Some(&second_ptr));
        handler().on_message(Level::Warn, "who gets this");

        assert!(first.messages.lock().unwrap().is_empty());
        assert_eq!(second.messages.lock().unwrap().len(), 1);

        set_handler(None);
    }
}
