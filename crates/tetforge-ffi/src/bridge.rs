//! The host callback bridge: a synchronized registry of the function
//! pointers a host registers before (or between) operations.
//!
//! Registration may race with an in-flight operation's emissions, so all
//! fields live behind one lock; pointers are copied out before any host
//! callback is invoked, and no callback ever runs under the lock. An
//! unset slot is a no-op, never an error.

use std::ffi::CString;
use std::os::raw::c_char;
use std::sync::{PoisonError, RwLock};

use tetforge_core::Level;

/// Progress callback: percentage in `[0, 100]` plus the checkpoint
/// message. The message pointer is only valid for the duration of the
/// call. Returning `false` requests cooperative cancellation.
pub type ProgressCallback = extern "C" fn(progress: f32, message: *const c_char) -> bool;

/// Completion callback: status is 0 completed, 1 cancelled, 2 failed.
pub type CompleteCallback = extern "C" fn(status: i32);

/// Log callback: category is 0 info, 1 warning, 2 error. The message
/// pointer is only valid for the duration of the call.
pub type LogCallback = extern "C" fn(category: i32, message: *const c_char);

#[derive(Clone, Copy)]
struct Callbacks {
    progress: Option<ProgressCallback>,
    complete: Option<CompleteCallback>,
    log: Option<LogCallback>,
    min_level: Level,
}

impl Default for Callbacks {
    fn default() -> Self {
        Self {
            progress: None,
            complete: None,
            log: None,
            min_level: Level::Trace,
        }
    }
}

/// Synchronized host callback registry.
#[derive(Default)]
pub struct HostBridge {
    inner: RwLock<Callbacks>,
}

impl HostBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Callbacks {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, apply: impl FnOnce(&mut Callbacks)) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut inner);
    }

    pub fn set_progress(&self, cb: Option<ProgressCallback>) {
        self.write(|c| c.progress = cb);
    }

    pub fn set_complete(&self, cb: Option<CompleteCallback>) {
        self.write(|c| c.complete = cb);
    }

    pub fn set_log(&self, cb: Option<LogCallback>) {
        self.write(|c| c.log = cb);
    }

    /// Minimum level the log sink delivers; `Off` suppresses everything.
    pub fn set_min_level(&self, level: Level) {
        self.write(|c| c.min_level = level);
    }

    /// Drop every registered callback and reset the level filter.
    pub fn clear(&self) {
        self.write(|c| *c = Callbacks::default());
    }

    /// Forward a progress checkpoint to the host. Returns `false` when
    /// the host asked to cancel; `true` when it wants to continue or no
    /// callback is registered.
    pub fn emit_progress(&self, percent: f32, text: &str) -> bool {
        match self.read().progress {
            Some(cb) => {
                let message = CString::new(text).unwrap_or_default();
                cb(percent, message.as_ptr())
            }
            None => true,
        }
    }

    /// Route a leveled message to the host log sink, applying the level
    /// filter and the level-to-category mapping.
    pub fn emit_log(&self, level: Level, text: &str) {
        let callbacks = self.read();
        if level < callbacks.min_level {
            return;
        }
        let Some(category) = level.category() else {
            return;
        };
        if let Some(cb) = callbacks.log {
            let message = CString::new(text).unwrap_or_default();
            cb(category.index(), message.as_ptr());
        }
    }

    /// Fire the completion callback, if registered.
    pub fn emit_complete(&self, status: i32) {
        if let Some(cb) = self.read().complete {
            cb(status);
        }
    }
}
