//! Emission façade used from inside a running computation.
//!
//! These free functions (and the `report_*!` macros in the crate root)
//! resolve the active handler on every call, so deep algorithm code needs
//! no reference to who, if anyone, is listening. Formatting happens at the
//! call site whether or not a live handler is installed.

use crate::handler;
use crate::level::Level;

/// Deliver a message at the given level to the active handler.
///
/// `Off` is a filter threshold, not a message level; emitting at `Off` is
/// a no-op.
pub fn emit(level: Level, text: impl AsRef<str>) {
    if level == Level::Off {
        return;
    }
    handler::handler().on_message(level, text.as_ref());
}

pub fn trace(text: impl AsRef<str>) {
    emit(Level::Trace, text);
}

pub fn debug(text: impl AsRef<str>) {
    emit(Level::Debug, text);
}

pub fn info(text: impl AsRef<str>) {
    emit(Level::Info, text);
}

pub fn warn(text: impl AsRef<str>) {
    emit(Level::Warn, text);
}

pub fn error(text: impl AsRef<str>) {
    emit(Level::Error, text);
}

pub fn critical(text: impl AsRef<str>) {
    emit(Level::Critical, text);
}

/// Poll whether the current operation should keep running.
///
/// Returns `true` when no handler is installed: an unlistened operation
/// runs to completion.
pub fn should_continue() -> bool {
    handler::handler().should_continue()
}

/// Emit a trace message, formatting at the call site.
#[macro_export]
macro_rules! report_trace {
    ($($arg:tt)*) => {
        $crate::report::trace(::std::format!($($arg)*))
    };
}

/// Emit a debug message, formatting at the call site.
#[macro_export]
macro_rules! report_debug {
    ($($arg:tt)*) => {
        $crate::report::debug(::std::format!($($arg)*))
    };
}

/// Emit an info message, formatting at the call site. Info messages are
/// the ones a progress-tracking handler counts as checkpoints.
#[macro_export]
macro_rules! report_info {
    ($($arg:tt)*) => {
        $crate::report::info(::std::format!($($arg)*))
    };
}

/// Emit a warning message, formatting at the call site.
#[macro_export]
macro_rules! report_warn {
    ($($arg:tt)*) => {
        $crate::report::warn(::std::format!($($arg)*))
    };
}

/// Emit an error message, formatting at the call site.
#[macro_export]
macro_rules! report_error {
    ($($arg:tt)*) => {
        $crate::report::error(::std::format!($($arg)*))
    };
}

/// Emit a critical message, formatting at the call site.
#[macro_export]
macro_rules! report_critical {
    ($($arg:tt)*) => {
        $crate::report::critical(::std::format!($($arg)*))
    };
}
