//! Severity levels for progress messages and their host-facing categories.

use serde::{Deserialize, Serialize};

/// Severity of a progress message.
///
/// Levels are ordered: `Trace < Debug < Info < Warn < Error < Critical < Off`.
/// `Off` is never emitted; it only exists as a filter threshold that
/// suppresses delivery entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
    Off,
}

/// The three categories a host log surface distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    Info,
    Warning,
    Error,
}

impl Level {
    /// Map this level to its host log category.
    ///
    /// The mapping is total and stable: `Trace`/`Debug`/`Info` are
    /// info-like, `Warn` is a warning, `Error`/`Critical` are errors.
    /// `Off` maps to `None` and is suppressed.
    pub fn category(self) -> Option<LogCategory> {
        match self {
            Level::Trace | Level::Debug | Level::Info => Some(LogCategory::Info),
            Level::Warn => Some(LogCategory::Warning),
            Level::Error | Level::Critical => Some(LogCategory::Error),
            Level::Off => None,
        }
    }

    /// Short lowercase name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Critical => "critical",
            Level::Off => "off",
        }
    }

    /// Decode a level from its wire integer (0 = trace .. 6 = off).
    pub fn from_index(value: i32) -> Option<Self> {
        match value {
            0 => Some(Level::Trace),
            1 => Some(Level::Debug),
            2 => Some(Level::Info),
            3 => Some(Level::Warn),
            4 => Some(Level::Error),
            5 => Some(Level::Critical),
            6 => Some(Level::Off),
            _ => None,
        }
    }

    /// Wire integer for this level.
    pub fn index(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LogCategory {
    /// Wire integer for the host sink: 0 info, 1 warning, 2 error.
    pub fn index(self) -> i32 {
        match self {
            LogCategory::Info => 0,
            LogCategory::Warning => 1,
            LogCategory::Error => 2,
        }
    }
}
