//! The logging seam.
//!
//! Guards only ever emit leveled strings. The default sink forwards to the `log` facade;
//! [`NullLogger`] discards everything and [`MemoryLogger`] keeps messages for inspection.

use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink for guard messages.
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

/// Forwards to the `log` crate.
///
/// `log` has no fatal level: fatal messages go out at `Error` under the `<target>::fatal` target.
#[derive(Clone, Debug)]
pub struct LogFacade {
    target: &'static str,
    fatal_target: &'static str,
}

impl LogFacade {
    pub const DEFAULT_TARGET: &'static str = "catchguard";

    pub fn new() -> Self {
        Self {
            target: Self::DEFAULT_TARGET,
            fatal_target: "catchguard::fatal",
        }
    }

    pub fn with_targets(target: &'static str, fatal_target: &'static str) -> Self {
        Self {
            target,
            fatal_target,
        }
    }
}

impl Default for LogFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for LogFacade {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Info => log::info!(target: self.target, "{message}"),
            Level::Warning => log::warn!(target: self.target, "{message}"),
            Level::Error => log::error!(target: self.target, "{message}"),
            Level::Fatal => log::error!(target: self.fatal_target, "{message}"),
        }
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Level, _message: &str) {}
}

/// Keeps every message in memory, in order.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|(_, m)| m.clone()).collect()
    }

    /// Messages logged at exactly `level`.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn last(&self) -> Option<(Level, String)> {
        self.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(Level, String)>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, message: &str) {
        self.lock().push((level, message.to_string()));
    }
}
