use serde::{Deserialize, Serialize};

/// Why a condition was classified as fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalReason {
    Interrupt,
    Abort,
}

/// The verdict for one captured condition.
///
/// Closed on purpose: every caller matches all four arms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Logged once, converted into an exit signal with a fixed code.
    Fatal(FatalReason),
    /// Re-raised unchanged. Never counted, never logged.
    Transparent,
    /// Logged at WARNING and counted.
    Warning,
    /// Logged at ERROR and counted.
    Error,
}

impl Classification {
    pub fn is_counted(&self) -> bool {
        matches!(self, Classification::Warning | Classification::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Fatal(FatalReason::Interrupt) => "fatal_interrupt",
            Classification::Fatal(FatalReason::Abort) => "fatal_abort",
            Classification::Transparent => "transparent",
            Classification::Warning => "warning",
            Classification::Error => "error",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
