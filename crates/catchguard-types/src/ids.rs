//! Stable identifiers for condition kinds, plus the fixed messages and exit codes.
//!
//! Kind ids are short snake_case strings. They are what `reraise_types` and
//! `catchguard.toml` refer to.

// Kinds
pub const KIND_INTERRUPT: &str = "interrupt";
pub const KIND_ABORT: &str = "abort";
pub const KIND_EXIT: &str = "exit";
pub const KIND_SYSTEM_EXIT: &str = "system_exit";
pub const KIND_STOP_ITERATION: &str = "stop_iteration";
pub const KIND_RUNTIME_FAULT: &str = "runtime_fault";
pub const KIND_WARNING: &str = "warning";
pub const KIND_ERROR: &str = "error";

/// Kinds that pass through a guard untouched unless the guard is told otherwise.
pub const DEFAULT_PASSTHROUGH: [&str; 6] = [
    KIND_ABORT,
    KIND_EXIT,
    KIND_STOP_ITERATION,
    KIND_RUNTIME_FAULT,
    KIND_SYSTEM_EXIT,
    KIND_INTERRUPT,
];

// Exit codes
pub const EXIT_CODE_UNSPECIFIED: i32 = -1;
pub const INTERRUPT_EXIT_CODE: i32 = -1;
pub const ABORT_EXIT_CODE: i32 = -1;

// Messages
pub const INTERRUPT_MESSAGE: &str = "Keyboard interrupt was received. Aborting ...";
