//! Scoped error guard.
//!
//! A [`Guard`] wraps a block of code, intercepts the [`Condition`] that ends it, and
//! decides what happens next:
//!
//! - interrupts and aborts become exit signals
//! - pass-through kinds keep propagating untouched
//! - warnings and errors are logged, counted locally and process-wide, and absorbed
//!
//! Once the process-wide error count is non-zero, a guard configured with
//! [`GuardConfigBuilder::on_errors_raise`] raises its payload instead, which is how a
//! script keeps going on errors and still exits non-zero at the end.
//!
//! ```
//! use catchguard::{Condition, Guard, GuardConfig};
//!
//! let mut guard = Guard::new(GuardConfig::builder().discard_logs().build());
//! let out = guard.run(|| Err::<(), _>(Condition::error("disk full")));
//! assert_eq!(out, Ok(None));
//! assert_eq!(guard.errors_count(), 1);
//! ```

#![forbid(unsafe_code)]

mod config;
mod error;
mod format;
mod guard;
pub mod logger;
mod wrap;

pub use catchguard_domain::policy::{ClassifyPolicy, ExitPolicy, GuardPolicy};
pub use catchguard_domain::CounterRegistry;
pub use catchguard_types::{Classification, Condition, ConditionKind, Counts, FatalReason, ids};
pub use config::{Formatter, GuardConfig, GuardConfigBuilder, PostHandler};
pub use error::GuardError;
pub use format::format_condition;
pub use guard::{ActiveScope, Disposition, Guard, GuardReport, GuardState};
pub use logger::{Level, LogFacade, Logger, MemoryLogger, NullLogger};
pub use wrap::{Guarded, wrap};

use std::sync::Arc;

/// Cumulative counts of the process-wide registry.
pub fn global_counts() -> Counts {
    CounterRegistry::global().counts()
}

/// Zero the process-wide registry, returning what it held.
pub fn reset_global_counts() -> Counts {
    CounterRegistry::global().reset()
}

/// Run `f` once inside a fresh guard built from `config`.
pub fn guarded<T>(
    config: impl Into<Arc<GuardConfig>>,
    f: impl FnOnce() -> Result<T, Condition>,
) -> Result<Option<T>, Condition> {
    Guard::new(config).run(f)
}

/// Terminate the process with the code an exit signal carries.
///
/// Conditions without an explicit code exit with [`ids::EXIT_CODE_UNSPECIFIED`].
pub fn exit_process(condition: &Condition) -> ! {
    std::process::exit(condition.exit_code_or_default())
}
