//! Pure guard decision logic (no IO, no logging).
//!
//! Input: a captured condition, the guard's policy, and counter snapshots.
//! Output: a classification, counter updates, and an exit decision.

#![forbid(unsafe_code)]

pub mod counter;
pub mod exit;
pub mod policy;
pub mod report;

mod classify;

#[cfg(test)]
mod proptest;

pub use classify::classify;
pub use counter::{Counter, CounterRegistry};
pub use exit::{ExitDecision, ExitInputs, decide_exit};
pub use policy::{ClassifyPolicy, ExitPolicy, GuardPolicy};
