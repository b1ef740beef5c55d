//! Stable data types shared across the catchguard workspace.
//!
//! This crate is intentionally boring:
//! - the `Condition` value a guard captures
//! - the closed set of condition kinds and their stable string ids
//! - the classification verdict and count snapshots

#![forbid(unsafe_code)]

pub mod classification;
pub mod condition;
pub mod counts;
pub mod ids;

pub use classification::{Classification, FatalReason};
pub use condition::{Condition, ConditionKind};
pub use counts::Counts;
