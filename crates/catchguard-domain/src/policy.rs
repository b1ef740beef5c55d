use catchguard_types::{Condition, ids};
use std::collections::BTreeSet;

/// Inputs to the classifier that come from guard configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifyPolicy {
    pub reraise_error: bool,
    pub reraise_warning: bool,
    /// Kind ids or sub-kind names that always pass through untouched.
    pub reraise_types: BTreeSet<String>,
}

impl Default for ClassifyPolicy {
    fn default() -> Self {
        Self {
            reraise_error: false,
            reraise_warning: false,
            reraise_types: default_passthrough(),
        }
    }
}

impl ClassifyPolicy {
    pub fn passes_through(&self, condition: &Condition) -> bool {
        self.reraise_types.contains(condition.kind().id())
            || condition
                .name()
                .is_some_and(|name| self.reraise_types.contains(name))
    }
}

pub fn default_passthrough() -> BTreeSet<String> {
    ids::DEFAULT_PASSTHROUGH
        .iter()
        .map(|id| id.to_string())
        .collect()
}

/// What a guard does when errors have been seen by the time it deactivates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExitPolicy {
    /// Raised when the global error count is non-zero.
    pub on_errors_raise: Option<Condition>,
    /// Logged before the payload is raised, or when this activation counted an error.
    pub exit_message: Option<String>,
}

/// The data-only part of a guard's configuration.
///
/// Callbacks and the logger are not here; they live on `catchguard::GuardConfig`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardPolicy {
    pub profile: String,
    pub classify: ClassifyPolicy,
    pub exit: ExitPolicy,
    pub enter_message: Option<String>,
    pub report_counts: bool,
    pub show_type: bool,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            profile: "default".to_string(),
            classify: ClassifyPolicy::default(),
            exit: ExitPolicy::default(),
            enter_message: None,
            report_counts: false,
            show_type: false,
        }
    }
}
