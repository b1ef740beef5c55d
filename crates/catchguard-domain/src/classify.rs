use crate::policy::ClassifyPolicy;
use catchguard_types::{Classification, Condition, ConditionKind, FatalReason};

/// Classify a captured condition.
///
/// First match wins:
/// 1) interrupt -> fatal
/// 2) abort -> fatal
/// 3) kind or sub-kind in `reraise_types` -> transparent
/// 4) blanket re-raise for its family -> transparent
/// 5) warning family -> warning
/// 6) anything else -> error
pub fn classify(condition: &Condition, policy: &ClassifyPolicy) -> Classification {
    match condition.kind() {
        ConditionKind::Interrupt => return Classification::Fatal(FatalReason::Interrupt),
        ConditionKind::Abort => return Classification::Fatal(FatalReason::Abort),
        _ => {}
    }

    if policy.passes_through(condition) {
        return Classification::Transparent;
    }

    let is_warning = condition.is_warning();
    if (policy.reraise_error && !is_warning) || (policy.reraise_warning && is_warning) {
        return Classification::Transparent;
    }

    if is_warning {
        Classification::Warning
    } else {
        Classification::Error
    }
}
