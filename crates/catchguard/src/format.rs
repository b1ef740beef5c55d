use crate::config::GuardConfig;
use catchguard_types::Condition;

/// Render a condition for the log, honoring the configured formatter and show-type flag.
pub fn format_condition(condition: &Condition, config: &GuardConfig) -> String {
    if let Some(formatter) = config.formatter() {
        return formatter(condition);
    }
    if config.policy().show_type {
        detailed(condition)
    } else {
        condition.to_string()
    }
}

/// `<<kind: message (file:line)>>`
pub fn detailed(condition: &Condition) -> String {
    let location = condition.location();
    format!(
        "<<{}: {} ({}:{})>>",
        condition.kind_name(),
        condition,
        location.file(),
        location.line()
    )
}
