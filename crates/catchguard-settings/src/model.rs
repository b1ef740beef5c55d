use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `catchguard.toml` schema v1.
///
/// Every key is optional; anything left out comes from the selected profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CatchguardConfigV1 {
    /// Optional schema string for tooling (`catchguard.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Preset to start from: `default`, `strict`, or `script`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Logged at INFO when a guard activates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enter_message: Option<String>,

    /// Logged at INFO when a guard deactivates after errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_message: Option<String>,

    /// Log local and cumulative error counts at deactivation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_counts: Option<bool>,

    /// Re-raise both errors and warnings unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reraise: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reraise_error: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reraise_warning: Option<bool>,

    /// Extra kind ids or sub-kind names that always pass through untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reraise_types: Vec<String>,

    /// Keep the built-in pass-through kinds (exit, system_exit, stop_iteration, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passthrough_defaults: Option<bool>,

    /// Include kind and source location in logged messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_type: Option<bool>,

    /// Exit code of the signal raised once any error has been seen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_errors_exit_code: Option<i32>,

    /// Which exit signal to raise: `system_exit` (default) or `exit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_errors_exit_kind: Option<String>,
}
