use catchguard_domain::policy::{ClassifyPolicy, ExitPolicy, GuardPolicy};
use catchguard_types::{Condition, ids};

/// Known profile names.
pub const PROFILES: [&str; 3] = ["default", "strict", "script"];

/// Preset profiles are opinionated defaults.
///
/// Keep these small and readable. Anything complex should go into repo config.
pub fn preset(profile: &str) -> GuardPolicy {
    match profile {
        "strict" => strict_profile(),
        "script" => script_profile(),
        // default
        _ => default_profile(),
    }
}

fn default_profile() -> GuardPolicy {
    GuardPolicy::default()
}

fn strict_profile() -> GuardPolicy {
    GuardPolicy {
        profile: "strict".to_string(),
        classify: ClassifyPolicy {
            reraise_error: true,
            reraise_warning: true,
            ..ClassifyPolicy::default()
        },
        ..GuardPolicy::default()
    }
}

fn script_profile() -> GuardPolicy {
    // Keep going on errors, report at the end, exit non-zero if anything failed.
    GuardPolicy {
        profile: "script".to_string(),
        exit: ExitPolicy {
            on_errors_raise: Some(Condition::system_exit(ids::EXIT_CODE_UNSPECIFIED)),
            exit_message: None,
        },
        report_counts: true,
        ..GuardPolicy::default()
    }
}
