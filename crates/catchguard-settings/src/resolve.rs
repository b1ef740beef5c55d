use crate::{SCHEMA_CONFIG_V1, model::CatchguardConfigV1, presets};
use anyhow::Context;
use catchguard_domain::policy::GuardPolicy;
use catchguard_types::{Condition, ConditionKind, ids};

/// Command-line overrides; they win over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub report_counts: Option<bool>,
    pub reraise: Option<bool>,
    pub exit_message: Option<String>,
    pub on_errors_exit_code: Option<i32>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub policy: GuardPolicy,
}

pub fn resolve_config(
    cfg: CatchguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    if let Some(schema) = cfg.schema.as_deref()
        && schema != SCHEMA_CONFIG_V1
    {
        anyhow::bail!("unsupported config schema: {schema} (expected {SCHEMA_CONFIG_V1})");
    }

    let profile = overrides
        .profile
        .clone()
        .or(cfg.profile.clone())
        .unwrap_or_else(|| "default".to_string());

    let mut policy = presets::preset(&profile);

    // Pass-through kinds
    if cfg.passthrough_defaults == Some(false) {
        policy.classify.reraise_types.clear();
    }
    for entry in &cfg.reraise_types {
        validate_kind_selector(entry).context("invalid reraise_types entry")?;
        policy.classify.reraise_types.insert(entry.clone());
    }

    // Re-raise toggles: the blanket flag first, then the selective ones.
    if let Some(reraise) = overrides.reraise.or(cfg.reraise) {
        policy.classify.reraise_error = reraise;
        policy.classify.reraise_warning = reraise;
    }
    if let Some(v) = cfg.reraise_error {
        policy.classify.reraise_error = v;
    }
    if let Some(v) = cfg.reraise_warning {
        policy.classify.reraise_warning = v;
    }

    // Messages and reporting
    if let Some(msg) = cfg.enter_message.clone() {
        policy.enter_message = Some(msg);
    }
    if let Some(msg) = overrides.exit_message.clone().or(cfg.exit_message.clone()) {
        policy.exit.exit_message = Some(msg);
    }
    if let Some(v) = overrides.report_counts.or(cfg.report_counts) {
        policy.report_counts = v;
    }
    if let Some(v) = cfg.show_type {
        policy.show_type = v;
    }

    // On-errors payload
    let code = overrides.on_errors_exit_code.or(cfg.on_errors_exit_code);
    let kind = cfg
        .on_errors_exit_kind
        .as_deref()
        .map(parse_exit_kind)
        .transpose()?;
    if code.is_some() || kind.is_some() {
        let kind = kind.unwrap_or(ConditionKind::SystemExit);
        let code = code
            .or_else(|| {
                policy
                    .exit
                    .on_errors_raise
                    .as_ref()
                    .and_then(Condition::exit_code)
            })
            .unwrap_or(ids::EXIT_CODE_UNSPECIFIED);
        policy.exit.on_errors_raise = Some(exit_payload(kind, code));
    }

    Ok(ResolvedConfig { policy })
}

fn exit_payload(kind: ConditionKind, code: i32) -> Condition {
    match kind {
        ConditionKind::Exit => Condition::exit(code),
        _ => Condition::system_exit(code),
    }
}

fn validate_kind_selector(v: &str) -> anyhow::Result<()> {
    if v.is_empty() {
        anyhow::bail!("kind selector must not be empty");
    }
    if v.chars().any(char::is_whitespace) {
        anyhow::bail!("kind selector must not contain whitespace: {v:?}");
    }
    Ok(())
}

fn parse_exit_kind(v: &str) -> anyhow::Result<ConditionKind> {
    match v {
        "system_exit" => Ok(ConditionKind::SystemExit),
        "exit" => Ok(ConditionKind::Exit),
        other => anyhow::bail!("unknown on_errors_exit_kind: {other} (expected system_exit|exit)"),
    }
}
