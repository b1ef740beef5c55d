//! Config parsing and profile/preset resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod presets;
mod resolve;

pub use model::CatchguardConfigV1;
pub use presets::{PROFILES, preset};
pub use resolve::{Overrides, ResolvedConfig};

/// Schema identifier accepted in the optional `schema` key.
pub const SCHEMA_CONFIG_V1: &str = "catchguard.config.v1";

/// Parse `catchguard.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<CatchguardConfigV1> {
    let cfg: CatchguardConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective guard policy (profile + file config + overrides).
pub fn resolve_config(
    cfg: CatchguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}

/// JSON schema for `catchguard.toml`.
pub fn config_schema() -> schemars::Schema {
    schemars::schema_for!(CatchguardConfigV1)
}

/// Pretty-printed JSON schema with trailing newline.
pub fn config_schema_json() -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(&config_schema())?;
    json.push('\n');
    Ok(json)
}
