//! CLI entry point for catchguard.
//!
//! Thin on purpose: argument parsing, config loading, and exit codes. Guard behavior lives
//! in the `catchguard` crate and config resolution in `catchguard-settings`.

mod run;
mod stderr_logger;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use catchguard::{CounterRegistry, ExitPolicy, GuardConfig, GuardPolicy};
use catchguard_settings::Overrides;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use run::{RunGuards, Step, StepKind};
use stderr_logger::StderrLogger;
use std::sync::Arc;

const DEFAULT_CONFIG: &str = "catchguard.toml";

#[derive(Parser, Debug)]
#[command(
    name = "catchguard",
    version,
    about = "Run steps under error guards; keep going on errors, exit non-zero at the end"
)]
struct Cli {
    /// Path to catchguard config TOML (default: ./catchguard.toml if present).
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Override profile (default|strict|script).
    #[arg(long)]
    profile: Option<String>,

    /// Only log errors.
    #[arg(long, short)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run shell commands, each inside its own guard.
    Run {
        /// Command whose failure counts as an error (repeatable).
        #[arg(long)]
        step: Vec<String>,

        /// Command whose failure counts as a warning (repeatable).
        #[arg(long)]
        warn_step: Vec<String>,

        /// Exit with this code when any step failed with an error.
        #[arg(long, allow_hyphen_values = true)]
        exit_code: Option<i32>,

        /// Log per-guard and total error counts.
        #[arg(long)]
        report_counts: bool,

        /// Message logged before exiting because of errors.
        #[arg(long)]
        exit_message: Option<String>,

        /// Stop at the first failing step and exit with its code.
        #[arg(long)]
        reraise: bool,

        /// Print a JSON run summary to stdout.
        #[arg(long)]
        json: bool,
    },

    /// Print the JSON schema of catchguard.toml.
    Schema,
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    let result = match &cli.cmd {
        Commands::Run { .. } => {
            let steps = matches
                .subcommand_matches("run")
                .map(ordered_steps)
                .unwrap_or_default();
            cmd_run(&cli, steps)
        }
        Commands::Schema => cmd_schema(),
    };

    if let Err(err) = result {
        eprintln!("catchguard error: {err:#}");
        std::process::exit(1);
    }
}

fn cmd_run(cli: &Cli, steps: Vec<Step>) -> anyhow::Result<()> {
    let Commands::Run {
        ref step,
        ref warn_step,
        exit_code,
        report_counts,
        ref exit_message,
        reraise,
        json,
    } = cli.cmd
    else {
        anyhow::bail!("internal error: cmd_run called for another subcommand");
    };
    debug_assert_eq!(steps.len(), step.len() + warn_step.len());

    let overrides = Overrides {
        profile: cli.profile.clone(),
        report_counts: report_counts.then_some(true),
        reraise: reraise.then_some(true),
        exit_message: exit_message.clone(),
        on_errors_exit_code: exit_code,
    };
    let policy = load_policy(cli.config.as_deref(), overrides)?;

    let logger = Arc::new(StderrLogger::new(cli.quiet));
    let step_policy = GuardPolicy {
        exit: ExitPolicy::default(),
        enter_message: None,
        report_counts: false,
        ..policy.clone()
    };
    let guards = RunGuards {
        outer: GuardConfig::from_policy(policy).logger(logger.clone()).build(),
        step: Arc::new(GuardConfig::from_policy(step_policy).logger(logger).build()),
        registry: CounterRegistry::global(),
    };

    let outcome = run::run_steps(&steps, guards);

    if json {
        let text = serde_json::to_string_pretty(&outcome.summary).context("serialize summary")?;
        println!("{text}");
    }

    if let Some(raised) = outcome.raised {
        catchguard::exit_process(&raised);
    }
    Ok(())
}

fn cmd_schema() -> anyhow::Result<()> {
    print!("{}", catchguard_settings::config_schema_json()?);
    Ok(())
}

/// Resolve the guard policy from the config file (if any) and command-line overrides.
fn load_policy(path: Option<&Utf8Path>, overrides: Overrides) -> anyhow::Result<GuardPolicy> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read config: {path}"))?,
        // Missing default config is allowed (defaults apply).
        None => std::fs::read_to_string(DEFAULT_CONFIG).unwrap_or_default(),
    };

    let cfg = if text.trim().is_empty() {
        catchguard_settings::CatchguardConfigV1::default()
    } else {
        catchguard_settings::parse_config_toml(&text).context("parse config")?
    };
    let resolved = catchguard_settings::resolve_config(cfg, overrides).context("resolve config")?;
    Ok(resolved.policy)
}

/// `--step` and `--warn-step` values, in command-line order.
fn ordered_steps(matches: &ArgMatches) -> Vec<Step> {
    let mut indexed = Vec::new();
    for (id, kind) in [("step", StepKind::Step), ("warn_step", StepKind::WarnStep)] {
        let (Some(values), Some(indices)) =
            (matches.get_many::<String>(id), matches.indices_of(id))
        else {
            continue;
        };
        indexed.extend(
            indices
                .zip(values)
                .map(|(index, command)| (index, Step::new(kind, command.as_str()))),
        );
    }
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, step)| step).collect()
}
