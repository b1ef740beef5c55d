//! The `run` subcommand: shell steps, each under its own guard, inside one outer guard.

use catchguard::{Condition, CounterRegistry, Counts, Guard, GuardConfig};
use serde::Serialize;
use std::process::Command;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// A failure counts as an error.
    Step,
    /// A failure counts as a warning.
    WarnStep,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub command: String,
}

impl Step {
    pub fn new(kind: StepKind, command: impl Into<String>) -> Self {
        Self {
            kind,
            command: command.into(),
        }
    }

    /// Run the command through `sh -c`; a non-zero exit becomes a condition.
    pub fn execute(&self) -> Result<i32, Condition> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .status()
            .map_err(Condition::from_error)?;

        if status.success() {
            return Ok(0);
        }

        match status.code() {
            Some(code) => Err(self.failure(format!(
                "step exited with code {code}: {}",
                self.command
            ))
            .with_exit_code(code)),
            None => Err(self.terminated(status)),
        }
    }

    #[cfg(unix)]
    fn terminated(&self, status: std::process::ExitStatus) -> Condition {
        use std::os::unix::process::ExitStatusExt;
        const SIGINT: i32 = 2;
        match status.signal() {
            Some(SIGINT) => Condition::interrupt(),
            Some(signal) => self.failure(format!(
                "step terminated by signal {signal}: {}",
                self.command
            )),
            None => self.failure(format!("step terminated: {}", self.command)),
        }
    }

    #[cfg(not(unix))]
    fn terminated(&self, _status: std::process::ExitStatus) -> Condition {
        self.failure(format!("step terminated: {}", self.command))
    }

    fn failure(&self, message: String) -> Condition {
        match self.kind {
            StepKind::Step => Condition::error(message).with_name("StepFailed"),
            StepKind::WarnStep => Condition::warning(message).with_name("StepWarning"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub command: String,
    pub kind: StepKind,
    /// `ok`, or the classification the step's guard gave its failure.
    pub outcome: String,
    pub exit_code: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub steps: Vec<StepRecord>,
    pub counts: Counts,
    pub exit_code: i32,
}

/// How a run ended.
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    /// The condition that escaped the outer guard, if any.
    pub raised: Option<Condition>,
}

/// Guard configurations for one run.
pub struct RunGuards {
    pub outer: GuardConfig,
    pub step: Arc<GuardConfig>,
    pub registry: Arc<CounterRegistry>,
}

pub fn run_steps(steps: &[Step], guards: RunGuards) -> RunOutcome {
    let RunGuards {
        outer,
        step,
        registry,
    } = guards;

    let mut records = Vec::with_capacity(steps.len());
    let mut outer = Guard::with_registry(outer, Arc::clone(&registry));

    let result = outer.run(|| {
        for s in steps {
            let mut guard = Guard::with_registry(Arc::clone(&step), Arc::clone(&registry));
            let result = guard.run(|| s.execute());
            let exit_code = match &result {
                Ok(Some(code)) => Some(*code),
                _ => guard.condition().and_then(Condition::exit_code),
            };
            records.push(StepRecord {
                command: s.command.clone(),
                kind: s.kind,
                outcome: guard
                    .classification()
                    .map_or("ok", |c| c.as_str())
                    .to_string(),
                exit_code,
            });
            result?;
        }
        Ok(())
    });

    let raised = result.err();
    let exit_code = raised.as_ref().map_or(0, Condition::exit_code_or_default);

    RunOutcome {
        summary: RunSummary {
            steps: records,
            counts: registry.counts(),
            exit_code,
        },
        raised,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use catchguard::ConditionKind;

    fn guards(outer: GuardConfig) -> RunGuards {
        RunGuards {
            outer,
            step: Arc::new(GuardConfig::builder().discard_logs().build()),
            registry: Arc::new(CounterRegistry::new()),
        }
    }

    fn quiet() -> catchguard::GuardConfigBuilder {
        GuardConfig::builder().discard_logs()
    }

    #[test]
    fn failing_step_carries_its_exit_code() {
        let err = Step::new(StepKind::Step, "exit 3")
            .execute()
            .expect_err("non-zero exit");
        assert_eq!(err.kind(), ConditionKind::Error);
        assert_eq!(err.name(), Some("StepFailed"));
        assert_eq!(err.exit_code(), Some(3));

        let warn = Step::new(StepKind::WarnStep, "exit 4")
            .execute()
            .expect_err("non-zero exit");
        assert!(warn.is_warning());
    }

    #[test]
    fn keeps_going_and_raises_the_payload_at_the_end() {
        let steps = [
            Step::new(StepKind::Step, "exit 1"),
            Step::new(StepKind::WarnStep, "exit 2"),
            Step::new(StepKind::Step, "true"),
        ];
        let outcome = run_steps(
            &steps,
            guards(quiet().on_errors_raise(Condition::system_exit(-1)).build()),
        );

        assert_eq!(outcome.summary.counts, Counts::new(1, 1));
        assert_eq!(outcome.summary.exit_code, -1);
        let outcomes: Vec<_> = outcome
            .summary
            .steps
            .iter()
            .map(|r| r.outcome.as_str())
            .collect();
        assert_eq!(outcomes, vec!["error", "warning", "ok"]);
        assert_eq!(outcome.summary.steps[0].exit_code, Some(1));
        assert_eq!(outcome.summary.steps[2].exit_code, Some(0));
        assert!(outcome.raised.is_some());
    }

    #[test]
    fn clean_run_exits_zero() {
        let steps = [Step::new(StepKind::Step, "true")];
        let outcome = run_steps(
            &steps,
            guards(quiet().on_errors_raise(Condition::system_exit(-1)).build()),
        );
        assert_eq!(outcome.summary.exit_code, 0);
        assert!(outcome.raised.is_none());
    }

    #[test]
    fn reraise_stops_at_the_first_failure_with_the_child_code() {
        let steps = [
            Step::new(StepKind::Step, "exit 5"),
            Step::new(StepKind::Step, "true"),
        ];
        let mut g = guards(quiet().reraise(true).build());
        g.step = Arc::new(quiet().reraise(true).build());

        let outcome = run_steps(&steps, g);
        assert_eq!(outcome.summary.steps.len(), 1);
        assert_eq!(outcome.summary.steps[0].outcome, "transparent");
        assert_eq!(outcome.summary.exit_code, 5);
        assert_eq!(outcome.summary.counts, Counts::ZERO);
    }
}
