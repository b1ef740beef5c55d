//! The guard state machine.
//!
//! ```text
//! Created --activate--> Entered --deactivate--> Exited --activate--> Entered ...
//! ```
//!
//! Deactivation is where everything happens: classify the captured condition, log and
//! count it, merge the local counts into the registry, run the post-handler, then apply
//! the exit policy. The count report is emitted by a drop guard so it runs on every path
//! out of deactivation, including a panicking post-handler.

use crate::config::GuardConfig;
use crate::error::GuardError;
use crate::format::format_condition;
use crate::logger::Level;
use catchguard_domain::report::CountReport;
use catchguard_domain::{Counter, CounterRegistry, ExitInputs, classify, decide_exit};
use catchguard_types::{Classification, Condition, ConditionKind, Counts, FatalReason, ids};
use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::LocalKey;

thread_local! {
    // Number of guards currently entered on this thread.
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    // Entered guards with `report_counts` set. The one entered at 1 logs the total.
    static REPORTING: Cell<usize> = const { Cell::new(0) };
}

fn enter(key: &'static LocalKey<Cell<usize>>) -> usize {
    key.with(|d| {
        let depth = d.get() + 1;
        d.set(depth);
        depth
    })
}

fn leave(key: &'static LocalKey<Cell<usize>>) {
    key.with(|d| d.set(d.get().saturating_sub(1)));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardState {
    Created,
    Entered,
    Exited,
}

/// Token returned by [`Guard::activate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveScope {
    depth: usize,
}

impl ActiveScope {
    /// 1 for the outermost guard on this thread.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_outermost(&self) -> bool {
        self.depth == 1
    }
}

/// What the caller must do once a scope has been deactivated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// The scope ends normally.
    Suppressed,
    /// Propagate this condition.
    Raise(Condition),
}

impl Disposition {
    pub fn suppresses(&self) -> bool {
        matches!(self, Disposition::Suppressed)
    }

    pub fn into_result(self) -> Result<(), Condition> {
        match self {
            Disposition::Suppressed => Ok(()),
            Disposition::Raise(c) => Err(c),
        }
    }
}

/// Snapshot of a finished activation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuardReport {
    pub condition: Option<Condition>,
    pub classification: Option<Classification>,
    pub counts: Counts,
}

pub struct Guard {
    config: Arc<GuardConfig>,
    registry: Arc<CounterRegistry>,
    local: Counter,
    condition: Option<Condition>,
    classification: Option<Classification>,
    state: GuardState,
    depth: usize,
    // Position among reporting guards; 0 when `report_counts` is off.
    report_depth: usize,
}

impl Guard {
    /// A guard reporting into the process-wide registry.
    pub fn new(config: impl Into<Arc<GuardConfig>>) -> Self {
        Self::with_registry(config, CounterRegistry::global())
    }

    pub fn with_registry(config: impl Into<Arc<GuardConfig>>, registry: Arc<CounterRegistry>) -> Self {
        Self {
            config: config.into(),
            registry,
            local: Counter::new(),
            condition: None,
            classification: None,
            state: GuardState::Created,
            depth: 0,
            report_depth: 0,
        }
    }

    pub fn activate(&mut self) -> Result<ActiveScope, GuardError> {
        if self.state == GuardState::Entered {
            return Err(GuardError::AlreadyActive);
        }

        self.local = Counter::new();
        self.condition = None;
        self.classification = None;
        self.state = GuardState::Entered;
        self.depth = enter(&DEPTH);
        self.report_depth = if self.config.policy().report_counts {
            enter(&REPORTING)
        } else {
            0
        };

        if let Some(message) = self.config.policy().enter_message.as_deref() {
            self.log(Level::Info, message);
        }

        Ok(ActiveScope { depth: self.depth })
    }

    /// End the scope, optionally with the condition that ended it.
    ///
    /// Only fails on lifecycle misuse. Everything else is expressed through the returned
    /// [`Disposition`].
    pub fn deactivate(&mut self, condition: Option<Condition>) -> Result<Disposition, GuardError> {
        if self.state != GuardState::Entered {
            return Err(GuardError::NotActive);
        }
        self.state = GuardState::Exited;
        self.leave_scopes();

        self.condition = condition.clone();
        // The outermost reporting guard writes the cumulative line, whatever encloses it.
        let outermost = self.report_depth == 1;

        let Some(condition) = condition else {
            let _report = self.count_reporter(outermost);
            return Ok(self.finalize(None));
        };

        let verdict = classify(&condition, &self.config.policy().classify);
        self.classification = Some(verdict);

        let in_flight = match verdict {
            Classification::Fatal(reason) => {
                let _report = self.count_reporter(outermost);
                return Ok(Disposition::Raise(self.fatal(reason, &condition)));
            }
            Classification::Transparent => Some(condition.clone()),
            Classification::Warning => {
                let message = format_condition(&condition, &self.config);
                self.log(Level::Warning, &message);
                self.local.record_warning();
                None
            }
            Classification::Error => {
                let message = format_condition(&condition, &self.config);
                self.log(Level::Error, &message);
                self.local.record_error();
                None
            }
        };

        if verdict.is_counted() {
            self.registry.merge(self.local.counts());
        }

        let _report = self.count_reporter(outermost);

        let mut in_flight = in_flight;
        if verdict.is_counted()
            && let Some(handler) = self.config.post_handler()
        {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&condition))) {
                Ok(Ok(())) => {}
                Ok(Err(raised)) => in_flight = Some(raised),
                Err(payload) => {
                    self.log(
                        Level::Error,
                        &format!("post-handler panicked: {}", panic_message(payload.as_ref())),
                    );
                    // Exit policy still runs; the panic continues unless a payload replaces it.
                    return match self.finalize(None) {
                        Disposition::Raise(c) => Ok(Disposition::Raise(c)),
                        Disposition::Suppressed => panic::resume_unwind(payload),
                    };
                }
            }
        }

        Ok(self.finalize(in_flight))
    }

    /// Run `f` inside one activation of this guard.
    ///
    /// - `Ok(Some(v))`: `f` returned normally
    /// - `Ok(None)`: `f` failed and the guard absorbed the condition
    /// - `Err(c)`: `c` must keep propagating
    ///
    /// A panic in `f` is deactivated as a runtime fault. If the guard lets it through
    /// unchanged, unwinding resumes with the original payload.
    pub fn run<T, F>(&mut self, f: F) -> Result<Option<T>, Condition>
    where
        F: FnOnce() -> Result<T, Condition>,
    {
        self.activate().map_err(Condition::from_error)?;

        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => match self.deactivate(None).map_err(Condition::from_error)? {
                Disposition::Suppressed => Ok(Some(value)),
                Disposition::Raise(c) => Err(c),
            },
            Ok(Err(condition)) => match self
                .deactivate(Some(condition))
                .map_err(Condition::from_error)?
            {
                Disposition::Suppressed => Ok(None),
                Disposition::Raise(c) => Err(c),
            },
            Err(payload) => {
                let fault = Condition::runtime_fault(panic_message(payload.as_ref()));
                match self
                    .deactivate(Some(fault.clone()))
                    .map_err(Condition::from_error)?
                {
                    Disposition::Suppressed => Ok(None),
                    Disposition::Raise(c) if c == fault => panic::resume_unwind(payload),
                    Disposition::Raise(c) => Err(c),
                }
            }
        }
    }

    /// The condition captured by the last deactivation.
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn classification(&self) -> Option<Classification> {
        self.classification
    }

    /// Local `(errors, warnings)` of the current or last activation.
    pub fn counts(&self) -> Counts {
        self.local.counts()
    }

    pub fn errors_count(&self) -> u64 {
        self.local.errors()
    }

    pub fn warnings_count(&self) -> u64 {
        self.local.warnings()
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CounterRegistry> {
        &self.registry
    }

    pub fn report(&self) -> GuardReport {
        GuardReport {
            condition: self.condition.clone(),
            classification: self.classification,
            counts: self.counts(),
        }
    }

    fn fatal(&self, reason: FatalReason, condition: &Condition) -> Condition {
        let (message, code) = match reason {
            FatalReason::Interrupt => (ids::INTERRUPT_MESSAGE.to_string(), ids::INTERRUPT_EXIT_CODE),
            FatalReason::Abort => (condition.to_string(), ids::ABORT_EXIT_CODE),
        };
        self.log(Level::Fatal, &message);
        Condition::new(ConditionKind::Exit, message).with_exit_code(code)
    }

    fn finalize(&self, in_flight: Option<Condition>) -> Disposition {
        let decision = decide_exit(
            ExitInputs {
                global_errors: self.registry.errors_count(),
                local_errors: self.local.errors(),
            },
            &self.config.policy().exit,
        );

        if let Some(message) = decision.exit_message.as_deref() {
            self.log(Level::Warning, message);
        }

        match decision.raise.or(in_flight) {
            Some(c) => Disposition::Raise(c),
            None => Disposition::Suppressed,
        }
    }

    fn count_reporter(&self, outermost: bool) -> Option<CountReporter> {
        self.config.policy().report_counts.then(|| CountReporter {
            config: Arc::clone(&self.config),
            registry: Arc::clone(&self.registry),
            local: self.local.counts(),
            outermost,
        })
    }

    fn leave_scopes(&self) {
        leave(&DEPTH);
        if self.report_depth > 0 {
            leave(&REPORTING);
        }
    }

    fn log(&self, level: Level, message: &str) {
        self.config.logger().log(level, message);
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        // Keep the nesting depths honest if a guard is dropped while still entered.
        if self.state == GuardState::Entered {
            self.leave_scopes();
        }
    }
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard")
            .field("state", &self.state)
            .field("condition", &self.condition)
            .field("classification", &self.classification)
            .field("counts", &self.local.counts())
            .finish_non_exhaustive()
    }
}

/// Logs the count report when dropped.
struct CountReporter {
    config: Arc<GuardConfig>,
    registry: Arc<CounterRegistry>,
    local: Counts,
    outermost: bool,
}

impl Drop for CountReporter {
    fn drop(&mut self) {
        let report = CountReport {
            local: self.local,
            global: self.registry.counts(),
            outermost: self.outermost,
        };
        for line in report.lines() {
            self.config.logger().log(Level::Info, &line);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;

    fn setup() -> (Arc<MemoryLogger>, Arc<CounterRegistry>) {
        (Arc::new(MemoryLogger::new()), Arc::new(CounterRegistry::new()))
    }

    #[test]
    fn lifecycle_misuse_is_reported() {
        let (logger, registry) = setup();
        let cfg = GuardConfig::builder().logger(logger).build();
        let mut guard = Guard::with_registry(cfg, Arc::clone(&registry));

        assert_eq!(guard.deactivate(None), Err(GuardError::NotActive));
        let scope = guard.activate().expect("first activation");
        assert!(scope.is_outermost());
        assert_eq!(guard.activate(), Err(GuardError::AlreadyActive));
        assert_eq!(guard.state(), GuardState::Entered);

        let d = guard
            .deactivate(Some(Condition::error("e")))
            .expect("deactivate");
        assert!(d.suppresses());
        assert_eq!(registry.counts(), Counts::new(1, 0));
        assert_eq!(guard.deactivate(None), Err(GuardError::NotActive));
        assert_eq!(registry.counts(), Counts::new(1, 0));
    }

    #[test]
    fn reactivation_starts_from_a_fresh_local_counter() {
        let (_, registry) = setup();
        let mut guard = Guard::with_registry(
            GuardConfig::builder().discard_logs().build(),
            Arc::clone(&registry),
        );
        guard.activate().expect("activate");
        guard
            .deactivate(Some(Condition::warning("w")))
            .expect("deactivate");
        assert_eq!(guard.counts(), Counts::new(0, 1));

        guard.activate().expect("reactivate");
        assert_eq!(guard.counts(), Counts::ZERO);
        assert!(guard.condition().is_none());
        guard.deactivate(None).expect("deactivate");
        assert_eq!(registry.counts(), Counts::new(0, 1));
    }

    #[test]
    fn nesting_depth_tracks_entered_guards() {
        let (_, registry) = setup();
        let cfg = Arc::new(GuardConfig::builder().discard_logs().build());
        let mut outer = Guard::with_registry(Arc::clone(&cfg), Arc::clone(&registry));
        let mut inner = Guard::with_registry(Arc::clone(&cfg), Arc::clone(&registry));

        assert_eq!(outer.activate().expect("outer").depth(), 1);
        assert_eq!(inner.activate().expect("inner").depth(), 2);
        inner.deactivate(None).expect("inner");
        outer.deactivate(None).expect("outer");

        let mut again = Guard::with_registry(cfg, registry);
        assert!(again.activate().expect("again").is_outermost());
        again.deactivate(None).expect("again");
    }

    #[test]
    fn dropping_an_entered_guard_releases_its_depth() {
        let (_, registry) = setup();
        let cfg = Arc::new(GuardConfig::builder().discard_logs().build());
        {
            let mut leaked = Guard::with_registry(Arc::clone(&cfg), Arc::clone(&registry));
            leaked.activate().expect("activate");
        }
        let mut next = Guard::with_registry(cfg, registry);
        assert!(next.activate().expect("activate").is_outermost());
        next.deactivate(None).expect("deactivate");
    }

    #[test]
    fn reporting_guard_under_an_unflagged_one_logs_the_total() {
        let (logger, registry) = setup();
        let flagged = Arc::new(
            GuardConfig::builder()
                .logger(logger.clone())
                .report_counts(true)
                .build(),
        );
        {
            let mut leaked = Guard::with_registry(Arc::clone(&flagged), Arc::clone(&registry));
            leaked.activate().expect("activate");
        }

        let mut outer = Guard::with_registry(
            GuardConfig::builder().discard_logs().build(),
            Arc::clone(&registry),
        );
        let mut inner = Guard::with_registry(flagged, registry);
        assert!(outer.activate().expect("outer").is_outermost());
        assert_eq!(inner.activate().expect("inner").depth(), 2);
        inner
            .deactivate(Some(Condition::error("e")))
            .expect("inner exit");
        outer.deactivate(None).expect("outer exit");

        assert_eq!(
            logger.messages_at(Level::Info),
            vec![
                "encountered 1 error in the current context.".to_string(),
                "encountered 1 total error.".to_string(),
            ]
        );
    }

    #[test]
    fn enter_message_logged_on_activation() {
        let (logger, registry) = setup();
        let cfg = GuardConfig::builder()
            .logger(logger.clone())
            .enter_message("starting")
            .build();
        let mut guard = Guard::with_registry(cfg, registry);
        guard.run(|| Ok::<_, Condition>(())).expect("run");
        assert_eq!(logger.records(), vec![(Level::Info, "starting".to_string())]);
    }

    #[test]
    fn fatal_skips_counting_and_post_handler() {
        let (logger, registry) = setup();
        let called = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let cfg = GuardConfig::builder()
            .logger(logger.clone())
            .post_handler(move |_| flag.store(true, std::sync::atomic::Ordering::SeqCst))
            .on_errors_raise(Condition::system_exit(7))
            .build();
        registry.merge(Counts::new(1, 0));

        let mut guard = Guard::with_registry(cfg, Arc::clone(&registry));
        let err = guard
            .run(|| Err::<(), _>(Condition::interrupt()))
            .expect_err("interrupt must propagate");

        assert_eq!(err.kind(), ConditionKind::Exit);
        assert_eq!(err.exit_code(), Some(ids::INTERRUPT_EXIT_CODE));
        assert_eq!(guard.classification(), Some(Classification::Fatal(FatalReason::Interrupt)));
        assert_eq!(registry.counts(), Counts::new(1, 0));
        assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(
            logger.last(),
            Some((Level::Fatal, ids::INTERRUPT_MESSAGE.to_string()))
        );
    }

    #[test]
    fn failing_post_handler_still_reaches_exit_policy() {
        let (logger, registry) = setup();
        let payload = Condition::system_exit(-4);
        let cfg = GuardConfig::builder()
            .logger(logger.clone())
            .report_counts(true)
            .fallible_post_handler(|_| Err(Condition::error("handler failed")))
            .on_errors_raise(payload.clone())
            .build();
        let mut guard = Guard::with_registry(cfg, registry);

        let err = guard
            .run(|| Err::<(), _>(Condition::error("boom")))
            .expect_err("payload must propagate");
        assert_eq!(err, payload);
        assert_eq!(
            logger.messages_at(Level::Info),
            vec![
                "encountered 1 error in the current context.".to_string(),
                "encountered 1 total error.".to_string(),
            ]
        );
    }

    #[test]
    fn failing_post_handler_condition_propagates_without_payload() {
        let (_, registry) = setup();
        let replacement = Condition::error("handler failed");
        let returned = replacement.clone();
        let cfg = GuardConfig::builder()
            .discard_logs()
            .fallible_post_handler(move |_| Err(returned.clone()))
            .build();
        let mut guard = Guard::with_registry(cfg, registry);
        let err = guard
            .run(|| Err::<(), _>(Condition::warning("w")))
            .expect_err("handler condition propagates");
        assert_eq!(err, replacement);
    }

    #[test]
    fn panics_pass_through_as_runtime_faults() {
        let (_, registry) = setup();
        let mut guard = Guard::with_registry(
            GuardConfig::builder().discard_logs().build(),
            Arc::clone(&registry),
        );
        let caught = panic::catch_unwind(AssertUnwindSafe(|| {
            guard.run(|| -> Result<(), Condition> { panic!("kaboom") })
        }));
        assert!(caught.is_err());
        assert_eq!(guard.state(), GuardState::Exited);
        let captured = guard.condition().expect("fault recorded");
        assert_eq!(captured.kind(), ConditionKind::RuntimeFault);
        assert_eq!(captured.message(), "kaboom");
        assert_eq!(registry.counts(), Counts::ZERO);
    }

    #[test]
    fn panics_are_counted_when_runtime_faults_are_not_passed_through() {
        let (_, registry) = setup();
        let mut guard = Guard::with_registry(
            GuardConfig::builder().discard_logs().clear_reraise_types().build(),
            Arc::clone(&registry),
        );
        let out = guard.run(|| -> Result<(), Condition> { panic!("absorbed") });
        assert_eq!(out, Ok(None));
        assert_eq!(registry.counts(), Counts::new(1, 0));
    }

    #[test]
    fn report_snapshot_matches_accessors() {
        let (_, registry) = setup();
        let mut guard = Guard::with_registry(
            GuardConfig::builder().discard_logs().build(),
            registry,
        );
        let raised = Condition::warning("w");
        let r = raised.clone();
        guard.run(move || Err::<(), _>(r)).expect("absorbed");
        let report = guard.report();
        assert_eq!(report.condition, Some(raised));
        assert_eq!(report.classification, Some(Classification::Warning));
        assert_eq!(report.counts, Counts::new(0, 1));
        assert_eq!((guard.errors_count(), guard.warnings_count()), (0, 1));
    }
}
