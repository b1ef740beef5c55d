//! Error/warning tallies.
//!
//! A [`Counter`] is owned by one guard activation. A [`CounterRegistry`] is shared:
//! every guard merges its local counts into one, and increments are serialized so
//! concurrent deactivations never lose an update.

use catchguard_types::Counts;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// Per-activation tally. Not shared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Counter {
    errors: u64,
    warnings: u64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_error(&mut self) {
        self.errors = self.errors.saturating_add(1);
    }

    pub fn record_warning(&mut self) {
        self.warnings = self.warnings.saturating_add(1);
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }

    pub fn warnings(&self) -> u64 {
        self.warnings
    }

    pub fn counts(&self) -> Counts {
        Counts::new(self.errors, self.warnings)
    }

    pub fn merge(&mut self, delta: Counts) {
        self.errors = self.errors.saturating_add(delta.errors);
        self.warnings = self.warnings.saturating_add(delta.warnings);
    }
}

static GLOBAL: OnceLock<Arc<CounterRegistry>> = OnceLock::new();

/// Thread-safe cumulative tally.
///
/// The process-wide instance is created lazily by [`CounterRegistry::global`] and is only
/// ever zeroed by an explicit [`CounterRegistry::reset`]. Isolated registries built with
/// [`CounterRegistry::new`] can be injected into guards instead.
#[derive(Debug, Default)]
pub struct CounterRegistry {
    counter: Mutex<Counter>,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> Arc<CounterRegistry> {
        GLOBAL
            .get_or_init(|| Arc::new(CounterRegistry::new()))
            .clone()
    }

    /// Alias of [`CounterRegistry::global`] for callers that want an explicit init step.
    pub fn init() -> Arc<CounterRegistry> {
        Self::global()
    }

    /// Add `delta` and return the new totals.
    pub fn merge(&self, delta: Counts) -> Counts {
        let mut counter = self.lock();
        counter.merge(delta);
        counter.counts()
    }

    pub fn counts(&self) -> Counts {
        self.lock().counts()
    }

    pub fn errors_count(&self) -> u64 {
        self.lock().errors()
    }

    pub fn warnings_count(&self) -> u64 {
        self.lock().warnings()
    }

    /// Zero the tally and return what it held.
    pub fn reset(&self) -> Counts {
        let mut counter = self.lock();
        let old = counter.counts();
        *counter = Counter::new();
        old
    }

    fn lock(&self) -> MutexGuard<'_, Counter> {
        // A panic while holding the lock cannot leave a half-written pair behind.
        self.counter.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
