//! Callable adapter: run a closure inside a fresh guard activation per call.

use crate::config::GuardConfig;
use crate::guard::{Guard, GuardReport};
use catchguard_domain::CounterRegistry;
use catchguard_types::Condition;
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

/// A closure bound to a guard configuration.
///
/// Every call gets its own [`Guard`]; the report of the most recent one is kept and
/// available through [`Guarded::last_guard`].
pub struct Guarded<F> {
    f: F,
    name: Option<Cow<'static, str>>,
    config: Arc<GuardConfig>,
    registry: Arc<CounterRegistry>,
    last: Mutex<Option<GuardReport>>,
}

impl<F> Guarded<F> {
    pub fn new(config: impl Into<Arc<GuardConfig>>, f: F) -> Self {
        Self::with_registry(config, CounterRegistry::global(), f)
    }

    pub fn with_registry(
        config: impl Into<Arc<GuardConfig>>,
        registry: Arc<CounterRegistry>,
        f: F,
    ) -> Self {
        Self {
            f,
            name: None,
            config: config.into(),
            registry,
            last: Mutex::new(None),
        }
    }

    /// Override the name reported by [`Guarded::name`].
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The wrapped function's name: the one given to [`Guarded::named`], else its type name.
    ///
    /// The type name of a closure is its defining path with a `{{closure}}` suffix, so
    /// closures need [`Guarded::named`] to get a readable name.
    pub fn name(&self) -> &str {
        match &self.name {
            Some(name) => name.as_ref(),
            None => std::any::type_name::<F>(),
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Report of the guard used by the most recent call, `None` before the first call.
    pub fn last_guard(&self) -> Option<GuardReport> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Call the wrapped function with no arguments.
    pub fn call<T>(&self) -> Result<Option<T>, Condition>
    where
        F: Fn() -> Result<T, Condition>,
    {
        self.guarded(|| (self.f)())
    }

    /// Call the wrapped function with `args` (use a tuple for several).
    pub fn call_with<A, T>(&self, args: A) -> Result<Option<T>, Condition>
    where
        F: Fn(A) -> Result<T, Condition>,
    {
        self.guarded(move || (self.f)(args))
    }

    fn guarded<T>(
        &self,
        body: impl FnOnce() -> Result<T, Condition>,
    ) -> Result<Option<T>, Condition> {
        let mut guard = Guard::with_registry(Arc::clone(&self.config), Arc::clone(&self.registry));
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| guard.run(body)));
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(guard.report());
        match outcome {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

impl<F> std::fmt::Debug for Guarded<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guarded")
            .field("name", &self.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Wrap `f` so that every call runs inside its own guard activation.
pub fn wrap<F>(config: impl Into<Arc<GuardConfig>>, f: F) -> Guarded<F> {
    Guarded::new(config, f)
}
