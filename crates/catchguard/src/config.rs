//! Guard configuration.
//!
//! [`GuardConfig`] is immutable once built and is shared between guard activations via `Arc`.
//! The data-only part is a [`GuardPolicy`]; callbacks and the logger sit next to it.

use crate::logger::{LogFacade, Logger, NullLogger};
use catchguard_domain::policy::GuardPolicy;
use catchguard_types::Condition;
use std::sync::Arc;

/// Invoked with the raw condition after an error or warning has been counted.
///
/// Returning `Err` replaces the in-flight condition; exit policy and count reporting still run.
pub type PostHandler = Arc<dyn Fn(&Condition) -> Result<(), Condition> + Send + Sync>;

/// Overrides the default rendering of logged conditions.
pub type Formatter = Arc<dyn Fn(&Condition) -> String + Send + Sync>;

#[derive(Clone)]
pub struct GuardConfig {
    policy: GuardPolicy,
    post_handler: Option<PostHandler>,
    formatter: Option<Formatter>,
    logger: Arc<dyn Logger>,
}

impl GuardConfig {
    pub fn builder() -> GuardConfigBuilder {
        GuardConfigBuilder::new(GuardPolicy::default())
    }

    /// Start from a resolved policy (e.g. from `catchguard.toml`).
    pub fn from_policy(policy: GuardPolicy) -> GuardConfigBuilder {
        GuardConfigBuilder::new(policy)
    }

    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    pub fn post_handler(&self) -> Option<&PostHandler> {
        self.post_handler.as_ref()
    }

    pub fn formatter(&self) -> Option<&Formatter> {
        self.formatter.as_ref()
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        GuardConfig::builder().build()
    }
}

impl std::fmt::Debug for GuardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardConfig")
            .field("policy", &self.policy)
            .field("post_handler", &self.post_handler.is_some())
            .field("formatter", &self.formatter.is_some())
            .finish_non_exhaustive()
    }
}

#[must_use]
pub struct GuardConfigBuilder {
    policy: GuardPolicy,
    post_handler: Option<PostHandler>,
    formatter: Option<Formatter>,
    logger: Arc<dyn Logger>,
}

impl GuardConfigBuilder {
    fn new(policy: GuardPolicy) -> Self {
        Self {
            policy,
            post_handler: None,
            formatter: None,
            logger: Arc::new(LogFacade::default()),
        }
    }

    /// Side-effect-only handler, called after counting.
    pub fn post_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Condition) + Send + Sync + 'static,
    {
        self.post_handler = Some(Arc::new(move |c: &Condition| {
            handler(c);
            Ok(())
        }));
        self
    }

    /// Handler that may itself fail with a new condition.
    pub fn fallible_post_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Condition) -> Result<(), Condition> + Send + Sync + 'static,
    {
        self.post_handler = Some(Arc::new(handler));
        self
    }

    pub fn formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Condition) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Route every message to a discard sink.
    pub fn discard_logs(mut self) -> Self {
        self.logger = Arc::new(NullLogger);
        self
    }

    pub fn enter_message(mut self, message: impl Into<String>) -> Self {
        self.policy.enter_message = Some(message.into());
        self
    }

    pub fn exit_message(mut self, message: impl Into<String>) -> Self {
        self.policy.exit.exit_message = Some(message.into());
        self
    }

    pub fn report_counts(mut self, enabled: bool) -> Self {
        self.policy.report_counts = enabled;
        self
    }

    /// Raised once the global error count is non-zero at deactivation.
    pub fn on_errors_raise(mut self, payload: Condition) -> Self {
        self.policy.exit.on_errors_raise = Some(payload);
        self
    }

    /// Re-raise errors and warnings unchanged.
    pub fn reraise(mut self, enabled: bool) -> Self {
        self.policy.classify.reraise_error = enabled;
        self.policy.classify.reraise_warning = enabled;
        self
    }

    pub fn reraise_error(mut self, enabled: bool) -> Self {
        self.policy.classify.reraise_error = enabled;
        self
    }

    pub fn reraise_warning(mut self, enabled: bool) -> Self {
        self.policy.classify.reraise_warning = enabled;
        self
    }

    /// Add kind ids or sub-kind names to the pass-through set.
    pub fn reraise_types<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy
            .classify
            .reraise_types
            .extend(kinds.into_iter().map(Into::into));
        self
    }

    /// Empty the pass-through set, including the built-in kinds.
    pub fn clear_reraise_types(mut self) -> Self {
        self.policy.classify.reraise_types.clear();
        self
    }

    /// Log kind and source location along with the message.
    pub fn show_type(mut self, enabled: bool) -> Self {
        self.policy.show_type = enabled;
        self
    }

    pub fn build(self) -> GuardConfig {
        GuardConfig {
            policy: self.policy,
            post_handler: self.post_handler,
            formatter: self.formatter,
            logger: self.logger,
        }
    }
}
