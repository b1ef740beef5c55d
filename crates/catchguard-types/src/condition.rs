//! The value a guard captures.
//!
//! A `Condition` is a shared handle: cloning it is cheap and every clone refers to the
//! same underlying value. Equality is identity, so "the guard saw the condition I raised"
//! and "the caller received the identical object" are both plain `==` checks.

use crate::ids;
use serde::{Deserialize, Serialize};
use std::panic::Location;
use std::sync::Arc;

/// Closed set of condition kinds a guard knows how to classify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// Interactive interrupt (Ctrl-C).
    Interrupt,
    /// "Abort this scope", raised by the hosting CLI framework.
    Abort,
    /// Library-level exit signal carrying an exit code.
    Exit,
    /// OS-level process exit carrying an exit code.
    SystemExit,
    /// Iteration exhaustion.
    StopIteration,
    /// Generic runtime fault, e.g. a captured panic.
    RuntimeFault,
    Warning,
    Error,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 8] = [
        ConditionKind::Interrupt,
        ConditionKind::Abort,
        ConditionKind::Exit,
        ConditionKind::SystemExit,
        ConditionKind::StopIteration,
        ConditionKind::RuntimeFault,
        ConditionKind::Warning,
        ConditionKind::Error,
    ];

    /// Stable id, see [`crate::ids`].
    pub fn id(&self) -> &'static str {
        match self {
            ConditionKind::Interrupt => ids::KIND_INTERRUPT,
            ConditionKind::Abort => ids::KIND_ABORT,
            ConditionKind::Exit => ids::KIND_EXIT,
            ConditionKind::SystemExit => ids::KIND_SYSTEM_EXIT,
            ConditionKind::StopIteration => ids::KIND_STOP_ITERATION,
            ConditionKind::RuntimeFault => ids::KIND_RUNTIME_FAULT,
            ConditionKind::Warning => ids::KIND_WARNING,
            ConditionKind::Error => ids::KIND_ERROR,
        }
    }

    pub fn from_id(id: &str) -> Option<ConditionKind> {
        ConditionKind::ALL.into_iter().find(|k| k.id() == id)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, ConditionKind::Warning)
    }

    /// Exit and SystemExit terminate the process when they reach the top.
    pub fn is_exit_signal(&self) -> bool {
        matches!(self, ConditionKind::Exit | ConditionKind::SystemExit)
    }
}

impl std::fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Clone)]
struct Inner {
    kind: ConditionKind,
    message: String,
    name: Option<String>,
    exit_code: Option<i32>,
    source: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
    location: &'static Location<'static>,
}

/// A caught error, warning, or control signal.
#[derive(Clone)]
pub struct Condition {
    inner: Arc<Inner>,
}

impl Condition {
    #[track_caller]
    pub fn new(kind: ConditionKind, message: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                kind,
                message: message.into(),
                name: None,
                exit_code: None,
                source: None,
                location: Location::caller(),
            }),
        }
    }

    #[track_caller]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ConditionKind::Error, message)
    }

    #[track_caller]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(ConditionKind::Warning, message)
    }

    #[track_caller]
    pub fn interrupt() -> Self {
        Self::new(ConditionKind::Interrupt, "")
    }

    #[track_caller]
    pub fn abort(message: impl Into<String>) -> Self {
        Self::new(ConditionKind::Abort, message)
    }

    /// Library-level exit signal.
    #[track_caller]
    pub fn exit(code: i32) -> Self {
        Self::new(ConditionKind::Exit, "").with_exit_code(code)
    }

    /// OS-level process exit.
    #[track_caller]
    pub fn system_exit(code: i32) -> Self {
        Self::new(ConditionKind::SystemExit, "").with_exit_code(code)
    }

    #[track_caller]
    pub fn stop_iteration() -> Self {
        Self::new(ConditionKind::StopIteration, "")
    }

    #[track_caller]
    pub fn runtime_fault(message: impl Into<String>) -> Self {
        Self::new(ConditionKind::RuntimeFault, message)
    }

    /// Wrap any error as an error-kind condition named after its type.
    #[track_caller]
    pub fn from_error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let location = Location::caller();
        Self {
            inner: Arc::new(Inner {
                kind: ConditionKind::Error,
                message: err.to_string(),
                name: Some(short_type_name::<E>().to_string()),
                exit_code: None,
                source: Some(Arc::new(err)),
                location,
            }),
        }
    }

    /// Attach a sub-kind name (e.g. `"ValueError"`). `reraise_types` can select on it.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).name = Some(name.into());
        self
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        Arc::make_mut(&mut self.inner).exit_code = Some(code);
        self
    }

    pub fn kind(&self) -> ConditionKind {
        self.inner.kind
    }

    pub fn message(&self) -> &str {
        &self.inner.message
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// The sub-kind name if one was attached, otherwise the kind id.
    pub fn kind_name(&self) -> &str {
        self.inner.name.as_deref().unwrap_or(self.inner.kind.id())
    }

    /// True if `id` is this condition's kind id or its sub-kind name.
    pub fn matches_kind(&self, id: &str) -> bool {
        self.inner.kind.id() == id || self.inner.name.as_deref() == Some(id)
    }

    pub fn is_warning(&self) -> bool {
        self.inner.kind.is_warning()
    }

    /// Explicit exit code carried by the condition, if any.
    pub fn exit_code(&self) -> Option<i32> {
        self.inner.exit_code
    }

    /// Explicit exit code, or [`ids::EXIT_CODE_UNSPECIFIED`].
    pub fn exit_code_or_default(&self) -> i32 {
        self.inner.exit_code.unwrap_or(ids::EXIT_CODE_UNSPECIFIED)
    }

    /// Where the condition was constructed.
    pub fn location(&self) -> &'static Location<'static> {
        self.inner.location
    }

    /// True if both handles refer to the same condition.
    pub fn ptr_eq(&self, other: &Condition) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    // Strip generic arguments before taking the last path segment.
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Condition {}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.inner.message.is_empty() {
            return f.write_str(&self.inner.message);
        }
        match self.inner.exit_code {
            Some(code) => write!(f, "{}", code),
            None => f.write_str(self.kind_name()),
        }
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condition")
            .field("kind", &self.inner.kind)
            .field("name", &self.inner.name)
            .field("message", &self.inner.message)
            .field("exit_code", &self.inner.exit_code)
            .field(
                "location",
                &format_args!("{}:{}", self.inner.location.file(), self.inner.location.line()),
            )
            .finish()
    }
}

impl std::error::Error for Condition {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner
            .source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
