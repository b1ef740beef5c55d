use thiserror::Error;

/// Lifecycle misuse of a [`crate::Guard`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("guard is already active; a guard instance cannot be entered twice")]
    AlreadyActive,
    #[error("guard is not active; deactivate called without a matching activate")]
    NotActive,
}
