//! Exit policy: turn "errors were seen" into a process-exit signal.
//!
//! The payload is supplied by the operator and carries its own exit code; nothing here
//! derives a code from the captured condition.

use crate::policy::ExitPolicy;
use catchguard_types::Condition;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExitInputs {
    /// Registry error count after this activation merged its counts.
    pub global_errors: u64,
    /// Errors counted by this activation alone.
    pub local_errors: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExitDecision {
    /// Message to log before anything is raised.
    pub exit_message: Option<String>,
    /// Payload that replaces whatever condition is in flight.
    pub raise: Option<Condition>,
}

impl ExitDecision {
    pub fn is_noop(&self) -> bool {
        self.exit_message.is_none() && self.raise.is_none()
    }
}

pub fn decide_exit(inputs: ExitInputs, policy: &ExitPolicy) -> ExitDecision {
    if inputs.global_errors == 0 {
        return ExitDecision::default();
    }

    let raise = policy.on_errors_raise.clone();
    let exit_message = if raise.is_some() || inputs.local_errors > 0 {
        policy.exit_message.clone()
    } else {
        None
    };

    ExitDecision {
        exit_message,
        raise,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(payload: Option<Condition>, msg: Option<&str>) -> ExitPolicy {
        ExitPolicy {
            on_errors_raise: payload,
            exit_message: msg.map(str::to_string),
        }
    }

    #[test]
    fn nothing_happens_without_errors() {
        let p = policy(Some(Condition::system_exit(-1)), Some("bye"));
        let d = decide_exit(
            ExitInputs {
                global_errors: 0,
                local_errors: 0,
            },
            &p,
        );
        assert!(d.is_noop());
    }

    #[test]
    fn payload_raised_when_any_error_was_seen_globally() {
        let payload = Condition::system_exit(-3);
        let p = policy(Some(payload.clone()), Some("bye"));
        let d = decide_exit(
            ExitInputs {
                global_errors: 2,
                local_errors: 0,
            },
            &p,
        );
        assert_eq!(d.raise, Some(payload));
        assert_eq!(d.exit_message.as_deref(), Some("bye"));
    }

    #[test]
    fn exit_message_without_payload_needs_a_local_error() {
        let p = policy(None, Some("bye"));
        let quiet = decide_exit(
            ExitInputs {
                global_errors: 1,
                local_errors: 0,
            },
            &p,
        );
        assert!(quiet.is_noop());

        let loud = decide_exit(
            ExitInputs {
                global_errors: 1,
                local_errors: 1,
            },
            &p,
        );
        assert_eq!(loud.exit_message.as_deref(), Some("bye"));
        assert_eq!(loud.raise, None);
    }
}
