//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Registry additivity across arbitrary merge sequences
//! - Classifier precedence (fatal first, transparent never counted)
//! - Exit decisions only firing once an error has been seen

use crate::classify::classify;
use crate::counter::{Counter, CounterRegistry};
use crate::exit::{ExitInputs, decide_exit};
use crate::policy::{ClassifyPolicy, ExitPolicy};
use catchguard_types::{Classification, Condition, ConditionKind, Counts, FatalReason};
use proptest::prelude::*;
use std::collections::BTreeSet;

// ============================================================================
// Strategies
// ============================================================================

fn arb_kind() -> impl Strategy<Value = ConditionKind> {
    prop::sample::select(ConditionKind::ALL.to_vec())
}

fn arb_condition() -> impl Strategy<Value = Condition> {
    (
        arb_kind(),
        prop::option::of(prop::sample::select(vec!["ValueError", "KeyError", "Deprecation"])),
    )
        .prop_map(|(kind, name)| {
            let c = Condition::new(kind, "generated");
            match name {
                Some(n) => c.with_name(n),
                None => c,
            }
        })
}

fn arb_classify_policy() -> impl Strategy<Value = ClassifyPolicy> {
    let ids: Vec<String> = ConditionKind::ALL
        .iter()
        .map(|k| k.id().to_string())
        .chain(["ValueError".to_string(), "KeyError".to_string()])
        .collect();
    (
        any::<bool>(),
        any::<bool>(),
        prop::sample::subsequence(ids.clone(), 0..=ids.len()),
    )
        .prop_map(|(reraise_error, reraise_warning, types)| ClassifyPolicy {
            reraise_error,
            reraise_warning,
            reraise_types: types.into_iter().collect::<BTreeSet<_>>(),
        })
}

fn arb_counts() -> impl Strategy<Value = Counts> {
    (0u64..1000, 0u64..1000).prop_map(|(e, w)| Counts::new(e, w))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn registry_total_is_sum_of_merges(deltas in prop::collection::vec(arb_counts(), 0..50)) {
        let reg = CounterRegistry::new();
        let mut expected = Counts::ZERO;
        for d in &deltas {
            let total = reg.merge(*d);
            expected += *d;
            prop_assert_eq!(total, expected);
        }
        prop_assert_eq!(reg.counts(), expected);
    }

    #[test]
    fn registry_is_monotonic_between_resets(deltas in prop::collection::vec(arb_counts(), 1..30)) {
        let reg = CounterRegistry::new();
        let mut prev = Counts::ZERO;
        for d in deltas {
            let now = reg.merge(d);
            prop_assert!(now.errors >= prev.errors);
            prop_assert!(now.warnings >= prev.warnings);
            prev = now;
        }
    }

    #[test]
    fn local_counter_matches_records(errors in 0u64..200, warnings in 0u64..200) {
        let mut c = Counter::new();
        for _ in 0..errors { c.record_error(); }
        for _ in 0..warnings { c.record_warning(); }
        prop_assert_eq!(c.counts(), Counts::new(errors, warnings));
    }

    #[test]
    fn interrupt_and_abort_are_always_fatal(policy in arb_classify_policy()) {
        prop_assert_eq!(
            classify(&Condition::interrupt(), &policy),
            Classification::Fatal(FatalReason::Interrupt)
        );
        prop_assert_eq!(
            classify(&Condition::abort("a"), &policy),
            Classification::Fatal(FatalReason::Abort)
        );
    }

    #[test]
    fn listed_kinds_are_never_counted(condition in arb_condition(), policy in arb_classify_policy()) {
        let verdict = classify(&condition, &policy);
        let fatal_kind = matches!(condition.kind(), ConditionKind::Interrupt | ConditionKind::Abort);
        if !fatal_kind && policy.passes_through(&condition) {
            prop_assert_eq!(verdict, Classification::Transparent);
        }
    }

    #[test]
    fn counted_verdict_follows_warning_family(condition in arb_condition(), policy in arb_classify_policy()) {
        match classify(&condition, &policy) {
            Classification::Warning => prop_assert!(condition.is_warning()),
            Classification::Error => prop_assert!(!condition.is_warning()),
            _ => {}
        }
    }

    #[test]
    fn exit_payload_only_after_errors(global in 0u64..5, local in 0u64..5) {
        let payload = Condition::system_exit(-1);
        let policy = ExitPolicy {
            on_errors_raise: Some(payload.clone()),
            exit_message: None,
        };
        let decision = decide_exit(ExitInputs { global_errors: global, local_errors: local.min(global) }, &policy);
        if global == 0 {
            prop_assert!(decision.raise.is_none());
        } else {
            prop_assert_eq!(decision.raise, Some(payload));
        }
    }
}
