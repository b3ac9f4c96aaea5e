//! Algebraic law property tests for promise chaining and combinators.
//!
//! # Laws Tested
//!
//! ## Chaining Laws
//! - identity: `p.passthrough()` settles exactly as `p`
//! - left identity: `resolve(v).and_then(f)` ≃ `f(v)`
//! - composition: `p.then(f).then(g)` ≃ `p.then(|v| g(f(v)))`
//! - flattening: any adoption depth settles with the innermost outcome
//!
//! ## Combinator Laws
//! - `all` preserves input order and length
//! - `all_settled` mirrors every input outcome
//! - `race` settles with the first input to settle
//! - settlement happens at most once under arbitrary entry-point sequences

#[macro_use]
mod common;

use common::*;
use promissory::combinator::{all, all_settled, race};
use promissory::{Promise, PromiseState, Resolver, Scheduler, SettledOutcome};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// An outcome an input container will settle with.
fn arb_outcome() -> impl Strategy<Value = Result<i32, String>> {
    prop_oneof![
        any::<i32>().prop_map(Ok),
        "[a-z]{1,8}".prop_map(Err),
    ]
}

/// One call on a resolver.
#[derive(Debug, Clone)]
enum Call {
    Resolve(i32),
    Reject(String),
}

fn arb_call() -> impl Strategy<Value = Call> {
    prop_oneof![
        any::<i32>().prop_map(Call::Resolve),
        "[a-z]{1,8}".prop_map(Call::Reject),
    ]
}

fn settle_with(scheduler: &Scheduler, outcome: &Result<i32, String>) -> Promise<i32, String> {
    match outcome {
        Ok(v) => Promise::resolve(scheduler, *v),
        Err(e) => Promise::reject(scheduler, e.clone()),
    }
}

fn apply(resolver: &Resolver<i32, String>, call: &Call) {
    match call {
        Call::Resolve(v) => resolver.resolve(*v),
        Call::Reject(e) => resolver.reject(e.clone()),
    }
}

// ============================================================================
// Chaining Laws
// ============================================================================

proptest! {
    #![proptest_config(test_proptest_config(200))]

    /// LAW: passthrough is the identity on outcomes.
    #[test]
    fn passthrough_identity(outcome in arb_outcome()) {
        init_test_logging();
        let rt = recording_runtime();
        let s = rt.scheduler();
        let p = settle_with(&s, &outcome);
        let through = p.passthrough();
        prop_assert_eq!(rt.block_on(&through).unwrap(), outcome);
    }

    /// LAW: `resolve(v).and_then(f)` settles as `f(v)` does.
    #[test]
    fn left_identity(v in any::<i32>(), fail in any::<bool>()) {
        init_test_logging();
        let rt = recording_runtime();
        let s = rt.scheduler();
        let f = move |s: &Scheduler, x: i32| -> Promise<i32, String> {
            if fail {
                Promise::reject(s, format!("rejected {x}"))
            } else {
                Promise::resolve(s, x.wrapping_mul(3))
            }
        };
        let inner_s = s.clone();
        let chained = Promise::resolve(&s, v).and_then(move |x| f(&inner_s, x));
        let direct = f(&s, v);
        prop_assert_eq!(rt.block_on(&chained).unwrap(), rt.block_on(&direct).unwrap());
    }

    /// LAW: two `then` steps compose like one.
    #[test]
    fn then_composition(outcome in arb_outcome(), k in any::<i32>()) {
        init_test_logging();
        let rt = recording_runtime();
        let s = rt.scheduler();
        let f = move |v: i32| v.wrapping_add(k);
        let g = |v: i32| v.wrapping_mul(2);

        let p = settle_with(&s, &outcome);
        let stepwise = p.then(move |v| Ok(f(v))).then(move |v| Ok(g(v)));
        let fused = p.then(move |v| Ok(g(f(v))));
        prop_assert_eq!(rt.block_on(&stepwise).unwrap(), rt.block_on(&fused).unwrap());
    }

    /// LAW: adoption depth never changes the outcome.
    #[test]
    fn flattening_any_depth(outcome in arb_outcome(), depth in 0usize..16) {
        init_test_logging();
        let rt = recording_runtime();
        let s = rt.scheduler();
        let mut p = settle_with(&s, &outcome);
        for _ in 0..depth {
            p = Promise::adopting(&s, p);
        }
        prop_assert_eq!(rt.block_on(&p).unwrap(), outcome);
    }

    /// LAW: the first entry point to run decides the outcome, forever.
    #[test]
    fn first_call_wins(calls in prop::collection::vec(arb_call(), 1..8)) {
        init_test_logging();
        let rt = recording_runtime();
        let (p, resolver) = deferred::<i32, String>(&rt);
        for call in &calls {
            apply(&resolver, call);
        }
        let outcome = rt.block_on(&p).unwrap();
        let expected = match &calls[0] {
            Call::Resolve(v) => Ok(*v),
            Call::Reject(e) => Err(e.clone()),
        };
        prop_assert_eq!(&outcome, &expected);

        for call in &calls {
            apply(&resolver, call);
        }
        rt.run_until_idle().unwrap();
        let state = p.state();
        let still = match expected {
            Ok(v) => state == PromiseState::Fulfilled(v),
            Err(e) => state == PromiseState::Rejected(e),
        };
        prop_assert!(still);
    }
}

// ============================================================================
// Combinator Laws
// ============================================================================

proptest! {
    #![proptest_config(test_proptest_config(200))]

    /// LAW: `all` over fulfilments preserves order and length.
    #[test]
    fn all_preserves_order(values in prop::collection::vec(any::<i32>(), 0..12)) {
        init_test_logging();
        let rt = recording_runtime();
        let s = rt.scheduler();
        let inputs: Vec<Promise<i32, String>> =
            values.iter().map(|v| Promise::resolve(&s, *v)).collect();
        let p = all(&s, inputs);
        prop_assert_eq!(rt.block_on(&p).unwrap(), Ok(values));
    }

    /// LAW: `all` rejects iff some input rejects, with the earliest one.
    #[test]
    fn all_rejects_with_first_rejection(outcomes in prop::collection::vec(arb_outcome(), 1..10)) {
        init_test_logging();
        let rt = recording_runtime();
        let s = rt.scheduler();
        let inputs: Vec<_> = outcomes.iter().map(|o| settle_with(&s, o)).collect();
        let p = all(&s, inputs);
        let expected: Result<Vec<i32>, String> = outcomes.iter().cloned().collect();
        prop_assert_eq!(rt.block_on(&p).unwrap(), expected);
    }

    /// LAW: `all_settled` mirrors every input.
    #[test]
    fn all_settled_mirrors_inputs(outcomes in prop::collection::vec(arb_outcome(), 0..10)) {
        init_test_logging();
        let rt = recording_runtime();
        let s = rt.scheduler();
        let inputs: Vec<_> = outcomes.iter().map(|o| settle_with(&s, o)).collect();
        let p = all_settled(&s, inputs);
        let expected: Vec<SettledOutcome<i32, String>> =
            outcomes.into_iter().map(SettledOutcome::from).collect();
        prop_assert_eq!(rt.block_on(&p).unwrap(), Ok(expected));
        rt.run_until_idle().unwrap();
        prop_assert!(rt.unhandled_rejections().is_empty());
    }

    /// LAW: with inputs that settle in input order, `race` picks the first.
    #[test]
    fn race_picks_first_settled(outcomes in prop::collection::vec(arb_outcome(), 1..10)) {
        init_test_logging();
        let rt = recording_runtime();
        let s = rt.scheduler();
        let inputs: Vec<_> = outcomes.iter().map(|o| settle_with(&s, o)).collect();
        let p = race(&s, inputs);
        prop_assert_eq!(rt.block_on(&p).unwrap(), outcomes[0].clone());
    }
}
