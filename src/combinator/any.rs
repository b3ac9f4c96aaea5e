//! Any combinator: the first fulfilment wins, reject only if all reject.
//!
//! # Semantics
//!
//! `any([p0, ..., pn-1])` fulfils with the first value to arrive. If every
//! input rejects, it rejects with an [`AggregateError`] holding the reasons
//! in input order. An empty input rejects at once with an empty
//! `AggregateError`.

use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use crate::promise::Promise;
use crate::runtime::Scheduler;
use crate::types::AggregateError;

struct Reasons<E> {
    reasons: Vec<Option<E>>,
    remaining: usize,
}

/// Settles with the first fulfilled value among `promises`.
pub fn any<T, E, I>(scheduler: &Scheduler, promises: I) -> Promise<T, AggregateError<E>>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
    I: IntoIterator<Item = Promise<T, E>>,
{
    let inputs: Vec<Promise<T, E>> = promises.into_iter().collect();
    Promise::new(scheduler, move |resolver| {
        let n = inputs.len();
        tracing::trace!(inputs = n, aggregate = %resolver.promise_id(), "any");
        if n == 0 {
            resolver.reject(AggregateError::new(Vec::new()));
            return Ok(());
        }
        let state = Rc::new(RefCell::new(Reasons {
            reasons: vec![None; n],
            remaining: n,
        }));
        for (index, input) in inputs.into_iter().enumerate() {
            let state = Rc::clone(&state);
            let on_fulfil = resolver.clone();
            let on_reject = resolver.clone();
            let _reaction = input.then_or_else(
                move |value| {
                    on_fulfil.resolve(value);
                    Ok(())
                },
                move |reason| {
                    let done = {
                        let mut state = state.borrow_mut();
                        if state.reasons[index].is_none() {
                            state.reasons[index] = Some(reason);
                            state.remaining -= 1;
                        }
                        (state.remaining == 0).then(|| std::mem::take(&mut state.reasons))
                    };
                    if let Some(reasons) = done {
                        let reasons = reasons.into_iter().flatten().collect();
                        on_reject.reject(AggregateError::new(reasons));
                    }
                    Ok(())
                },
            );
        }
        Ok(())
    })
}
