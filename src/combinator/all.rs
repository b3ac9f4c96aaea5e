//! All combinator: fulfil once every input fulfils, fail fast on rejection.
//!
//! # Semantics
//!
//! `all([p0, p1, ..., pn-1])`:
//! 1. Register a reaction pair on every input, in order
//! 2. Store each fulfilled value at its input's index
//! 3. When the last slot fills, fulfil with the index-aligned values
//! 4. The first rejection to arrive rejects the aggregate; later outcomes
//!    are absorbed by the aggregate's single-settlement guard
//!
//! An empty input fulfils with `vec![]`.
//!
//! # Algebraic Laws
//!
//! - Identity: `all([p]).then(|v| v[0]) ≃ p`
//! - Order: output order is input order, not arrival order

use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use crate::promise::Promise;
use crate::runtime::Scheduler;

struct Slots<T> {
    values: Vec<Option<T>>,
    remaining: usize,
}

/// Aggregates `promises` into one container holding all their values.
pub fn all<T, E, I>(scheduler: &Scheduler, promises: I) -> Promise<Vec<T>, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
    I: IntoIterator<Item = Promise<T, E>>,
{
    let inputs: Vec<Promise<T, E>> = promises.into_iter().collect();
    Promise::new(scheduler, move |resolver| {
        let n = inputs.len();
        tracing::trace!(inputs = n, aggregate = %resolver.promise_id(), "all");
        if n == 0 {
            resolver.resolve(Vec::new());
            return Ok(());
        }
        let slots = Rc::new(RefCell::new(Slots {
            values: vec![None; n],
            remaining: n,
        }));
        for (index, input) in inputs.into_iter().enumerate() {
            let slots = Rc::clone(&slots);
            let on_fulfil = resolver.clone();
            let on_reject = resolver.clone();
            let _reaction = input.then_or_else(
                move |value| {
                    let done = {
                        let mut slots = slots.borrow_mut();
                        if slots.values[index].is_none() {
                            slots.values[index] = Some(value);
                            slots.remaining -= 1;
                        }
                        (slots.remaining == 0)
                            .then(|| std::mem::take(&mut slots.values))
                    };
                    if let Some(values) = done {
                        on_fulfil.resolve(values.into_iter().flatten().collect());
                    }
                    Ok(())
                },
                move |reason| {
                    on_reject.reject(reason);
                    Ok(())
                },
            );
        }
        Ok(())
    })
}
