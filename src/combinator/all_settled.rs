//! All-settled combinator: wait for every input, never reject.
//!
//! # Semantics
//!
//! `all_settled([p0, ..., pn-1])` fulfils, once every input has settled,
//! with one [`SettledOutcome`] per input in input order. Rejected inputs
//! count as handled, so none of them escalates as unhandled.
//!
//! An empty input fulfils with `vec![]`.

use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use crate::promise::Promise;
use crate::runtime::Scheduler;
use crate::types::SettledOutcome;

struct Slots<T, E> {
    outcomes: Vec<Option<SettledOutcome<T, E>>>,
    remaining: usize,
}

impl<T, E> Slots<T, E> {
    /// Stores one outcome; returns every outcome once the last one lands.
    fn record(
        &mut self,
        index: usize,
        outcome: SettledOutcome<T, E>,
    ) -> Option<Vec<SettledOutcome<T, E>>> {
        if self.outcomes[index].is_none() {
            self.outcomes[index] = Some(outcome);
            self.remaining -= 1;
        }
        (self.remaining == 0).then(|| {
            std::mem::take(&mut self.outcomes)
                .into_iter()
                .flatten()
                .collect()
        })
    }
}

/// Aggregates `promises` into one container holding every outcome.
pub fn all_settled<T, E, I>(
    scheduler: &Scheduler,
    promises: I,
) -> Promise<Vec<SettledOutcome<T, E>>, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
    I: IntoIterator<Item = Promise<T, E>>,
{
    let inputs: Vec<Promise<T, E>> = promises.into_iter().collect();
    Promise::new(scheduler, move |resolver| {
        let n = inputs.len();
        tracing::trace!(inputs = n, aggregate = %resolver.promise_id(), "all_settled");
        if n == 0 {
            resolver.resolve(Vec::new());
            return Ok(());
        }
        let slots = Rc::new(RefCell::new(Slots {
            outcomes: vec![None; n],
            remaining: n,
        }));
        for (index, input) in inputs.into_iter().enumerate() {
            let fulfil_slots = Rc::clone(&slots);
            let reject_slots = Rc::clone(&slots);
            let on_fulfil = resolver.clone();
            let on_reject = resolver.clone();
            let _reaction = input.then_or_else(
                move |value| {
                    let done = fulfil_slots
                        .borrow_mut()
                        .record(index, SettledOutcome::Fulfilled { value });
                    if let Some(outcomes) = done {
                        on_fulfil.resolve(outcomes);
                    }
                    Ok(())
                },
                move |reason| {
                    let done = reject_slots
                        .borrow_mut()
                        .record(index, SettledOutcome::Rejected { reason });
                    if let Some(outcomes) = done {
                        on_reject.resolve(outcomes);
                    }
                    Ok(())
                },
            );
        }
        Ok(())
    })
}
