//! Race combinator: the first outcome to arrive wins.
//!
//! # Semantics
//!
//! `race([p0, ..., pn-1])` registers one reaction pair per input. Each pair
//! forwards its outcome to the aggregate's resolver; only the first
//! settlement to run takes effect.
//!
//! Losers are not cancelled (nothing here can be) and keep running to their
//! own settlement. Their rejections count as handled.
//!
//! An empty input never settles.
//!
//! # Algebraic Laws
//!
//! - Identity: `race([a, never]) ≃ a`
//! - Associativity: `race([race([a, b]), c])` settles with the same winner
//!   as `race([a, b, c])` when the winner is `a` or `b`, one hop later

use core::fmt;

use crate::promise::Promise;
use crate::runtime::Scheduler;

/// Settles with the outcome of whichever input settles first.
pub fn race<T, E, I>(scheduler: &Scheduler, promises: I) -> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
    I: IntoIterator<Item = Promise<T, E>>,
{
    let inputs: Vec<Promise<T, E>> = promises.into_iter().collect();
    Promise::new(scheduler, move |resolver| {
        tracing::trace!(inputs = inputs.len(), aggregate = %resolver.promise_id(), "race");
        for input in inputs {
            let on_fulfil = resolver.clone();
            let on_reject = resolver.clone();
            let _reaction = input.then_or_else(
                move |value| {
                    on_fulfil.resolve(value);
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
