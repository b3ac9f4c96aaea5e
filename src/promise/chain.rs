//! Chained derivation.
//!
//! Every method here allocates a fresh downstream container, registers one
//! reaction pair on the source, and returns the downstream container while
//! it is still pending. The source's outcome reaches the downstream
//! container only through its [`Resolver`](super::Resolver), so it is
//! subject to the same deferred, first-wins settlement as any other entry
//! point.
//!
//! All convenience forms route through [`Promise::then_with`]. A missing
//! handler becomes a pass-through wrapper, so both paths are always
//! registered and an unhandled rejection only surfaces at the end of a
//! chain.

use core::fmt;
use std::cell::Cell;
use std::rc::Rc;

use super::container::{Promise, Resolution};

impl<T, E> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    /// The general chaining form.
    ///
    /// `on_fulfilled` runs with the source's value, `on_rejected` with its
    /// reason; whichever runs decides the downstream container's outcome.
    pub fn then_with<U, F, G>(&self, on_fulfilled: F, on_rejected: G) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Resolution<U, E> + 'static,
        G: FnOnce(E) -> Resolution<U, E> + 'static,
    {
        let downstream = Promise::pending(self.scheduler());
        let source = self.id();
        let fulfil = downstream.resolver();
        let reject = downstream.resolver();
        tracing::trace!(
            promise_id = %source,
            downstream = %downstream.id(),
            "chaining reaction"
        );
        self.register(
            move |value| fulfil.settle(on_fulfilled(value)),
            move |reason| reject.settle(on_rejected(reason)),
        );
        downstream
    }

    /// Maps the fulfilled value; rejections pass through unchanged.
    ///
    /// Returning `Err` rejects the downstream container.
    pub fn then<U, F>(&self, f: F) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<U, E> + 'static,
    {
        self.then_with(move |value| f(value).into(), Resolution::Reject)
    }

    /// Handles both paths.
    pub fn then_or_else<U, F, G>(&self, f: F, g: G) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<U, E> + 'static,
        G: FnOnce(E) -> Result<U, E> + 'static,
    {
        self.then_with(move |value| f(value).into(), move |reason| g(reason).into())
    }

    /// Chains a handler that returns another container, which is flattened.
    pub fn and_then<U, F>(&self, f: F) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Promise<U, E> + 'static,
    {
        self.then_with(move |value| Resolution::Adopt(f(value)), Resolution::Reject)
    }

    /// Recovers from a rejection; fulfilment passes through unchanged.
    pub fn catch<G>(&self, g: G) -> Self
    where
        G: FnOnce(E) -> Result<T, E> + 'static,
    {
        self.then_with(Resolution::Fulfill, move |reason| g(reason).into())
    }

    /// Recovers from a rejection through another container.
    pub fn or_else<G>(&self, g: G) -> Self
    where
        G: FnOnce(E) -> Self + 'static,
    {
        self.then_with(Resolution::Fulfill, move |reason| Resolution::Adopt(g(reason)))
    }

    /// Runs `f` once the source settles, whichever way, and then settles the
    /// downstream container with the source's original outcome.
    ///
    /// If `f` returns `Err`, that reason replaces the original outcome.
    pub fn finally<F>(&self, f: F) -> Self
    where
        F: FnOnce() -> Result<(), E> + 'static,
    {
        let on_fulfil = Rc::new(Cell::new(Some(f)));
        let on_reject = Rc::clone(&on_fulfil);
        self.then_with(
            move |value| match run_once(&on_fulfil) {
                Ok(()) => Resolution::Fulfill(value),
                Err(reason) => Resolution::Reject(reason),
            },
            move |reason| match run_once(&on_reject) {
                Ok(()) => Resolution::Reject(reason),
                Err(overriding) => Resolution::Reject(overriding),
            },
        )
    }

    /// A new container that settles exactly as this one does.
    #[must_use]
    pub fn passthrough(&self) -> Self {
        self.then_with(Resolution::Fulfill, Resolution::Reject)
    }
}

fn run_once<F, E>(slot: &Cell<Option<F>>) -> Result<(), E>
where
    F: FnOnce() -> Result<(), E>,
{
    slot.take().map_or(Ok(()), |f| f())
}
