//! Aggregate combinators.
//!
//! Each combinator consumes an ordered sequence of containers and builds one
//! aggregate container of the same [`Promise`] type, so combinators nest:
//!
//! - [`all`](fn@all): every input fulfils, or the first rejection
//! - [`all_settled`](fn@all_settled): every input settles; never rejects
//! - [`race`](fn@race): the first outcome to arrive
//! - [`any`](fn@any): the first fulfilment, or every rejection
//!
//! They are built only from [`Promise::new`] and
//! [`Promise::then_or_else`]; nothing here touches container internals.
//! Each takes the [`Scheduler`] explicitly so an empty input is expressible.

pub mod all;
pub mod all_settled;
pub mod any;
pub mod race;

use core::fmt;

pub use all::all;
pub use all_settled::all_settled;
pub use any::any;
pub use race::race;

use crate::promise::Promise;
use crate::runtime::Scheduler;
use crate::types::{AggregateError, SettledOutcome};

impl<T, E> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    /// See [`all`](fn@all).
    pub fn all<I>(scheduler: &Scheduler, promises: I) -> Promise<Vec<T>, E>
    where
        I: IntoIterator<Item = Self>,
    {
        all(scheduler, promises)
    }

    /// See [`all_settled`](fn@all_settled).
    pub fn all_settled<I>(
        scheduler: &Scheduler,
        promises: I,
    ) -> Promise<Vec<SettledOutcome<T, E>>, E>
    where
        I: IntoIterator<Item = Self>,
    {
        all_settled(scheduler, promises)
    }

    /// See [`race`](fn@race).
    pub fn race<I>(scheduler: &Scheduler, promises: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        race(scheduler, promises)
    }

    /// See [`any`](fn@any).
    pub fn any<I>(scheduler: &Scheduler, promises: I) -> Promise<T, AggregateError<E>>
    where
        I: IntoIterator<Item = Self>,
    {
        any(scheduler, promises)
    }
}
