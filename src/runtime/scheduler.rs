//! The host scheduling seam.
//!
//! Promises never run their reactions synchronously. Every settlement and
//! every delivery is handed to the host as a [`Microtask`], and the host
//! runs microtasks after the current synchronous code, one at a time, in the
//! order they were deferred.
//!
//! [`Schedule`] is the whole contract between this crate and a host.
//! [`LocalRuntime`](super::LocalRuntime) is the reference host; an embedder
//! with its own event loop implements the trait directly.

use core::fmt;
use std::rc::Rc;

use super::rejection::UnhandledRejection;
use crate::trace::PromiseEvent;
use crate::types::Turn;

/// A unit of deferred work.
pub type Microtask = Box<dyn FnOnce()>;

/// Host-provided deferred execution.
pub trait Schedule {
    /// Queues `task` to run after the current synchronous execution.
    ///
    /// Tasks must run in FIFO order relative to each other and must never
    /// run re-entrantly inside `defer`.
    fn defer(&self, task: Microtask);

    /// Escalates a rejection that reached its flush with no reject-path
    /// reaction ever registered.
    fn unhandled_rejection(&self, rejection: UnhandledRejection) {
        tracing::error!(
            promise_id = %rejection.promise,
            turn = rejection.turn.get(),
            reason = %rejection.reason,
            "unhandled promise rejection"
        );
    }

    /// Observes a lifecycle event. The default ignores it.
    fn trace(&self, event: PromiseEvent) {
        let _ = event;
    }

    /// Returns the turn currently executing, or `Turn::ZERO` outside the loop.
    fn current_turn(&self) -> Turn {
        Turn::ZERO
    }
}

/// Cheap, clonable handle to a host scheduler.
///
/// Every promise carries one; all promises derived from it share it.
#[derive(Clone)]
pub struct Scheduler {
    host: Rc<dyn Schedule>,
}

impl Scheduler {
    /// Wraps a host.
    #[must_use]
    pub fn new<S: Schedule + 'static>(host: S) -> Self {
        Self {
            host: Rc::new(host),
        }
    }

    /// Wraps an already shared host.
    #[must_use]
    pub fn from_rc(host: Rc<dyn Schedule>) -> Self {
        Self { host }
    }

    /// Defers a closure to a later turn.
    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.host.defer(Box::new(task));
    }

    /// Returns the turn the host is currently running.
    #[must_use]
    pub fn current_turn(&self) -> Turn {
        self.host.current_turn()
    }

    pub(crate) fn report_unhandled(&self, rejection: UnhandledRejection) {
        self.host.unhandled_rejection(rejection);
    }

    pub(crate) fn trace(&self, event: PromiseEvent) {
        self.host.trace(event);
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("turn", &self.current_turn())
            .finish_non_exhaustive()
    }
}
