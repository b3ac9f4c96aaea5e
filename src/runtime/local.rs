//! Reference single-threaded host.
//!
//! [`LocalRuntime`] owns a FIFO microtask queue and runs it on the calling
//! thread. It records every unhandled rejection and lifecycle event so that
//! tests can assert on them after a run.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::config::RuntimeConfig;
use super::rejection::{RejectionPolicy, UnhandledRejection};
use super::scheduler::{Microtask, Schedule, Scheduler};
use crate::error::{Error, Result};
use crate::promise::{Promise, Resolver};
use crate::trace::{PromiseEvent, TraceBuffer};
use crate::types::Turn;

/// Shared state behind the runtime and every [`Scheduler`] it hands out.
struct Host {
    queue: RefCell<VecDeque<Microtask>>,
    turn: Cell<Turn>,
    config: RuntimeConfig,
    unhandled: RefCell<Vec<UnhandledRejection>>,
    trace: RefCell<TraceBuffer>,
}

impl core::fmt::Debug for Host {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Host")
            .field("queued", &self.queue.borrow().len())
            .field("turn", &self.turn.get())
            .field("config", &self.config)
            .field("unhandled", &self.unhandled.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Schedule for Host {
    fn defer(&self, task: Microtask) {
        self.queue.borrow_mut().push_back(task);
    }

    fn unhandled_rejection(&self, rejection: UnhandledRejection) {
        self.unhandled.borrow_mut().push(rejection.clone());
        match self.config.rejection_policy {
            RejectionPolicy::Panic => {
                tracing::error!(
                    promise_id = %rejection.promise,
                    turn = rejection.turn.get(),
                    reason = %rejection.reason,
                    "unhandled promise rejection"
                );
                panic!("{rejection}");
            }
            RejectionPolicy::Warn => {
                tracing::warn!(
                    promise_id = %rejection.promise,
                    turn = rejection.turn.get(),
                    reason = %rejection.reason,
                    "unhandled promise rejection"
                );
            }
            RejectionPolicy::Record => {
                tracing::debug!(
                    promise_id = %rejection.promise,
                    reason = %rejection.reason,
                    "unhandled promise rejection recorded"
                );
            }
        }
    }

    fn trace(&self, mut event: PromiseEvent) {
        event.turn = self.turn.get();
        self.trace.borrow_mut().push(event);
    }

    fn current_turn(&self) -> Turn {
        self.turn.get()
    }
}

/// The reference single-threaded runtime.
///
/// Promises created through [`scheduler`](Self::scheduler) queue their turns
/// here; nothing runs until one of the `run`/`block_on` methods is called.
///
/// Dropping the runtime discards any turns still queued.
#[derive(Debug)]
pub struct LocalRuntime {
    host: Rc<Host>,
    scheduler: Scheduler,
}

impl LocalRuntime {
    /// Creates a runtime with the given configuration.
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        let host = Rc::new(Host {
            queue: RefCell::new(VecDeque::new()),
            turn: Cell::new(Turn::ZERO),
            trace: RefCell::new(TraceBuffer::new(config.trace_capacity)),
            unhandled: RefCell::new(Vec::new()),
            config,
        });
        let scheduler = Scheduler::from_rc(Rc::clone(&host) as Rc<dyn Schedule>);
        Self { host, scheduler }
    }

    /// Creates a runtime configured from `PROMISSORY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(RuntimeConfig::from_env()?))
    }

    /// Returns a handle for constructing promises on this runtime.
    #[must_use]
    pub fn scheduler(&self) -> Scheduler {
        self.scheduler.clone()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.host.config
    }

    /// Constructs a promise on this runtime; see [`Promise::new`].
    pub fn promise<T, E, F>(&self, setup: F) -> Promise<T, E>
    where
        T: Clone + 'static,
        E: Clone + core::fmt::Debug + 'static,
        F: FnOnce(Resolver<T, E>) -> core::result::Result<(), E>,
    {
        Promise::new(&self.scheduler, setup)
    }

    /// A promise that fulfils with `value`.
    pub fn resolved<T, E>(&self, value: T) -> Promise<T, E>
    where
        T: Clone + 'static,
        E: Clone + core::fmt::Debug + 'static,
    {
        Promise::resolve(&self.scheduler, value)
    }

    /// A promise that rejects with `reason`.
    pub fn rejected<T, E>(&self, reason: E) -> Promise<T, E>
    where
        T: Clone + 'static,
        E: Clone + core::fmt::Debug + 'static,
    {
        Promise::reject(&self.scheduler, reason)
    }

    /// Number of turns run since the runtime was created.
    #[must_use]
    pub fn turns(&self) -> u64 {
        self.host.turn.get().get()
    }

    /// Number of microtasks waiting to run.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.host.queue.borrow().len()
    }

    /// Returns true when no microtask is queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending_tasks() == 0
    }

    /// Runs exactly one queued microtask. Returns false if the queue was empty.
    pub fn tick(&self) -> bool {
        let next = self.host.queue.borrow_mut().pop_front();
        let Some(task) = next else {
            return false;
        };
        let turn = self.host.turn.get().next();
        self.host.turn.set(turn);
        tracing::trace!(turn = turn.get(), "running microtask");
        task();
        true
    }

    /// Runs microtasks until the queue is empty.
    ///
    /// Returns the number of turns run, or `TurnLimitExceeded` if the
    /// configured limit was reached with work still queued.
    pub fn run_until_idle(&self) -> Result<u64> {
        let mut ran = 0u64;
        loop {
            if self.is_idle() {
                tracing::trace!(turns = ran, "microtask queue idle");
                return Ok(ran);
            }
            self.check_limit(ran)?;
            self.tick();
            ran += 1;
        }
    }

    /// Runs microtasks until `promise` settles and returns its outcome.
    ///
    /// Awaiting counts as handling: a rejection observed here is never
    /// escalated as unhandled. Returns `Stalled` if the queue drains while
    /// the promise is still pending.
    pub fn block_on<T, E>(&self, promise: &Promise<T, E>) -> Result<core::result::Result<T, E>>
    where
        T: Clone + 'static,
        E: Clone + core::fmt::Debug + 'static,
    {
        promise.observe();
        let mut ran = 0u64;
        loop {
            if let Some(outcome) = promise.state().into_result() {
                return Ok(outcome);
            }
            self.check_limit(ran)?;
            if !self.tick() {
                tracing::debug!(promise_id = %promise.id(), "block_on stalled");
                return Err(Error::stalled(promise.id()));
            }
            ran += 1;
        }
    }

    /// Unhandled rejections reported so far.
    #[must_use]
    pub fn unhandled_rejections(&self) -> Vec<UnhandledRejection> {
        self.host.unhandled.borrow().clone()
    }

    /// Drains and returns the unhandled rejections reported so far.
    pub fn take_unhandled_rejections(&self) -> Vec<UnhandledRejection> {
        std::mem::take(&mut *self.host.unhandled.borrow_mut())
    }

    /// Returns a snapshot of the recorded lifecycle events, oldest first.
    #[must_use]
    pub fn trace_events(&self) -> Vec<PromiseEvent> {
        self.host.trace.borrow().iter().cloned().collect()
    }

    /// Renders the recorded lifecycle events as NDJSON.
    pub fn trace_ndjson(&self) -> Result<String> {
        self.host
            .trace
            .borrow()
            .to_ndjson()
            .map_err(|e| Error::internal(format!("trace serialization failed: {e}")))
    }

    fn check_limit(&self, ran: u64) -> Result<()> {
        match self.host.config.max_turns {
            Some(limit) if ran >= limit => {
                tracing::warn!(limit, pending = self.pending_tasks(), "turn limit reached");
                Err(Error::turn_limit(limit))
            }
            _ => Ok(()),
        }
    }
}

impl Default for LocalRuntime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Drop for LocalRuntime {
    fn drop(&mut self) {
        // Queued turns hold promises, which hold the host: break the cycle.
        let discarded = std::mem::take(&mut *self.host.queue.borrow_mut());
        if !discarded.is_empty() {
            tracing::debug!(discarded = discarded.len(), "dropping queued microtasks");
        }
        drop(discarded);
    }
}
