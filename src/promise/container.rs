//! Settlement state machine and reaction dispatch.
//!
//! # State machine
//!
//! ```text
//!             resolve(v)            flush: fulfil reactions, FIFO
//!   Pending ─────────────> Fulfilled ──────────────────────────────>
//!      │
//!      │ reject(e)                  flush: reject reactions, FIFO
//!      └─────────────────> Rejected ───────────────────────────────>
//!                             (no reject reaction ever registered
//!                              => unhandled-rejection escalation)
//! ```
//!
//! Every entry point defers its work to a scheduler turn and re-checks
//! "still pending, not locked" on that turn. The first entry point to *run*
//! wins; later ones are silently ignored.
//!
//! `adopt(q)` locks the container onto `q`: it stays pending but refuses
//! direct settlement, and settles only when `q`'s outcome arrives.
//! An adoption that would close a cycle (`p` adopting itself, or `a`
//! following `b` while `b` follows `a`) locks and never settles.

use core::fmt;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::runtime::{Scheduler, UnhandledRejection};
use crate::trace::{PromiseEvent, PromiseEventKind};
use crate::types::{PromiseId, PromiseState};

type FulfilReaction<T> = Box<dyn FnOnce(T)>;
type RejectReaction<E> = Box<dyn FnOnce(E)>;

struct Inner<T, E> {
    id: PromiseId,
    state: PromiseState<T, E>,
    fulfil_reactions: Vec<FulfilReaction<T>>,
    reject_reactions: Vec<RejectReaction<E>>,
    /// Committed to another container's outcome.
    locked: bool,
    /// The container this one follows. Never closes a cycle.
    adoptee: Option<Weak<RefCell<Inner<T, E>>>>,
    /// A reject-path reaction has been registered at some point.
    handled: bool,
    /// Adoptions queued against this container that have not run yet.
    claims: usize,
    /// A flush for late registrations is already queued.
    flush_queued: bool,
}

/// A single-assignment container for an eventual `T` or failure `E`.
///
/// `Promise` is a cheap handle: clones alias the same container. It is
/// settled through the [`Resolver`] handed to the setup function of
/// [`Promise::new`], and observed by registering reactions with
/// [`then`](Promise::then) and friends.
pub struct Promise<T, E> {
    inner: Rc<RefCell<Inner<T, E>>>,
    scheduler: Scheduler,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Promise")
            .field("id", &inner.id)
            .field("state", &inner.state)
            .field("locked", &inner.locked)
            .field("reactions", &inner.fulfil_reactions.len())
            .finish()
    }
}

/// The settlement capability of one container.
///
/// Cloning a resolver yields another handle to the same capability; all
/// clones race, and only the first call to take effect on a scheduler turn
/// settles the container.
pub struct Resolver<T, E> {
    promise: Promise<T, E>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("promise", &self.promise.inner.borrow().id)
            .finish()
    }
}

/// What a reaction hands back to settle its downstream container.
pub enum Resolution<T, E> {
    /// Fulfil with a value.
    Fulfill(T),
    /// Reject with a reason.
    Reject(E),
    /// Adopt the eventual outcome of another container.
    Adopt(Promise<T, E>),
}

impl<T, E> From<Result<T, E>> for Resolution<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Fulfill(value),
            Err(reason) => Self::Reject(reason),
        }
    }
}

impl<T, E> From<Promise<T, E>> for Resolution<T, E> {
    fn from(promise: Promise<T, E>) -> Self {
        Self::Adopt(promise)
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Resolution<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fulfill(v) => f.debug_tuple("Fulfill").field(v).finish(),
            Self::Reject(e) => f.debug_tuple("Reject").field(e).finish(),
            Self::Adopt(p) => f.debug_tuple("Adopt").field(&p.id()).finish(),
        }
    }
}

impl<T, E> Promise<T, E> {
    /// Returns this container's id.
    #[must_use]
    pub fn id(&self) -> PromiseId {
        self.inner.borrow().id
    }

    /// Returns the scheduler this container defers its turns to.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns true while the container has not settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.borrow().state.is_pending()
    }

    /// Returns true once the container has fulfilled.
    #[must_use]
    pub fn is_fulfilled(&self) -> bool {
        self.inner.borrow().state.is_fulfilled()
    }

    /// Returns true once the container has rejected.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.inner.borrow().state.is_rejected()
    }

    /// Returns true if both handles alias the same container.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    /// Constructs a container and runs `setup` synchronously, exactly once.
    ///
    /// `setup` receives the container's [`Resolver`]. If it returns
    /// `Err(reason)`, the container is rejected with `reason`; the error is
    /// never returned to the caller.
    pub fn new<F>(scheduler: &Scheduler, setup: F) -> Self
    where
        F: FnOnce(Resolver<T, E>) -> Result<(), E>,
    {
        let promise = Self::pending(scheduler);
        if let Err(reason) = setup(promise.resolver()) {
            tracing::debug!(promise_id = %promise.id(), ?reason, "setup failed");
            promise.resolver().reject(reason);
        }
        promise
    }

    /// A container that fulfils with `value` on the next turn.
    pub fn resolve(scheduler: &Scheduler, value: T) -> Self {
        Self::new(scheduler, |resolver| {
            resolver.resolve(value);
            Ok(())
        })
    }

    /// A container that rejects with `reason` on the next turn.
    pub fn reject(scheduler: &Scheduler, reason: E) -> Self {
        Self::new(scheduler, |resolver| {
            resolver.reject(reason);
            Ok(())
        })
    }

    /// A new container that adopts `other`'s eventual outcome.
    pub fn adopting(scheduler: &Scheduler, other: Self) -> Self {
        Self::new(scheduler, |resolver| {
            resolver.adopt(other);
            Ok(())
        })
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> PromiseState<T, E> {
        self.inner.borrow().state.clone()
    }

    pub(crate) fn pending(scheduler: &Scheduler) -> Self {
        let id = PromiseId::next();
        let promise = Self {
            inner: Rc::new(RefCell::new(Inner {
                id,
                state: PromiseState::Pending,
                fulfil_reactions: Vec::new(),
                reject_reactions: Vec::new(),
                locked: false,
                adoptee: None,
                handled: false,
                claims: 0,
                flush_queued: false,
            })),
            scheduler: scheduler.clone(),
        };
        tracing::trace!(promise_id = %id, "promise created");
        scheduler.trace(PromiseEvent::new(id, PromiseEventKind::Created));
        promise
    }

    pub(crate) fn resolver(&self) -> Resolver<T, E> {
        Resolver {
            promise: self.clone(),
        }
    }

    /// Appends a reaction pair.
    ///
    /// Works in any state. If the container already settled, one flush is
    /// queued so the new pair is still delivered, on a later turn.
    pub(crate) fn register<F, G>(&self, on_fulfil: F, on_reject: G)
    where
        F: FnOnce(T) + 'static,
        G: FnOnce(E) + 'static,
    {
        let (id, queue_flush) = {
            let mut inner = self.inner.borrow_mut();
            inner.fulfil_reactions.push(Box::new(on_fulfil));
            inner.reject_reactions.push(Box::new(on_reject));
            inner.handled = true;
            let queue_flush = inner.state.is_settled() && !inner.flush_queued;
            if queue_flush {
                inner.flush_queued = true;
            }
            (inner.id, queue_flush)
        };
        self.scheduler
            .trace(PromiseEvent::new(id, PromiseEventKind::ReactionRegistered));
        if queue_flush {
            tracing::trace!(promise_id = %id, "late registration, flush queued");
            let promise = self.clone();
            self.scheduler.defer(move || promise.flush());
        }
    }

    /// Holds off escalation until a queued adoption has run.
    ///
    /// Adoption claims its source when `adopt` is called, ahead of the
    /// deferred turn that registers on it.
    fn claim(&self) {
        self.inner.borrow_mut().claims += 1;
    }

    /// Drops one claim taken by [`claim`](Self::claim).
    ///
    /// A rejected container has already flushed, so if the released claim
    /// was the only thing hiding it, it escalates here.
    fn release_claim(&self) {
        let reason = {
            let mut inner = self.inner.borrow_mut();
            inner.claims = inner.claims.saturating_sub(1);
            if inner.claims > 0 || inner.handled {
                return;
            }
            let PromiseState::Rejected(reason) = &inner.state else {
                return;
            };
            let reason = reason.clone();
            inner.handled = true;
            reason
        };
        tracing::trace!(promise_id = %self.id(), "adoption claim released on a rejection");
        self.escalate(&reason);
    }

    /// Returns true if following `other`'s adoption chain leads back here.
    fn adoption_closes_cycle(&self, other: &Self) -> bool {
        let mut cursor = Some(Rc::clone(&other.inner));
        while let Some(node) = cursor {
            if Rc::ptr_eq(&node, &self.inner) {
                return true;
            }
            cursor = node.borrow().adoptee.as_ref().and_then(Weak::upgrade);
        }
        false
    }

    /// Registers a no-op reaction pair so a rejection counts as observed.
    pub(crate) fn observe(&self) {
        self.register(|_| {}, |_| {});
    }

    /// Runs on a scheduler turn. `via_adoption` bypasses the lock so the
    /// adopted outcome can land.
    fn settle_now(&self, outcome: Result<T, E>, via_adoption: bool) {
        let (id, kind) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.state.is_pending() || (inner.locked && !via_adoption) {
                tracing::trace!(
                    promise_id = %inner.id,
                    state = inner.state.label(),
                    locked = inner.locked,
                    "settlement ignored"
                );
                return;
            }
            let kind = match outcome {
                Ok(value) => {
                    inner.state = PromiseState::Fulfilled(value);
                    PromiseEventKind::Resolved
                }
                Err(reason) => {
                    inner.state = PromiseState::Rejected(reason);
                    PromiseEventKind::Rejected
                }
            };
            (inner.id, kind)
        };
        tracing::debug!(promise_id = %id, outcome = %kind, "promise settled");
        self.scheduler.trace(PromiseEvent::new(id, kind));
        self.flush();
    }

    /// Runs on a scheduler turn: lock onto `other` and subscribe to it.
    ///
    /// The claim `adopt` took on `other` is released on every path. An
    /// ignored adoption leaves `other` unobserved, so its rejection still
    /// escalates.
    fn adopt_now(&self, other: Self) {
        let id = {
            let mut inner = self.inner.borrow_mut();
            if !inner.state.is_pending() || inner.locked {
                tracing::trace!(promise_id = %inner.id, "adoption ignored");
                drop(inner);
                other.release_claim();
                return;
            }
            inner.locked = true;
            inner.id
        };
        let other_id = other.id();
        self.scheduler.trace(
            PromiseEvent::new(id, PromiseEventKind::Adopted).with_detail(other_id.to_string()),
        );
        if self.adoption_closes_cycle(&other) {
            tracing::warn!(
                promise_id = %id,
                adopted = %other_id,
                "adoption cycle, promise can never settle"
            );
            other.release_claim();
            return;
        }
        self.inner.borrow_mut().adoptee = Some(Rc::downgrade(&other.inner));
        tracing::trace!(promise_id = %id, adopted = %other_id, "adopting outcome");
        let on_fulfil = self.clone();
        let on_reject = self.clone();
        other.register(
            move |value| on_fulfil.settle_now(Ok(value), true),
            move |reason| on_reject.settle_now(Err(reason), true),
        );
        other.release_claim();
    }

    /// Delivers the settled outcome to every queued reaction, in order.
    ///
    /// Both queues are taken before any reaction runs, so reactions may
    /// register on this container again; those land in a later flush.
    fn flush(&self) {
        let (id, outcome, fulfil, reject, unhandled) = {
            let mut inner = self.inner.borrow_mut();
            inner.flush_queued = false;
            let outcome = match &inner.state {
                PromiseState::Pending => return,
                PromiseState::Fulfilled(value) => Ok(value.clone()),
                PromiseState::Rejected(reason) => Err(reason.clone()),
            };
            let unhandled = outcome.is_err() && !inner.handled && inner.claims == 0;
            let fulfil = std::mem::take(&mut inner.fulfil_reactions);
            let reject = std::mem::take(&mut inner.reject_reactions);
            (inner.id, outcome, fulfil, reject, unhandled)
        };

        self.scheduler.trace(
            PromiseEvent::new(id, PromiseEventKind::Flushed).with_detail(fulfil.len().to_string()),
        );
        match outcome {
            Ok(value) => {
                drop(reject);
                for reaction in fulfil {
                    reaction(value.clone());
                }
            }
            Err(reason) => {
                drop(fulfil);
                if unhandled {
                    self.inner.borrow_mut().handled = true;
                    self.escalate(&reason);
                }
                for reaction in reject {
                    reaction(reason.clone());
                }
            }
        }
    }
}

impl<T, E: fmt::Debug> Promise<T, E> {
    fn escalate(&self, reason: &E) {
        let id = self.id();
        self.scheduler
            .trace(PromiseEvent::new(id, PromiseEventKind::UnhandledRejection));
        self.scheduler.report_unhandled(UnhandledRejection::new(
            id,
            reason,
            self.scheduler.current_turn(),
        ));
    }
}

impl<T, E> Resolver<T, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    /// Fulfils the container with `value` on a later turn, unless something
    /// else settles or locks it first.
    pub fn resolve(&self, value: T) {
        let promise = self.promise.clone();
        self.promise
            .scheduler
            .defer(move || promise.settle_now(Ok(value), false));
    }

    /// Rejects the container with `reason` on a later turn, unless something
    /// else settles or locks it first.
    pub fn reject(&self, reason: E) {
        let promise = self.promise.clone();
        self.promise
            .scheduler
            .defer(move || promise.settle_now(Err(reason), false));
    }

    /// Makes the container follow `other`: on a later turn it locks onto
    /// `other` and eventually takes its state and value.
    ///
    /// Until the adoption turn runs, a rejection of `other` is held back
    /// from escalation. If that turn is ignored because this container
    /// already settled or locked, the hold is released and `other`'s
    /// rejection escalates as usual.
    pub fn adopt(&self, other: Promise<T, E>) {
        other.claim();
        let promise = self.promise.clone();
        self.promise
            .scheduler
            .defer(move || promise.adopt_now(other));
    }

    /// Dispatches a [`Resolution`] to the matching entry point.
    pub fn settle(&self, resolution: Resolution<T, E>) {
        match resolution {
            Resolution::Fulfill(value) => self.resolve(value),
            Resolution::Reject(reason) => self.reject(reason),
            Resolution::Adopt(other) => self.adopt(other),
        }
    }

    /// Returns the id of the container this resolver settles.
    #[must_use]
    pub fn promise_id(&self) -> PromiseId {
        self.promise.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::LocalRuntime;
    use crate::test_utils::{init_test_logging, recording_runtime};
    use std::cell::Cell;

    #[test]
    fn new_promise_is_pending_until_a_turn_runs() {
        init_test_logging();
        let rt = LocalRuntime::default();
        let p: Promise<i32, &str> = rt.resolved(7);
        assert!(p.is_pending());

        rt.run_until_idle().unwrap();
        assert_eq!(p.state(), PromiseState::Fulfilled(7));
    }

    #[test]
    fn setup_runs_synchronously_once() {
        init_test_logging();
        let rt = LocalRuntime::default();
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let _p: Promise<(), &str> = rt.promise(move |resolver| {
            seen.set(seen.get() + 1);
            resolver.resolve(());
            Ok(())
        });
        assert_eq!(calls.get(), 1);
        rt.run_until_idle().unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn setup_error_rejects() {
        init_test_logging();
        let rt = LocalRuntime::default();
        let p: Promise<i32, String> = rt.promise(|_resolver| Err("setup failed".to_string()));
        assert_eq!(rt.block_on(&p).unwrap(), Err("setup failed".to_string()));
    }

    #[test]
    fn first_entry_point_to_run_wins() {
        init_test_logging();
        let rt = LocalRuntime::default();
        let p: Promise<i32, &str> = rt.promise(|resolver| {
            resolver.resolve(1);
            resolver.reject("late");
            resolver.resolve(2);
            Ok(())
        });
        rt.run_until_idle().unwrap();
        assert_eq!(p.state(), PromiseState::Fulfilled(1));
    }

    #[test]
    fn settlement_after_error_return_is_kept() {
        init_test_logging();
        let rt = LocalRuntime::default();
        // resolve was queued before the setup error, so it runs first.
        let p: Promise<i32, &str> = rt.promise(|resolver| {
            resolver.resolve(5);
            Err("ignored")
        });
        rt.run_until_idle().unwrap();
        assert_eq!(p.state(), PromiseState::Fulfilled(5));
    }

    #[test]
    fn locked_container_ignores_direct_settlement() {
        init_test_logging();
        let rt = LocalRuntime::default();
        let (inner_resolver, inner) = {
            let slot = Rc::new(RefCell::new(None));
            let keep = Rc::clone(&slot);
            let p: Promise<i32, &str> = rt.promise(move |r| {
                *keep.borrow_mut() = Some(r);
                Ok(())
            });
            let resolver = slot.borrow_mut().take().unwrap();
            (resolver, p)
        };
        let outer: Promise<i32, &str> = rt.promise(|r| {
            r.adopt(inner.clone());
            r.resolve(99);
            Ok(())
        });
        rt.run_until_idle().unwrap();
        assert!(outer.is_pending());

        inner_resolver.resolve(3);
        rt.run_until_idle().unwrap();
        assert_eq!(outer.state(), PromiseState::Fulfilled(3));
    }

    #[test]
    fn self_adoption_stays_pending() {
        init_test_logging();
        let rt = recording_runtime();
        let slot = Rc::new(RefCell::new(None));
        let keep = Rc::clone(&slot);
        let p: Promise<i32, &str> = rt.promise(move |r| {
            *keep.borrow_mut() = Some(r);
            Ok(())
        });
        let resolver = slot.borrow_mut().take().unwrap();
        resolver.adopt(p.clone());
        rt.run_until_idle().unwrap();
        assert!(p.is_pending());
        assert!(rt
            .trace_events()
            .iter()
            .any(|e| e.promise == p.id() && e.kind == PromiseEventKind::Adopted));
    }

    #[test]
    fn two_hop_adoption_cycle_stays_pending() {
        init_test_logging();
        let rt = recording_runtime();
        let (a, a_resolver) = {
            let slot = Rc::new(RefCell::new(None));
            let keep = Rc::clone(&slot);
            let p: Promise<i32, &str> = rt.promise(move |r| {
                *keep.borrow_mut() = Some(r);
                Ok(())
            });
            let resolver = slot.borrow_mut().take().unwrap();
            (p, resolver)
        };
        let b = Promise::adopting(&rt.scheduler(), a.clone());
        a_resolver.adopt(b.clone());
        rt.run_until_idle().unwrap();

        assert!(a.is_pending());
        assert!(b.is_pending());
        // b follows a; the closing edge is never recorded.
        assert!(a.inner.borrow().adoptee.is_none());
        assert!(b.inner.borrow().adoptee.is_some());
        assert!(rt.unhandled_rejections().is_empty());
    }

    #[test]
    fn claims_balance_after_adoption_runs() {
        init_test_logging();
        let rt = recording_runtime();
        let inner: Promise<i32, &str> = rt.resolved(1);
        let outer: Promise<i32, &str> = rt.promise(|r| {
            r.adopt(inner.clone());
            r.adopt(inner.clone());
            Ok(())
        });
        assert_eq!(inner.inner.borrow().claims, 2);
        rt.run_until_idle().unwrap();
        assert_eq!(inner.inner.borrow().claims, 0);
        assert_eq!(outer.state(), PromiseState::Fulfilled(1));
    }

    #[test]
    fn late_registration_is_delivered_once() {
        init_test_logging();
        let rt = LocalRuntime::default();
        let p: Promise<i32, &str> = rt.resolved(4);
        rt.run_until_idle().unwrap();

        let hits = Rc::new(Cell::new(0));
        let a = Rc::clone(&hits);
        let b = Rc::clone(&hits);
        p.register(move |v| a.set(a.get() + v), |_| {});
        p.register(move |v| b.set(b.get() + v), |_| {});
        assert_eq!(hits.get(), 0);
        assert_eq!(rt.pending_tasks(), 1);

        rt.run_until_idle().unwrap();
        assert_eq!(hits.get(), 8);
        rt.run_until_idle().unwrap();
        assert_eq!(hits.get(), 8);
    }

    #[test]
    fn unhandled_rejection_is_reported_once() {
        init_test_logging();
        let rt = recording_runtime();
        let p: Promise<i32, &str> = rt.rejected("lost");
        rt.run_until_idle().unwrap();
        assert_eq!(rt.unhandled_rejections().len(), 1);

        // A late handler still receives the reason and does not re-report.
        let got = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&got);
        p.register(|_| {}, move |e| *sink.borrow_mut() = Some(e));
        rt.run_until_idle().unwrap();
        assert_eq!(*got.borrow(), Some("lost"));
        assert_eq!(rt.unhandled_rejections().len(), 1);
    }

    #[test]
    fn handled_rejection_is_not_reported() {
        init_test_logging();
        let rt = recording_runtime();
        let p: Promise<i32, &str> = rt.rejected("seen");
        p.observe();
        rt.run_until_idle().unwrap();
        assert!(rt.unhandled_rejections().is_empty());
    }

    #[test]
    fn adopted_rejection_is_not_reported_before_adoption_runs() {
        init_test_logging();
        let rt = recording_runtime();
        let inner: Promise<i32, &str> = rt.rejected("inner");
        let outer = Promise::adopting(&rt.scheduler(), inner);
        let _recovered = outer.catch(|_| Ok(0));
        rt.run_until_idle().unwrap();
        assert!(rt.unhandled_rejections().is_empty());
        assert_eq!(outer.state(), PromiseState::Rejected("inner"));
    }

    #[test]
    fn resolver_settle_dispatches_resolution() {
        init_test_logging();
        let rt = LocalRuntime::default();
        let p: Promise<i32, &str> = rt.promise(|r| {
            r.settle(Resolution::from(Ok::<i32, &str>(11)));
            Ok(())
        });
        assert_eq!(rt.block_on(&p).unwrap(), Ok(11));
    }

    #[test]
    fn clones_alias_one_container() {
        init_test_logging();
        let rt = LocalRuntime::default();
        let p: Promise<i32, &str> = rt.resolved(1);
        let q = p.clone();
        assert!(p.ptr_eq(&q));
        assert_eq!(p.id(), q.id());
        rt.run_until_idle().unwrap();
        assert!(q.is_fulfilled());
    }
}
