//! Promissory: settle-once deferred values for single-threaded hosts.
//!
//! # Overview
//!
//! A [`Promise`] is a single-assignment container that eventually holds a
//! value or a failure reason. Settlement and reaction delivery never happen
//! synchronously: they are handed to a host scheduler as FIFO microtasks, so
//! code that follows a `then` call always runs before the reaction does.
//!
//! # Core Guarantees
//!
//! - **Settle once**: a container leaves `Pending` at most once and never
//!   goes back; later settlement attempts are silent no-ops
//! - **Deferred delivery**: reactions run on a later turn, in registration
//!   order, even when the container had already settled
//! - **Flattening**: a container settled with another container adopts its
//!   eventual outcome, at any nesting depth
//! - **No silent loss**: a rejection that reaches its flush with no
//!   reject-path reaction is escalated to the host
//!
//! # Module Structure
//!
//! - [`promise`]: the container, its resolver, and chaining
//! - [`combinator`]: `all`, `all_settled`, `race`, `any`
//! - [`runtime`]: the scheduling seam and the reference [`LocalRuntime`]
//! - [`trace`]: lifecycle events and the trace ring buffer
//! - [`types`]: identifiers and outcome types
//! - [`error`]: run-loop and configuration errors
//!
//! # Example
//!
//! ```
//! use promissory::{combinator, LocalRuntime, Promise};
//!
//! let rt = LocalRuntime::default();
//! let s = rt.scheduler();
//! let a: Promise<i32, String> = rt.resolved(1);
//! let b = rt.resolved(2).then(|v: i32| Ok(v * 10));
//! let sum = combinator::all(&s, vec![a, b]).then(|vs| Ok(vs.iter().sum::<i32>()));
//! assert_eq!(rt.block_on(&sum).unwrap(), Ok(21));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod combinator;
pub mod error;
pub mod promise;
pub mod runtime;
pub mod trace;
pub mod types;

#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

pub use error::{Error, ErrorCategory, ErrorKind, Result};
pub use promise::{Promise, Resolution, Resolver};
pub use runtime::{
    LocalRuntime, RejectionPolicy, RuntimeConfig, Schedule, Scheduler, UnhandledRejection,
};
pub use trace::{PromiseEvent, PromiseEventKind, TraceBuffer};
pub use types::{AggregateError, PromiseId, PromiseState, SettledOutcome, Turn};
