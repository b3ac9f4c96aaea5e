//! Lifecycle tracing for promise containers.
//!
//! Hosts that implement [`Schedule::trace`](crate::runtime::Schedule::trace)
//! receive one [`PromiseEvent`] per observable step. The reference runtime
//! keeps them in a [`TraceBuffer`] so tests can assert on ordering and
//! export a run as NDJSON.
//!
//! # Submodules
//!
//! - [`event`]: Lifecycle events
//! - [`buffer`]: Ring buffer for recent events

pub mod buffer;
pub mod event;

pub use buffer::TraceBuffer;
pub use event::{PromiseEvent, PromiseEventKind};
