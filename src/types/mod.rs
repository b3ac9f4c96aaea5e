//! Core value types shared by the promise, runtime and combinator layers.
//!
//! - [`id`]: Identifier types (`PromiseId`, `Turn`)
//! - [`outcome`]: Settlement states, tagged outcomes, aggregate errors

pub mod id;
pub mod outcome;

pub use id::{PromiseId, Turn};
pub use outcome::{AggregateError, PromiseState, SettledOutcome};
