//! Settlement states and tagged outcomes.
//!
//! A promise is in exactly one of three states:
//!
//! - `Pending`: no outcome yet
//! - `Fulfilled(T)`: settled with a success value
//! - `Rejected(E)`: settled with a failure reason
//!
//! The only legal transitions are `Pending -> Fulfilled` and
//! `Pending -> Rejected`. [`SettledOutcome`] is the index-aligned record
//! produced by `all_settled`.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Observable state of a promise container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromiseState<T, E> {
    /// Not settled yet.
    Pending,
    /// Settled with a success value.
    Fulfilled(T),
    /// Settled with a failure reason.
    Rejected(E),
}

impl<T, E> PromiseState<T, E> {
    /// Returns true while the container has not settled.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true once the container has settled either way.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    /// Returns true if the container fulfilled.
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }

    /// Returns true if the container rejected.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Returns the lowercase state label used in logs and traces.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fulfilled(_) => "fulfilled",
            Self::Rejected(_) => "rejected",
        }
    }

    /// Converts a settled state into a `Result`; `None` while pending.
    pub fn into_result(self) -> Option<Result<T, E>> {
        match self {
            Self::Pending => None,
            Self::Fulfilled(v) => Some(Ok(v)),
            Self::Rejected(e) => Some(Err(e)),
        }
    }

    /// Converts a settled state into a [`SettledOutcome`]; `None` while pending.
    pub fn into_settled(self) -> Option<SettledOutcome<T, E>> {
        self.into_result().map(SettledOutcome::from)
    }
}

impl<T, E> Default for PromiseState<T, E> {
    fn default() -> Self {
        Self::Pending
    }
}

impl<T, E> fmt::Display for PromiseState<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tagged outcome of one input of `all_settled`.
///
/// Serializes as `{"status":"fulfilled","value":..}` or
/// `{"status":"rejected","reason":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SettledOutcome<T, E> {
    /// The input fulfilled.
    Fulfilled {
        /// The success value.
        value: T,
    },
    /// The input rejected.
    Rejected {
        /// The failure reason.
        reason: E,
    },
}

impl<T, E> SettledOutcome<T, E> {
    /// Returns true for the fulfilled variant.
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled { .. })
    }

    /// Returns true for the rejected variant.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Converts back into a `Result`.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Fulfilled { value } => Ok(value),
            Self::Rejected { reason } => Err(reason),
        }
    }
}

impl<T, E> From<Result<T, E>> for SettledOutcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Fulfilled { value },
            Err(reason) => Self::Rejected { reason },
        }
    }
}

/// Rejection reason of `any` when every input rejected.
///
/// Reasons are index-aligned with the inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("all {} promises were rejected", .reasons.len())]
pub struct AggregateError<E> {
    /// One reason per input, in input order.
    pub reasons: Vec<E>,
}

impl<E> AggregateError<E> {
    /// Creates an aggregate error from input-ordered reasons.
    #[must_use]
    pub const fn new(reasons: Vec<E>) -> Self {
        Self { reasons }
    }

    /// Returns true if there were no inputs at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }
}
