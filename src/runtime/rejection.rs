//! Unhandled-rejection reports and the policy for escalating them.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{PromiseId, Turn};

/// What the reference runtime does with an unhandled rejection.
///
/// Every policy records the report; they differ in how loudly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionPolicy {
    /// Log at `error` level and panic out of the run loop.
    #[default]
    Panic,
    /// Log at `warn` level and keep running.
    Warn,
    /// Only record; log at `debug` level.
    Record,
}

impl RejectionPolicy {
    /// Returns the configuration spelling of the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Panic => "panic",
            Self::Warn => "warn",
            Self::Record => "record",
        }
    }
}

impl fmt::Display for RejectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RejectionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "panic" => Ok(Self::Panic),
            "warn" => Ok(Self::Warn),
            "record" => Ok(Self::Record),
            other => Err(Error::invalid_config(format!(
                "unknown rejection policy {other:?} (expected panic, warn or record)"
            ))),
        }
    }
}

/// A rejection that no reaction was ever registered to receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnhandledRejection {
    /// The rejected container.
    pub promise: PromiseId,
    /// `Debug` rendering of the rejection reason.
    pub reason: String,
    /// Turn in which the rejection was flushed.
    pub turn: Turn,
}

impl UnhandledRejection {
    /// Builds a report from a typed reason.
    #[must_use]
    pub fn new<E: fmt::Debug>(promise: PromiseId, reason: &E, turn: Turn) -> Self {
        Self {
            promise,
            reason: format!("{reason:?}"),
            turn,
        }
    }
}

impl fmt::Display for UnhandledRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unhandled rejection in {} at {}: {}",
            self.promise, self.turn, self.reason
        )
    }
}
