//! Configuration for the reference runtime.
//!
//! The runtime configuration controls:
//! - How many turns a single run call may execute
//! - What happens to unhandled rejections
//! - Trace buffer size

use serde::{Deserialize, Serialize};

use super::rejection::RejectionPolicy;

/// Configuration for [`LocalRuntime`](super::LocalRuntime).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum number of turns one `run_until_idle`/`block_on` call may run.
    ///
    /// `None` disables the limit.
    pub max_turns: Option<u64>,
    /// Escalation policy for unhandled rejections.
    pub rejection_policy: RejectionPolicy,
    /// Lifecycle trace buffer capacity.
    pub trace_capacity: usize,
}

impl RuntimeConfig {
    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_turns: Some(100_000),
            rejection_policy: RejectionPolicy::Panic,
            trace_capacity: 4096,
        }
    }

    /// Loads the default configuration with `PROMISSORY_*` overrides applied.
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Self::new();
        super::env_config::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Sets the per-call turn limit.
    #[must_use]
    pub const fn max_turns(mut self, turns: u64) -> Self {
        self.max_turns = Some(turns);
        self
    }

    /// Disables the turn limit.
    #[must_use]
    pub const fn no_turn_limit(mut self) -> Self {
        self.max_turns = None;
        self
    }

    /// Sets the unhandled-rejection policy.
    #[must_use]
    pub const fn rejection_policy(mut self, policy: RejectionPolicy) -> Self {
        self.rejection_policy = policy;
        self
    }

    /// Sets the trace buffer capacity.
    #[must_use]
    pub const fn trace_capacity(mut self, capacity: usize) -> Self {
        self.trace_capacity = capacity;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}
