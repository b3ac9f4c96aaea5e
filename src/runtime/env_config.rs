//! Environment variable support for [`RuntimeConfig`].
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic**: builder methods applied after loading
//! 2. **Environment variables**: values from `PROMISSORY_*` env vars
//! 3. **Defaults**: [`RuntimeConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `PROMISSORY_MAX_TURNS` | `u64` (`0` = unlimited) | `max_turns` |
//! | `PROMISSORY_UNHANDLED_REJECTION` | `panic`/`warn`/`record` | `rejection_policy` |
//! | `PROMISSORY_TRACE_CAPACITY` | `usize` | `trace_capacity` |

use super::config::RuntimeConfig;
use crate::error::Error;

/// Environment variable name for the per-call turn limit.
pub const ENV_MAX_TURNS: &str = "PROMISSORY_MAX_TURNS";
/// Environment variable name for the unhandled-rejection policy.
pub const ENV_UNHANDLED_REJECTION: &str = "PROMISSORY_UNHANDLED_REJECTION";
/// Environment variable name for the trace buffer capacity.
pub const ENV_TRACE_CAPACITY: &str = "PROMISSORY_TRACE_CAPACITY";

/// Apply environment variable overrides to a [`RuntimeConfig`].
///
/// Only variables that are set in the environment are applied.
/// Returns an error if a variable is set but contains an unparseable value.
pub fn apply_env_overrides(config: &mut RuntimeConfig) -> Result<(), Error> {
    apply_overrides_from(config, |name| std::env::var(name).ok())
}

/// Apply overrides from an arbitrary lookup (the environment, a map, ...).
pub fn apply_overrides_from<L>(config: &mut RuntimeConfig, lookup: L) -> Result<(), Error>
where
    L: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(ENV_MAX_TURNS) {
        let turns = parse_u64(ENV_MAX_TURNS, &val)?;
        config.max_turns = (turns > 0).then_some(turns);
    }
    if let Some(val) = lookup(ENV_UNHANDLED_REJECTION) {
        config.rejection_policy = val.parse().map_err(|e: Error| {
            Error::invalid_config(format!(
                "invalid value for {ENV_UNHANDLED_REJECTION}: {}",
                e.message().unwrap_or("unparseable")
            ))
        })?;
    }
    if let Some(val) = lookup(ENV_TRACE_CAPACITY) {
        config.trace_capacity = parse_usize(ENV_TRACE_CAPACITY, &val)?;
    }
    tracing::debug!(
        max_turns = ?config.max_turns,
        rejection_policy = %config.rejection_policy,
        trace_capacity = config.trace_capacity,
        "runtime config resolved"
    );
    Ok(())
}

fn parse_u64(var_name: &str, val: &str) -> Result<u64, Error> {
    val.trim().parse::<u64>().map_err(|e| {
        Error::invalid_config(format!(
            "invalid value for {var_name}: expected unsigned integer, got {val:?} ({e})"
        ))
    })
}

fn parse_usize(var_name: &str, val: &str) -> Result<usize, Error> {
    val.trim().parse::<usize>().map_err(|e| {
        Error::invalid_config(format!(
            "invalid value for {var_name}: expected unsigned integer, got {val:?} ({e})"
        ))
    })
}
