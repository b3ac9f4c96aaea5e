//! Scheduling seam and the reference single-threaded runtime.
//!
//! - [`scheduler`]: the [`Schedule`] trait hosts implement, and the
//!   [`Scheduler`] handle promises carry
//! - [`local`]: [`LocalRuntime`], a FIFO microtask run loop
//! - [`config`] / [`env_config`]: runtime configuration and env overrides
//! - [`rejection`]: unhandled-rejection reports and escalation policy

pub mod config;
pub mod env_config;
pub mod local;
pub mod rejection;
pub mod scheduler;

pub use config::RuntimeConfig;
pub use local::LocalRuntime;
pub use rejection::{RejectionPolicy, UnhandledRejection};
pub use scheduler::{Microtask, Schedule, Scheduler};
