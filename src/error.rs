//! Error types for the runtime and configuration layers.
//!
//! Promise rejections are *values* (`E` in `Promise<T, E>`) and never pass
//! through this module. The types here describe failures of the machinery
//! around promises:
//!
//! - **Config**: an environment override could not be parsed
//! - **Run loop**: the turn limit was hit, or a promise can no longer settle
//! - **Internal**: a broken invariant (bug)

use core::fmt;

use crate::types::PromiseId;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // === Configuration ===
    /// A configuration value was malformed.
    InvalidConfig,

    // === Run loop ===
    /// The run loop reached its configured turn limit.
    TurnLimitExceeded,
    /// The microtask queue drained while the awaited promise was still pending.
    Stalled,

    // === Internal ===
    /// Internal runtime error (bug).
    Internal,
}

impl ErrorKind {
    /// Returns the error category for this kind.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig => ErrorCategory::Config,
            Self::TurnLimitExceeded | Self::Stalled => ErrorCategory::RunLoop,
            Self::Internal => ErrorCategory::Internal,
        }
    }
}

/// High-level error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration failures.
    Config,
    /// Run-loop progress failures.
    RunLoop,
    /// Internal runtime errors.
    Internal,
}

/// The main error type for runtime operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    promise: Option<PromiseId>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            promise: None,
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Adds a message description to the error.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Attaches the promise the error concerns.
    #[must_use]
    pub const fn with_promise(mut self, id: PromiseId) -> Self {
        self.promise = Some(id);
        self
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the promise the error concerns, if any.
    #[must_use]
    pub const fn promise(&self) -> Option<PromiseId> {
        self.promise
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn invalid_config(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfig).with_message(detail)
    }

    /// Creates a turn-limit error.
    #[must_use]
    pub fn turn_limit(limit: u64) -> Self {
        Self::new(ErrorKind::TurnLimitExceeded)
            .with_message(format!("run loop stopped after {limit} turns"))
    }

    /// Creates a stall error for a promise that can no longer settle.
    #[must_use]
    pub fn stalled(id: PromiseId) -> Self {
        Self::new(ErrorKind::Stalled)
            .with_message("microtask queue drained with the promise still pending")
            .with_promise(id)
    }

    /// Creates an internal error (runtime bug).
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal).with_message(detail)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(id) = self.promise {
            write!(f, " [{id}]")?;
        }
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

/// A specialized Result type for runtime operations.
pub type Result<T> = core::result::Result<T, Error>;
