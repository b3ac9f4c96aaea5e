//! Promise lifecycle events.
//!
//! Each event records one observable step of a container's life. Events are
//! ordered by `seq`, which the recording host assigns monotonically.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::types::{PromiseId, Turn};

/// The kind of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromiseEventKind {
    /// A container was constructed.
    Created,
    /// A container fulfilled.
    Resolved,
    /// A container rejected.
    Rejected,
    /// A container locked itself onto another container's outcome.
    Adopted,
    /// A reaction pair was registered.
    ReactionRegistered,
    /// A settled container delivered its queued reactions.
    Flushed,
    /// A rejection reached a flush with no reject-path reaction.
    UnhandledRejection,
}

impl fmt::Display for PromiseEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
            Self::Adopted => "adopted",
            Self::ReactionRegistered => "reaction_registered",
            Self::Flushed => "flushed",
            Self::UnhandledRejection => "unhandled_rejection",
        };
        f.write_str(name)
    }
}

/// A single recorded lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseEvent {
    /// Sequence number assigned by the recorder.
    pub seq: u64,
    /// Turn during which the event happened (`Turn::ZERO` for synchronous code).
    pub turn: Turn,
    /// The container the event concerns.
    pub promise: PromiseId,
    /// What happened.
    pub kind: PromiseEventKind,
    /// Extra context: the adopted container, the reaction count, and so on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl PromiseEvent {
    /// Creates an event without a sequence number; the recorder assigns it.
    #[must_use]
    pub const fn new(promise: PromiseId, kind: PromiseEventKind) -> Self {
        Self {
            seq: 0,
            turn: Turn::ZERO,
            promise,
            kind,
            detail: None,
        }
    }

    /// Attaches detail text.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for PromiseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {} {}", self.seq, self.turn, self.promise, self.kind)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}
