//! Incremental stream events on both sides of the reframer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::model::ModelIdentifier;

/// One incremental unit received from the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamEvent {
    /// Text fragment; may be empty (role-only or usage-only chunks).
    pub delta: String,
    /// Set on the chunk where the backend reports why it stopped.
    pub finish_reason: Option<String>,
}

impl StreamEvent {
    /// A plain text delta with no finish reason.
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            delta: text.into(),
            finish_reason: None,
        }
    }

    /// An empty delta carrying a finish reason.
    pub fn finish(reason: impl Into<String>) -> Self {
        Self {
            delta: String::new(),
            finish_reason: Some(reason.into()),
        }
    }
}

/// Token counters reported on the terminal event.
///
/// The backend does not report per-phase timing, so these are always zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub total_duration: u64,
    pub load_duration: u64,
    pub prompt_eval_count: u32,
    pub prompt_eval_duration: u64,
    pub eval_count: u32,
    pub eval_duration: u64,
}

/// One event emitted towards the client.
///
/// Exactly one `Terminal` is emitted per successful stream and it is always
/// last. An aborted stream ends with at most one `Error` and no `Terminal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReframedEvent {
    Delta {
        model: ModelIdentifier,
        created_at: DateTime<Utc>,
        content: String,
    },
    Terminal {
        model: ModelIdentifier,
        created_at: DateTime<Utc>,
        finish_reason: String,
        usage: Usage,
    },
    Error {
        message: String,
    },
}

impl ReframedEvent {
    /// Whether this event marks successful completion.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal { .. })
    }
}
