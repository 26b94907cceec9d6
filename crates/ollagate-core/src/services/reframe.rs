//! Stream reframer: backend events in, client events out.
//!
//! ```text
//! Streaming ──end-of-stream──▶ Draining ──terminal sent──▶ Done
//!     │                            │
//!     └──backend error / sink closed──┴──────────────────▶ Aborted
//! ```
//!
//! Every non-empty delta is forwarded as soon as it arrives, one event per
//! backend event, in backend order. Finish reasons are remembered and only
//! reported on the single terminal event. A backend failure produces one
//! best-effort error event and no terminal event, so clients must treat a
//! closed stream without `done: true` as a failure.

use chrono::Utc;
use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::domain::{ModelIdentifier, ReframedEvent, StreamEvent, Usage};
use crate::error::GatewayError;
use crate::ports::{BackendError, EventSink};

/// Finish reason reported when the backend never sent one.
pub const DEFAULT_FINISH_REASON: &str = "stop";

/// Reframer lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReframerState {
    Streaming,
    Draining,
    Done,
    Aborted,
}

/// How a reframed stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Terminal event delivered.
    Completed { finish_reason: String, deltas: usize },
    /// The backend failed mid-stream; an error event was attempted.
    BackendFailed { message: String, deltas: usize },
    /// The client stopped accepting events.
    ClientDisconnected { deltas: usize },
}

impl StreamOutcome {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// State machine converting one backend stream into client events.
#[derive(Debug)]
pub struct StreamReframer {
    model: ModelIdentifier,
    state: ReframerState,
    last_finish_reason: Option<String>,
    deltas: usize,
}

impl StreamReframer {
    #[must_use]
    pub const fn new(model: ModelIdentifier) -> Self {
        Self {
            model,
            state: ReframerState::Streaming,
            last_finish_reason: None,
            deltas: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ReframerState {
        self.state
    }

    /// Number of delta events produced so far.
    #[must_use]
    pub const fn deltas(&self) -> usize {
        self.deltas
    }

    /// Feed one backend event. Returns the event to emit, if any.
    pub fn on_event(&mut self, event: StreamEvent) -> Option<ReframedEvent> {
        if self.state != ReframerState::Streaming {
            return None;
        }

        if let Some(reason) = event.finish_reason.filter(|r| !r.is_empty()) {
            self.last_finish_reason = Some(reason);
        }

        if event.delta.is_empty() {
            return None;
        }

        self.deltas += 1;
        Some(ReframedEvent::Delta {
            model: self.model.clone(),
            created_at: Utc::now(),
            content: event.delta,
        })
    }

    /// Backend signalled end-of-stream. Moves to `Draining` and returns the
    /// terminal event; call [`Self::mark_done`] once it has been delivered.
    pub fn on_end(&mut self) -> Option<ReframedEvent> {
        if self.state != ReframerState::Streaming {
            return None;
        }
        self.state = ReframerState::Draining;

        Some(ReframedEvent::Terminal {
            model: self.model.clone(),
            created_at: Utc::now(),
            finish_reason: self
                .last_finish_reason
                .clone()
                .unwrap_or_else(|| DEFAULT_FINISH_REASON.to_string()),
            usage: Usage::default(),
        })
    }

    /// Terminal event delivered.
    pub fn mark_done(&mut self) {
        if self.state == ReframerState::Draining {
            self.state = ReframerState::Done;
        }
    }

    /// Backend failed. Moves to `Aborted` and returns the error event to
    /// attempt once.
    pub fn on_error(&mut self, err: &BackendError) -> Option<ReframedEvent> {
        if matches!(self.state, ReframerState::Done | ReframerState::Aborted) {
            return None;
        }
        self.state = ReframerState::Aborted;
        Some(ReframedEvent::Error {
            message: GatewayError::StreamAborted(err.to_string()).to_string(),
        })
    }

    /// The sink is gone. No further events will be produced.
    pub fn on_sink_closed(&mut self) {
        self.state = ReframerState::Aborted;
    }

    /// Drive `stream` to completion, writing into `sink`.
    ///
    /// Returns after `Done` or `Aborted`. The backend stream is consumed by
    /// value and dropped on every exit path.
    pub async fn run<S, W>(mut self, mut stream: S, sink: &mut W) -> StreamOutcome
    where
        S: Stream<Item = Result<StreamEvent, BackendError>> + Unpin + Send,
        W: EventSink + ?Sized,
    {
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => {
                    let Some(out) = self.on_event(event) else {
                        continue;
                    };
                    if sink.send(out).await.is_err() {
                        return self.client_gone();
                    }
                }
                Err(e) => {
                    warn!(model = %self.model, "Backend stream error: {e}");
                    if let Some(out) = self.on_error(&e) {
                        // Best effort: the client may already be gone.
                        let _ = sink.send(out).await;
                    }
                    return StreamOutcome::BackendFailed {
                        message: e.to_string(),
                        deltas: self.deltas,
                    };
                }
            }
        }

        let Some(terminal) = self.on_end() else {
            return self.client_gone();
        };
        let finish_reason = match &terminal {
            ReframedEvent::Terminal { finish_reason, .. } => finish_reason.clone(),
            _ => DEFAULT_FINISH_REASON.to_string(),
        };
        if sink.send(terminal).await.is_err() {
            return self.client_gone();
        }
        self.mark_done();

        debug!(model = %self.model, deltas = self.deltas, %finish_reason, "Stream completed");
        StreamOutcome::Completed {
            finish_reason,
            deltas: self.deltas,
        }
    }

    fn client_gone(&mut self) -> StreamOutcome {
        debug!(model = %self.model, "Client disconnected mid-stream");
        self.on_sink_closed();
        StreamOutcome::ClientDisconnected {
            deltas: self.deltas,
        }
    }
}
