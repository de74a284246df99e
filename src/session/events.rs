use super::transcript::TranscriptEntry;
use super::warning::WarningKind;
use crate::connector::ConnectorEvent;
use serde::{Deserialize, Serialize};

/// Why a session reached its terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// Normal end requested by the candidate or interviewer.
    Finished,
    /// Question budget exhausted before the time budget.
    EarlyCompletion,
    /// Wall-clock budget exhausted. Expected, not an error.
    Timeout,
    /// Engine failure (handshake loss, mid-session disconnect).
    Error,
    /// Process-wide shutdown sweep.
    Shutdown,
}

/// Interview lifecycle stage. Advances monotonically; `Completed` is
/// absorbing and reachable from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PreStart,
    Greeting,
    Questions,
    WrappingUp,
    SignOff,
    Completed(CompletionReason),
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed(_))
    }
}

/// Inbound events processed by a session's driver task, in arrival order.
/// Ticks travel on a separate channel so the timeout check is never
/// starved by a backlog of these.
#[derive(Debug)]
pub enum SessionEvent {
    /// Raw candidate audio from the transport layer.
    AudioFrame(Vec<u8>),
    /// Event pumped from the conversational engine's stream.
    Connector(ConnectorEvent),
    /// Request to finish (manual end, early-completion timer, shutdown).
    Complete(CompletionReason),
}

/// Everything a session emits, on a single broadcast stream per session.
/// Transport and persistence consumers subscribe and match on kind;
/// the stream closes when the session completes.
#[derive(Debug, Clone)]
pub enum OutboundEvent {
    StageChanged {
        stage: Stage,
    },
    TimeUpdate {
        elapsed_secs: u64,
        remaining_secs: u64,
        percent: f64,
    },
    TimeWarning {
        kind: WarningKind,
    },
    TranscriptAppended {
        entry: TranscriptEntry,
    },
    AudioOut {
        data: Vec<u8>,
    },
    SessionError {
        message: String,
    },
}
