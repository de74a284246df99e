use crate::session::{OutboundEvent, Stage, TranscriptEntry, WarningKind};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Frames accepted from a WebSocket client, as a closed tagged union so
/// a new frame kind is a compile-time-checked addition.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    AudioChunk {
        /// Base64-encoded PCM bytes.
        data: String,
    },
    Control {
        action: ControlAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Start,
    End,
}

/// Frames pushed to a WebSocket client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
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
        /// Base64-encoded PCM bytes.
        data: String,
    },
    SessionError {
        message: String,
    },
}

impl From<OutboundEvent> for ServerMessage {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::StageChanged { stage } => ServerMessage::StageChanged { stage },
            OutboundEvent::TimeUpdate {
                elapsed_secs,
                remaining_secs,
                percent,
            } => ServerMessage::TimeUpdate {
                elapsed_secs,
                remaining_secs,
                percent,
            },
            OutboundEvent::TimeWarning { kind } => ServerMessage::TimeWarning { kind },
            OutboundEvent::TranscriptAppended { entry } => {
                ServerMessage::TranscriptAppended { entry }
            }
            OutboundEvent::AudioOut { data } => ServerMessage::AudioOut {
                data: base64::engine::general_purpose::STANDARD.encode(&data),
            },
            OutboundEvent::SessionError { message } => ServerMessage::SessionError { message },
        }
    }
}
