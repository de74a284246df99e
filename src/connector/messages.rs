use crate::session::Speaker;
use serde::{Deserialize, Serialize};

/// Frame published by the orchestrator to the engine.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineInbound {
    Audio {
        session_id: String,
        sequence: u32,
        /// Base64-encoded PCM bytes.
        pcm: String,
        /// RFC3339 wall timestamp.
        timestamp: String,
    },
    Text {
        session_id: String,
        sequence: u32,
        text: String,
        timestamp: String,
    },
}

/// Message received from the engine's output subject.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineOutbound {
    Audio {
        session_id: String,
        /// Base64-encoded PCM bytes.
        pcm: String,
    },
    Utterance {
        session_id: String,
        speaker: Speaker,
        text: String,
        confidence: f32,
    },
    TurnComplete {
        session_id: String,
    },
    Error {
        session_id: String,
        message: String,
    },
}

impl EngineOutbound {
    pub fn session_id(&self) -> &str {
        match self {
            EngineOutbound::Audio { session_id, .. }
            | EngineOutbound::Utterance { session_id, .. }
            | EngineOutbound::TurnComplete { session_id }
            | EngineOutbound::Error { session_id, .. } => session_id,
        }
    }
}
