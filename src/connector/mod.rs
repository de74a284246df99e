//! Connector to the remote conversational engine.
//!
//! The session sees the engine through the `Connector` trait only:
//! `connect` yields the single ordered event stream, `send` is
//! fire-and-forget, and a terminal `Error` event means the session is
//! over (no reconnect; a half-resumed interview would have an ambiguous
//! time base).

mod messages;
mod nats;

pub use messages::{EngineInbound, EngineOutbound};
pub use nats::NatsConnector;

use crate::session::Speaker;
use anyhow::Result;
use tokio::sync::mpsc;

/// A frame sent from the session to the engine.
#[derive(Debug, Clone)]
pub enum ConnectorFrame {
    /// Raw candidate PCM audio.
    Audio(Vec<u8>),
    /// An instruction or script for the model to act on.
    Text(String),
}

/// Events produced by the engine, delivered in stream order.
#[derive(Debug, Clone)]
pub enum ConnectorEvent {
    /// Synthesized interviewer speech.
    AudioOut(Vec<u8>),
    /// A transcribed utterance, from either side of the conversation.
    TextOut {
        speaker: Speaker,
        text: String,
        confidence: f32,
    },
    /// The engine finished its current turn.
    TurnComplete,
    /// Terminal failure; the session completes with reason Error.
    Error(String),
}

/// Duplex channel to the conversational engine.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Establish the channel and return the engine event stream.
    /// Event ordering within the stream is preserved.
    async fn connect(&mut self) -> Result<mpsc::Receiver<ConnectorEvent>>;

    /// Fire-and-forget from the session's perspective; delivery retries
    /// are the connector's business, and persistent failure surfaces as
    /// an `Error` event on the stream (or an `Err` here).
    async fn send(&self, frame: ConnectorFrame) -> Result<()>;

    /// Tear down the channel. Safe to call on an already-dead connector.
    async fn close(&mut self) -> Result<()>;

    /// Connector name for logging.
    fn name(&self) -> &str;
}
