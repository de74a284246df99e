use super::messages::{EngineInbound, EngineOutbound};
use super::{Connector, ConnectorEvent, ConnectorFrame};
use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine;
use futures::stream::StreamExt;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Connector that bridges a session to the conversational engine over
/// NATS: session frames go out on a per-session subject, engine output
/// arrives on a shared subject and is filtered by session id.
pub struct NatsConnector {
    url: String,
    session_id: String,
    client: Option<Client>,
    sequence: AtomicU32,
    pump: Option<JoinHandle<()>>,
}

impl NatsConnector {
    pub fn new(url: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session_id: session_id.into(),
            client: None,
            sequence: AtomicU32::new(0),
            pump: None,
        }
    }

    fn inbound_subject(&self) -> String {
        format!("interview.engine.in.{}", self.session_id)
    }
}

#[async_trait::async_trait]
impl Connector for NatsConnector {
    async fn connect(&mut self) -> Result<mpsc::Receiver<ConnectorEvent>> {
        info!("Connecting to engine via NATS at {}", self.url);

        let client = async_nats::connect(&self.url)
            .await
            .context("Failed to connect to NATS")?;

        // Engine output is published on a shared hierarchy; filter by
        // the session id carried in each payload.
        let mut subscriber = client
            .subscribe("interview.engine.out.>")
            .await
            .context("Failed to subscribe to engine output")?;

        let (tx, rx) = mpsc::channel(256);
        let session_id = self.session_id.clone();

        let pump = tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                let outbound = match serde_json::from_slice::<EngineOutbound>(&msg.payload) {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("Failed to parse engine message: {}", e);
                        continue;
                    }
                };
                if outbound.session_id() != session_id {
                    continue;
                }

                let event = match outbound {
                    EngineOutbound::Audio { pcm, .. } => {
                        match base64::engine::general_purpose::STANDARD.decode(&pcm) {
                            Ok(bytes) => ConnectorEvent::AudioOut(bytes),
                            Err(e) => {
                                warn!("Failed to decode engine audio: {}", e);
                                continue;
                            }
                        }
                    }
                    EngineOutbound::Utterance {
                        speaker,
                        text,
                        confidence,
                        ..
                    } => ConnectorEvent::TextOut {
                        speaker,
                        text,
                        confidence,
                    },
                    EngineOutbound::TurnComplete { .. } => ConnectorEvent::TurnComplete,
                    EngineOutbound::Error { message, .. } => ConnectorEvent::Error(message),
                };

                if tx.send(event).await.is_err() {
                    break;
                }
            }

            // Subscriber stream ended underneath us: the session must
            // see this as a terminal failure, not a silent stall.
            let _ = tx
                .send(ConnectorEvent::Error("engine stream closed".to_string()))
                .await;
        });

        self.client = Some(client);
        self.pump = Some(pump);

        info!("Engine connection established for session {}", self.session_id);
        Ok(rx)
    }

    async fn send(&self, frame: ConnectorFrame) -> Result<()> {
        let client = self
            .client
            .as_ref()
            .context("Connector is not connected")?;

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let timestamp = chrono::Utc::now().to_rfc3339();

        let message = match frame {
            ConnectorFrame::Audio(bytes) => EngineInbound::Audio {
                session_id: self.session_id.clone(),
                sequence,
                pcm: base64::engine::general_purpose::STANDARD.encode(&bytes),
                timestamp,
            },
            ConnectorFrame::Text(text) => EngineInbound::Text {
                session_id: self.session_id.clone(),
                sequence,
                text,
                timestamp,
            },
        };

        let payload = serde_json::to_vec(&message)?;
        client
            .publish(self.inbound_subject(), payload.into())
            .await
            .context("Failed to publish engine frame")?;

        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if self.client.take().is_some() {
            info!("Closed engine connection for session {}", self.session_id);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "nats"
    }
}
