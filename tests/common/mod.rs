// Shared test fixtures: a channel-driven engine connector and config
// builders for short deterministic interviews.
#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use live_interview::{
    Connector, ConnectorEvent, ConnectorFrame, InterviewConfig, InterviewDefaults, Speaker,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Test-side controls for a `MockConnector`: inject engine events,
/// inspect frames the session sent, flip the send-failure switch.
pub struct MockHandle {
    pub events: mpsc::Sender<ConnectorEvent>,
    pub sent: Arc<Mutex<Vec<ConnectorFrame>>>,
    pub fail_send: Arc<AtomicBool>,
}

impl MockHandle {
    pub async fn turn_complete(&self) {
        self.events.send(ConnectorEvent::TurnComplete).await.unwrap();
    }

    pub async fn ai_says(&self, text: &str) {
        self.events
            .send(ConnectorEvent::TextOut {
                speaker: Speaker::Ai,
                text: text.to_string(),
                confidence: 0.95,
            })
            .await
            .unwrap();
    }

    pub async fn candidate_says(&self, text: &str) {
        self.events
            .send(ConnectorEvent::TextOut {
                speaker: Speaker::Candidate,
                text: text.to_string(),
                confidence: 0.9,
            })
            .await
            .unwrap();
    }

    pub async fn engine_error(&self, message: &str) {
        self.events
            .send(ConnectorEvent::Error(message.to_string()))
            .await
            .unwrap();
    }

    /// Texts of all `ConnectorFrame::Text` frames sent so far, in order.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|frame| match frame {
                ConnectorFrame::Text(text) => Some(text.clone()),
                ConnectorFrame::Audio(_) => None,
            })
            .collect()
    }

    pub async fn sent_audio_frames(&self) -> Vec<Vec<u8>> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|frame| match frame {
                ConnectorFrame::Audio(bytes) => Some(bytes.clone()),
                ConnectorFrame::Text(_) => None,
            })
            .collect()
    }
}

/// Engine connector driven entirely by the test body.
pub struct MockConnector {
    events_rx: Option<mpsc::Receiver<ConnectorEvent>>,
    sent: Arc<Mutex<Vec<ConnectorFrame>>>,
    fail_connect: bool,
    fail_send: Arc<AtomicBool>,
}

impl MockConnector {
    pub fn new() -> (Box<MockConnector>, MockHandle) {
        let (events_tx, events_rx) = mpsc::channel(64);
        let sent = Arc::new(Mutex::new(Vec::new()));
        let fail_send = Arc::new(AtomicBool::new(false));
        let connector = Box::new(MockConnector {
            events_rx: Some(events_rx),
            sent: Arc::clone(&sent),
            fail_connect: false,
            fail_send: Arc::clone(&fail_send),
        });
        let handle = MockHandle {
            events: events_tx,
            sent,
            fail_send,
        };
        (connector, handle)
    }

    /// A connector whose handshake always fails.
    pub fn refusing() -> Box<MockConnector> {
        Box::new(MockConnector {
            events_rx: None,
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_connect: true,
            fail_send: Arc::new(AtomicBool::new(false)),
        })
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&mut self) -> Result<mpsc::Receiver<ConnectorEvent>> {
        if self.fail_connect {
            bail!("connection refused");
        }
        Ok(self.events_rx.take().expect("connect called twice"))
    }

    async fn send(&self, frame: ConnectorFrame) -> Result<()> {
        if self.fail_send.load(Ordering::SeqCst) {
            bail!("engine send failed");
        }
        self.sent.lock().await.push(frame);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Defaults tuned for fast deterministic tests: 5 minute minimum,
/// 66/83 warning percents, short graces.
pub fn test_defaults() -> InterviewDefaults {
    InterviewDefaults {
        min_duration_secs: 300,
        max_duration_secs: 1800,
        default_duration_secs: 900,
        first_warning_percent: 66,
        final_warning_percent: 83,
        total_questions: 8,
        tick_interval_secs: 5,
        connect_timeout_secs: 10,
        closing_grace_secs: 4,
        early_completion_grace_secs: 30,
        ..InterviewDefaults::default()
    }
}

pub fn test_config(session_id: &str, duration_secs: u64) -> InterviewConfig {
    InterviewConfig::resolve(
        session_id,
        &test_defaults(),
        "Backend Engineer",
        "Builds and operates distributed services.",
        Some(duration_secs),
    )
    .expect("valid test config")
}
