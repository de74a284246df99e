use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Who produced an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Ai,
    Candidate,
}

/// One utterance in the interview transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Monotonic per-session sequence number.
    pub id: u64,

    /// Seconds from session start at insertion time.
    pub timestamp_secs: u64,

    pub speaker: Speaker,

    pub text: String,

    /// Recognition confidence, clamped to [0, 1].
    pub confidence: f32,
}

/// Append-only, insertion-ordered utterance log. Entries are never
/// mutated, removed, or re-sorted; out-of-order network delivery keeps
/// its arrival order. Appends happen under one lock so a reader can
/// never observe a half-written entry.
pub struct Transcript {
    entries: Mutex<Vec<TranscriptEntry>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append an utterance, assigning the next sequence id and the given
    /// elapsed timestamp. Returns a copy of the stored entry.
    pub async fn append(
        &self,
        speaker: Speaker,
        text: String,
        confidence: f32,
        timestamp_secs: u64,
    ) -> TranscriptEntry {
        let mut entries = self.entries.lock().await;
        let entry = TranscriptEntry {
            id: entries.len() as u64,
            timestamp_secs,
            speaker,
            text,
            confidence: confidence.clamp(0.0, 1.0),
        };
        entries.push(entry.clone());
        entry
    }

    /// Immutable copy for persistence or analysis.
    pub async fn snapshot(&self) -> Vec<TranscriptEntry> {
        let entries = self.entries.lock().await;
        entries.clone()
    }

    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.len()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
