use super::events::Stage;
use super::transcript::TranscriptEntry;
use serde::Serialize;

/// Read-only view of a session, safe to take at any time. After
/// completion every field is frozen at its final value.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub stage: Stage,
    pub elapsed_secs: u64,
    pub scheduled_duration_secs: u64,
    pub question_count: u32,
    pub connected: bool,
    pub transcript: Vec<TranscriptEntry>,
}
