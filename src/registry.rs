use crate::connector::Connector;
use crate::error::SessionError;
use crate::session::{CompletionReason, InterviewConfig, Session};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Concurrent map of session id to live session. This is the only
/// component touched by multiple transport connections at once; each
/// session behind it is single-owner.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create and register a session. The id must be unused; a
    /// completed session's id is never reused either, a new interview
    /// gets a new id.
    pub async fn create(
        &self,
        config: InterviewConfig,
        connector: Box<dyn Connector>,
    ) -> Result<Arc<Session>, SessionError> {
        let id = config.session_id.clone();
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return Err(SessionError::DuplicateSession(id));
        }
        let session = Session::new(config, connector);
        sessions.insert(id.clone(), Arc::clone(&session));
        info!(session_id = %id, "Session registered");
        Ok(session)
    }

    pub async fn get(&self, id: &str) -> Result<Arc<Session>, SessionError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Remove a completed session. Removing a live session is a caller
    /// bug and is rejected.
    pub async fn remove(&self, id: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        if !session.is_completed() {
            return Err(SessionError::SessionLive(id.to_string()));
        }
        sessions.remove(id);
        info!(session_id = %id, "Session removed");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Process-wide shutdown sweep: every live session gets a
    /// best-effort chance to deliver its closing message, bounded by
    /// one global timeout so a stuck engine cannot hang the process.
    pub async fn shutdown_all(&self, timeout: Duration) {
        let sessions: Vec<Arc<Session>> = {
            let map = self.sessions.read().await;
            map.values().cloned().collect()
        };
        let live: Vec<Arc<Session>> = sessions
            .into_iter()
            .filter(|s| !s.is_completed())
            .collect();
        if live.is_empty() {
            return;
        }

        info!(count = live.len(), "Shutting down live sessions");
        for session in &live {
            session
                .request_completion(CompletionReason::Shutdown)
                .await;
        }

        let all_done = futures::future::join_all(
            live.iter().map(|session| session.wait_completed()),
        );
        if tokio::time::timeout(timeout, all_done).await.is_err() {
            warn!(
                timeout_secs = timeout.as_secs(),
                "Shutdown timeout expired with sessions still live"
            );
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
