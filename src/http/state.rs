use crate::registry::SessionRegistry;
use crate::session::InterviewDefaults;
use std::sync::Arc;

/// Shared application state for HTTP and WebSocket handlers.
#[derive(Clone)]
pub struct AppState {
    /// All live sessions (session_id → session).
    pub registry: Arc<SessionRegistry>,

    /// NATS URL for new engine connectors.
    pub nats_url: String,

    /// Defaults each interview's config is resolved from.
    pub defaults: InterviewDefaults,
}

impl AppState {
    pub fn new(nats_url: String, defaults: InterviewDefaults) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            nats_url,
            defaults,
        }
    }
}
