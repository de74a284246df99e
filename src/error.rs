use thiserror::Error;

/// Errors surfaced synchronously by session creation, the registry, and
/// session control calls. Mid-session failures (engine disconnects,
/// timeouts) are not errors at this level; they drive the session into
/// its terminal stage and are reported through the outbound event stream.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Rejected at creation time; never surfaces mid-interview.
    #[error("invalid interview config: {0}")]
    InvalidConfig(String),

    #[error("session {0} already exists")]
    DuplicateSession(String),

    #[error("session {0} not found")]
    NotFound(String),

    /// The conversational engine could not be reached during start.
    /// The session is unusable; callers create a new one rather than retry.
    #[error("failed to connect to the conversational engine: {0}")]
    ConnectorInit(String),

    #[error("session {0} already started")]
    AlreadyStarted(String),

    /// Removing a session that has not reached its terminal stage.
    #[error("session {0} is still live")]
    SessionLive(String),
}
