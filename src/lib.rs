pub mod config;
pub mod connector;
pub mod error;
pub mod http;
pub mod registry;
pub mod session;

pub use config::Config;
pub use connector::{Connector, ConnectorEvent, ConnectorFrame, NatsConnector};
pub use error::SessionError;
pub use http::{create_router, AppState};
pub use registry::SessionRegistry;
pub use session::{
    CompletionReason, InterviewConfig, InterviewDefaults, OutboundEvent, Session, SessionStatus,
    Speaker, Stage, Transcript, TranscriptEntry, WarningKind,
};
