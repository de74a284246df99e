//! Interview session orchestration
//!
//! This module provides the `Session` state machine that manages:
//! - The interview lifecycle (greeting, questions, wrap-up, sign-off)
//! - The wall-clock budget, percentage-based time warnings, and the
//!   forced-timeout safety net
//! - Transcript accumulation from both sides of the conversation
//! - The single outbound event stream consumed by transport and
//!   persistence sinks

mod config;
mod events;
mod session;
mod status;
mod transcript;
pub mod warning;

pub use config::{InterviewConfig, InterviewDefaults, ModelParams, Scripts};
pub use events::{CompletionReason, OutboundEvent, SessionEvent, Stage};
pub use session::Session;
pub use status::SessionStatus;
pub use transcript::{Speaker, Transcript, TranscriptEntry};
pub use warning::{SentWarnings, WarningKind, WarningSchedule};
