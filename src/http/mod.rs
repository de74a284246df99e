//! HTTP and WebSocket control surface
//!
//! REST endpoints create, end, and inspect interview sessions; the
//! per-session WebSocket carries candidate audio in and session events
//! out. Message framing is a closed tagged union on both directions.

pub mod handlers;
pub mod messages;
pub mod routes;
pub mod state;
pub mod ws;

pub use messages::{ClientMessage, ControlAction, ServerMessage};
pub use routes::create_router;
pub use state::AppState;
