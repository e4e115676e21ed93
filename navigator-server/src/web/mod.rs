//! Web layer for the trip navigator.
//!
//! Provides HTTP endpoints for starting, polling and stopping realtime
//! tracking sessions.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, SessionId};
