//! Client session management
//!
//! Handles the per-connection session state and the control-channel loop.

pub mod handler;
pub mod state;

pub use handler::handle_client;
pub use state::{AuthState, Session};
