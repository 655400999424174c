//! Server core functionality
//!
//! This module contains the control listener, the state shared with every
//! session and the stop signal.

pub mod context;
pub mod core;
pub mod shutdown;

pub use context::ServerContext;
pub use core::Server;
pub use shutdown::ShutdownSignal;
