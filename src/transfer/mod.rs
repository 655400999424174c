//! Transfer module for FTP server
//!
//! Handles transfer mode state, data channel setup, and streaming of
//! listings and file contents over the data connection.

pub mod address;
pub mod data_channel;
pub mod file_ops;
pub mod modes;
pub mod operations;
pub mod passive;
pub mod results;

// Re-export key types and functions
pub use address::{encode_host_port, parse_host_port};
pub use data_channel::open_data_channel;
pub use file_ops::{format_listing_entry, handle_file_download, send_listing};
pub use modes::TransferMode;
pub use operations::{setup_active_mode, setup_passive_mode};
pub use results::{ActiveModeResult, PassiveModeResult};
