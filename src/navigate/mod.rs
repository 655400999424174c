//! Navigate module
//!
//! Handles the per-user directory sandbox: path resolution, the current
//! directory cursor and changing directories.

mod cursor;
mod operations;
mod results;
pub mod sandbox;

// Re-export public types and functions
pub use cursor::Cursor;
pub use operations::change_directory;
pub use results::CwdResult;
