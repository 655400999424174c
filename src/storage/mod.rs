//! File system storage management
//!
//! Handles target lookups and directory enumeration for bulk commands.

pub mod operations;
pub mod results;

pub use operations::{list_directory, locate_directory, prepare_file_retrieval};
pub use results::{ListingEntry, RetrieveTarget};
