//! Storage result types
//!
//! Defines result structures returned by storage operations.

use std::path::PathBuf;

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    /// Size in bytes; always 0 for directories.
    pub size: u64,
}

/// A regular file located inside the sandbox, ready for retrieval
#[derive(Debug, Clone)]
pub struct RetrieveTarget {
    pub file_path: PathBuf,
    pub virtual_path: String,
    pub size: u64,
}
