//! Result types for navigate operations

/// Result of a CWD (change working directory) operation
#[derive(Debug, Clone)]
pub struct CwdResult {
    pub virtual_path: String,
}
