//! Current-directory cursor of an authenticated session.

use std::path::{Path, PathBuf};

use crate::error::SandboxError;
use crate::navigate::sandbox;

/// A user root and the current directory inside it.
///
/// `current_dir` is always equal to or a descendant of `user_root`, and
/// `user_root` never changes for the lifetime of the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    user_root: PathBuf,
    current_dir: PathBuf,
}

impl Cursor {
    /// Creates a cursor positioned at the user root.
    pub fn new(user_root: PathBuf) -> Self {
        Self {
            current_dir: user_root.clone(),
            user_root,
        }
    }

    pub fn user_root(&self) -> &Path {
        &self.user_root
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// Resolves a client argument relative to the current directory.
    pub fn resolve(&self, argument: &str) -> Result<PathBuf, SandboxError> {
        sandbox::resolve(&self.user_root, &self.current_dir, argument)
    }

    /// Path as the client sees it, rooted at `/`.
    pub fn display(&self, path: &Path) -> String {
        sandbox::virtual_path(&self.user_root, path)
    }

    /// Current directory as the client sees it.
    pub fn working_directory(&self) -> String {
        self.display(&self.current_dir)
    }

    pub(crate) fn move_to(&mut self, dir: PathBuf) {
        debug_assert!(dir.starts_with(&self.user_root));
        if dir.starts_with(&self.user_root) {
            self.current_dir = dir;
        }
    }
}
