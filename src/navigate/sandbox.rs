//! Path sandbox resolver
//!
//! Maps a client-supplied path argument onto an absolute path inside the
//! user's root. Resolution is lexical: `.` is dropped, `..` pops one segment
//! but never above the root, and an argument starting with `/` is rooted at
//! the user root rather than at the host filesystem root.

use std::ffi::OsStr;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::SandboxError;

/// Resolves `argument` against `current_dir` and confines it to `user_root`.
///
/// An empty argument resolves to `current_dir`. The result is always equal to
/// or a descendant of `user_root`.
pub fn resolve(
    user_root: &Path,
    current_dir: &Path,
    argument: &str,
) -> Result<PathBuf, SandboxError> {
    if argument.contains('\0') {
        return Err(SandboxError::InvalidPath(argument.replace('\0', "\\0")));
    }

    let cursor = current_dir
        .strip_prefix(user_root)
        .map_err(|_| SandboxError::Escape(current_dir.display().to_string()))?;

    let mut segments: Vec<&OsStr> = Vec::new();
    if !argument.starts_with('/') {
        segments.extend(cursor.components().filter_map(|c| match c {
            Component::Normal(segment) => Some(segment),
            _ => None,
        }));
    }

    for component in Path::new(argument).components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                segments.pop();
            }
            Component::Normal(segment) => segments.push(segment),
            Component::Prefix(_) => return Err(SandboxError::InvalidPath(argument.to_string())),
        }
    }

    let resolved = segments
        .into_iter()
        .fold(user_root.to_path_buf(), |path, segment| path.join(segment));

    if !resolved.starts_with(user_root) {
        return Err(SandboxError::Escape(argument.to_string()));
    }

    Ok(resolved)
}

/// Renders `path` relative to `user_root` with a leading `/`.
pub fn virtual_path(user_root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(user_root).unwrap_or_else(|_| Path::new(""));
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    format!("/{}", parts.join("/"))
}

/// Follows symlinks of an already resolved path and checks the real target is
/// still under the real user root.
///
/// Returns `Ok(None)` when the path does not exist.
pub async fn confine_existing(
    user_root: &Path,
    resolved: &Path,
    argument: &str,
) -> Result<Option<PathBuf>, SandboxError> {
    let real = match tokio::fs::canonicalize(resolved).await {
        Ok(real) => real,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(_) => return Err(SandboxError::InvalidPath(argument.to_string())),
    };

    let real_root = tokio::fs::canonicalize(user_root)
        .await
        .map_err(|_| SandboxError::InvalidPath(argument.to_string()))?;

    if real.starts_with(&real_root) {
        Ok(Some(real))
    } else {
        Err(SandboxError::Escape(argument.to_string()))
    }
}
