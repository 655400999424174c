//! Storage operations
//!
//! Looks up LIST/RETR/SIZE targets inside the sandbox and enumerates
//! directories.

use log::{debug, error};
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::navigate::Cursor;
use crate::navigate::sandbox::confine_existing;
use crate::storage::results::{ListingEntry, RetrieveTarget};

/// Resolves the directory a LIST targets: the current directory when no
/// argument is given.
pub async fn locate_directory(
    cursor: &Cursor,
    argument: Option<&str>,
) -> Result<PathBuf, StorageError> {
    let argument = strip_list_options(argument.unwrap_or(""));
    let resolved = cursor.resolve(argument)?;
    let virtual_path = cursor.display(&resolved);

    let real_path = confine_existing(cursor.user_root(), &resolved, argument)
        .await?
        .ok_or_else(|| StorageError::DirectoryNotFound(virtual_path.clone()))?;

    match tokio::fs::metadata(&real_path).await {
        Ok(metadata) if metadata.is_dir() => Ok(real_path),
        Ok(_) => Err(StorageError::DirectoryNotFound(virtual_path)),
        Err(e) => Err(StorageError::Io(e)),
    }
}

/// Drops leading `ls`-style option tokens such as `-la` from a LIST argument.
fn strip_list_options(argument: &str) -> &str {
    let mut rest = argument.trim_start();
    while rest.starts_with('-') {
        rest = rest
            .split_once(char::is_whitespace)
            .map_or("", |(_, tail)| tail.trim_start());
    }
    rest.trim_end()
}

/// Resolves a RETR/SIZE target, which must be an existing regular file.
pub async fn prepare_file_retrieval(
    cursor: &Cursor,
    filename: &str,
) -> Result<RetrieveTarget, StorageError> {
    let resolved = cursor.resolve(filename)?;
    let virtual_path = cursor.display(&resolved);

    let file_path = confine_existing(cursor.user_root(), &resolved, filename)
        .await?
        .ok_or_else(|| StorageError::FileNotFound(virtual_path.clone()))?;

    let metadata = tokio::fs::metadata(&file_path).await?;
    if !metadata.is_file() {
        return Err(StorageError::NotAFile(virtual_path));
    }

    debug!(
        "Prepared file retrieval for {} (virtual: {}, real: {})",
        filename,
        virtual_path,
        file_path.display()
    );

    Ok(RetrieveTarget {
        file_path,
        virtual_path,
        size: metadata.len(),
    })
}

/// Lists the contents of a directory, sorted by name. No recursion.
pub async fn list_directory(real_path: &Path) -> Result<Vec<ListingEntry>, StorageError> {
    let mut reader = tokio::fs::read_dir(real_path).await.map_err(|e| {
        error!("Failed to list directory {}: {}", real_path.display(), e);
        StorageError::Io(e)
    })?;

    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let (is_dir, size) = match entry.metadata().await {
            Ok(metadata) if metadata.is_dir() => (true, 0),
            Ok(metadata) => (false, metadata.len()),
            Err(e) => {
                debug!("No metadata for {}: {}", name, e);
                (false, 0)
            }
        };
        entries.push(ListingEntry { name, is_dir, size });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SandboxError;
    use std::fs;

    fn sandbox() -> (tempfile::TempDir, Cursor) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pub")).unwrap();
        fs::write(dir.path().join("b.txt"), b"12345").unwrap();
        fs::write(dir.path().join("a.bin"), [0u8; 3]).unwrap();
        let root = dir.path().canonicalize().unwrap();
        (dir, Cursor::new(root))
    }

    #[tokio::test]
    async fn listing_is_sorted_and_sizes_directories_as_zero() {
        let (_dir, cursor) = sandbox();
        let target = locate_directory(&cursor, None).await.unwrap();
        let entries = list_directory(&target).await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.bin", "b.txt", "pub"]);
        assert_eq!(entries[1].size, 5);
        assert!(entries[2].is_dir);
        assert_eq!(entries[2].size, 0);
    }

    #[tokio::test]
    async fn missing_list_target_is_reported() {
        let (_dir, cursor) = sandbox();
        assert!(matches!(
            locate_directory(&cursor, Some("nope")).await,
            Err(StorageError::DirectoryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_options_are_ignored() {
        let (_dir, cursor) = sandbox();
        let root = cursor.user_root().to_path_buf();
        assert_eq!(locate_directory(&cursor, Some("-la")).await.unwrap(), root);
        assert_eq!(
            locate_directory(&cursor, Some("-l -a pub")).await.unwrap(),
            root.join("pub")
        );
        assert_eq!(strip_list_options("  -la\tpub "), "pub");
    }

    #[tokio::test]
    async fn retrieval_requires_regular_file() {
        let (_dir, cursor) = sandbox();
        let target = prepare_file_retrieval(&cursor, "b.txt").await.unwrap();
        assert_eq!(target.size, 5);
        assert_eq!(target.virtual_path, "/b.txt");

        assert!(matches!(
            prepare_file_retrieval(&cursor, "pub").await,
            Err(StorageError::NotAFile(_))
        ));
        assert!(matches!(
            prepare_file_retrieval(&cursor, "missing.txt").await,
            Err(StorageError::FileNotFound(p)) if p == "/missing.txt"
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn retrieval_through_symlink_out_of_root_is_refused() {
        let (dir, cursor) = sandbox();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret"), b"x").unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret"), dir.path().join("s")).unwrap();
        assert!(matches!(
            prepare_file_retrieval(&cursor, "s").await,
            Err(StorageError::Sandbox(SandboxError::Escape(_)))
        ));
    }
}
