//! Navigation operations implementation

use log::debug;

use crate::error::NavigateError;
use crate::navigate::Cursor;
use crate::navigate::results::CwdResult;
use crate::navigate::sandbox::confine_existing;

/// Changes the working directory of a cursor.
///
/// The cursor is only moved when the target resolves inside the sandbox and
/// is an existing directory.
pub async fn change_directory(
    cursor: &mut Cursor,
    target_path: &str,
) -> Result<CwdResult, NavigateError> {
    let resolved = cursor.resolve(target_path)?;
    let virtual_path = cursor.display(&resolved);

    let real_path = confine_existing(cursor.user_root(), &resolved, target_path)
        .await?
        .ok_or_else(|| NavigateError::DirectoryNotFound(virtual_path.clone()))?;

    match tokio::fs::metadata(&real_path).await {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => return Err(NavigateError::NotADirectory(virtual_path)),
        Err(_) => return Err(NavigateError::DirectoryNotFound(virtual_path)),
    }

    debug!(
        "Cursor moved to {} (real: {})",
        virtual_path,
        resolved.display()
    );
    cursor.move_to(resolved);

    Ok(CwdResult { virtual_path })
}
