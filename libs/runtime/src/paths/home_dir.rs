use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HomeDirError {
    #[error("cannot determine the user home directory")]
    NoHome,
    #[error("failed to create home directory {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// Resolve the application home directory.
///
/// - `None` falls back to `<user home>/<default_subdir>`.
/// - A leading `~` is expanded against the user home.
/// - Relative paths are made absolute against the current directory.
///
/// When `create` is set the directory (and its parents) is created.
pub fn resolve_home_dir(
    user: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let resolved = match user {
        None => user_home()?.join(default_subdir),
        Some(raw) => expand(raw.trim())?,
    };

    let absolute = if resolved.is_absolute() {
        resolved
    } else {
        std::env::current_dir()
            .map_err(HomeDirError::CurrentDir)?
            .join(resolved)
    };

    if create {
        std::fs::create_dir_all(&absolute).map_err(|source| HomeDirError::Create {
            path: absolute.clone(),
            source,
        })?;
    }

    Ok(absolute)
}

fn user_home() -> Result<PathBuf, HomeDirError> {
    dirs::home_dir().ok_or(HomeDirError::NoHome)
}

fn expand(raw: &str) -> Result<PathBuf, HomeDirError> {
    if raw == "~" {
        return user_home();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(user_home()?.join(rest));
    }
    Ok(Path::new(raw).to_path_buf())
}
