//! Discovery and creation of the `.essence/` directory.
//!
//! The `.essence/` directory holds the per-project configuration. It is found
//! by walking up from the working directory, unless `ESSENCE_DIR` names one.

use crate::config::ConfigError;
use std::path::{Path, PathBuf};

/// The name of the essence metadata directory.
pub const ESSENCE_DIR_NAME: &str = ".essence";

/// The environment variable that overrides directory discovery.
pub const ESSENCE_DIR_ENV: &str = "ESSENCE_DIR";

/// Walk up the directory tree from `start` looking for a `.essence/` directory.
///
/// `ESSENCE_DIR` is checked first and wins when it names an existing
/// directory. Returns `None` when the filesystem root is reached.
pub fn find_essence_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(ESSENCE_DIR_ENV) {
        let env_path = PathBuf::from(&env_dir);
        if env_path.is_dir() {
            return Some(env_path);
        }
    }
    walk_up(start)
}

fn walk_up(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().ok()?;
    let mut current = start.as_path();
    loop {
        let candidate = current.join(ESSENCE_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => return None,
        }
    }
}

/// Ensure a `.essence/` directory exists at (or under) `path`.
///
/// Returns the path to the directory.
pub fn ensure_essence_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let dir = if path.ends_with(ESSENCE_DIR_NAME) {
        path.to_path_buf()
    } else {
        path.join(ESSENCE_DIR_NAME)
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
