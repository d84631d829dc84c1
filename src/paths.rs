//! Path normalization
//!
//! Pure queries of the filesystem; nothing here creates or modifies files.

use std::path::{Path, PathBuf};

/// Canonical absolute path if `path` exists, `None` otherwise.
pub fn resolve_existing(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        return None;
    }
    dunce::canonicalize(expand_home(path)).ok()
}

/// `path` unchanged when absolute, else joined onto the canonicalized `base`.
///
/// Returns `None` when `base` cannot be canonicalized. The joined path need
/// not exist.
pub fn resolve_relative(base: &Path, path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        return None;
    }
    let path = expand_home(path);
    if path.is_absolute() {
        return Some(path);
    }
    dunce::canonicalize(base).ok().map(|b| b.join(path))
}

/// Expand a leading `~/` using `$HOME`.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// File stem as a String, e.g. `My Game` for `/x/My Game.uproject`.
pub fn stem(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().to_string())
}
