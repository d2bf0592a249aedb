//! Relative path computation between two absolute locations.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Compute the path that leads from directory `from_dir` to `to`.
///
/// Both inputs must be absolute and already cleaned of `.` and `..`
/// components. When `from_dir` and `to` are the same location the result is
/// `.`.
///
/// # Errors
///
/// Returns [`Error::PathComputation`] if either path is relative or the two
/// live on different volumes (different Windows prefixes), where no relative
/// path exists.
///
/// # Examples
///
/// ```
/// use dotcor::path::relative::relative_path;
/// use std::path::{Path, PathBuf};
///
/// let rel = relative_path(
///     Path::new("/home/alice"),
///     Path::new("/home/alice/.dotcor/files/shell/zshrc"),
/// ).unwrap();
/// assert_eq!(rel, PathBuf::from(".dotcor/files/shell/zshrc"));
///
/// let rel = relative_path(
///     Path::new("/home/alice/.config/nvim"),
///     Path::new("/home/alice/.dotcor/files/nvim/init.lua"),
/// ).unwrap();
/// assert_eq!(rel, PathBuf::from("../../.dotcor/files/nvim/init.lua"));
/// ```
pub fn relative_path(from_dir: &Path, to: &Path) -> Result<PathBuf> {
    let fail = |reason: &str| Error::PathComputation {
        from: from_dir.to_path_buf(),
        to: to.to_path_buf(),
        reason: reason.to_string(),
    };

    if !from_dir.is_absolute() || !to.is_absolute() {
        return Err(fail("both paths must be absolute"));
    }

    let from_parts: Vec<Component<'_>> = from_dir.components().collect();
    let to_parts: Vec<Component<'_>> = to.components().collect();

    if prefix_of(&from_parts) != prefix_of(&to_parts) {
        return Err(fail("paths are on different volumes"));
    }

    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in &from_parts[common..] {
        result.push(Component::ParentDir);
    }
    for part in &to_parts[common..] {
        result.push(part);
    }

    if result.as_os_str().is_empty() {
        result.push(Component::CurDir);
    }
    Ok(result)
}

fn prefix_of<'a>(parts: &[Component<'a>]) -> Option<Component<'a>> {
    parts
        .first()
        .copied()
        .filter(|c| matches!(c, Component::Prefix(_)))
}
