//! Path normalization functions.
//!
//! This module provides the building blocks used by
//! [`PathResolver`](crate::path::PathResolver):
//! - Expanding tilde (~) to a home directory
//! - Expanding `$VAR` and `${VAR}` environment references
//! - Converting relative paths to absolute paths
//! - Resolving `.` and `..` components

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Expand tilde (~) against `home`.
///
/// This function handles `~` and `~/path` but does not support `~user` syntax.
/// Paths that do not start with `~` are returned unchanged and never need a
/// home directory.
///
/// # Errors
///
/// Returns an error if:
/// - The home directory is needed but unknown
/// - The path uses `~user` syntax (not supported)
///
/// # Examples
///
/// ```
/// use dotcor::path::normalize::expand_tilde;
/// use std::path::Path;
///
/// let home = Path::new("/home/alice");
/// assert_eq!(expand_tilde("~", Some(home)).unwrap(), Path::new("/home/alice"));
/// assert_eq!(
///     expand_tilde("~/.zshrc", Some(home)).unwrap(),
///     Path::new("/home/alice/.zshrc")
/// );
/// assert_eq!(expand_tilde("/etc/hosts", None).unwrap(), Path::new("/etc/hosts"));
/// ```
pub fn expand_tilde(path: &str, home: Option<&Path>) -> Result<PathBuf> {
    if !path.starts_with('~') {
        return Ok(PathBuf::from(path));
    }

    let home = home.ok_or_else(|| Error::InvalidPath {
        path: PathBuf::from(path),
        reason: "Cannot determine home directory".to_string(),
    })?;

    if path == "~" {
        Ok(home.to_path_buf())
    } else if path.starts_with("~/") || path.starts_with("~\\") {
        Ok(home.join(&path[2..]))
    } else {
        Err(Error::InvalidPath {
            path: PathBuf::from(path),
            reason: "~user syntax is not supported; use ~ or ~/path".to_string(),
        })
    }
}

/// Expand `$NAME` and `${NAME}` references using `lookup`.
///
/// Unknown variables expand to the empty string. A `$` that does not start a
/// valid reference, and an unterminated `${`, are kept literally.
///
/// # Examples
///
/// ```
/// use dotcor::path::normalize::expand_vars_with;
///
/// let lookup = |name: &str| (name == "XDG").then(|| "/cfg".to_string());
/// assert_eq!(expand_vars_with("$XDG/nvim", lookup), "/cfg/nvim");
/// assert_eq!(expand_vars_with("${XDG}/nvim", lookup), "/cfg/nvim");
/// assert_eq!(expand_vars_with("$MISSING/x", lookup), "/x");
/// assert_eq!(expand_vars_with("cost$", lookup), "cost$");
/// ```
pub fn expand_vars_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                out.push_str(&lookup(&braced[..end]).unwrap_or_default());
                rest = &braced[end + 1..];
            } else {
                out.push('$');
                rest = after;
            }
            continue;
        }

        let name_len = after
            .char_indices()
            .take_while(|(i, c)| c.is_ascii_alphabetic() || *c == '_' || (*i > 0 && c.is_ascii_digit()))
            .count();
        if name_len == 0 {
            out.push('$');
            rest = after;
        } else {
            out.push_str(&lookup(&after[..name_len]).unwrap_or_default());
            rest = &after[name_len..];
        }
    }

    out.push_str(rest);
    out
}

/// Expand environment references against the process environment.
///
/// On Windows `%NAME%` references are expanded as well.
#[must_use]
pub fn expand_env_vars(input: &str) -> String {
    let expanded = expand_vars_with(input, |name| env::var(name).ok());
    #[cfg(windows)]
    let expanded = expand_percent_vars(&expanded, |name| env::var(name).ok());
    expanded
}

#[cfg(windows)]
fn expand_percent_vars<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) if end > 0 => match lookup(&after[..end]) {
                Some(value) => {
                    out.push_str(&value);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('%');
                    rest = after;
                }
            },
            _ => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Resolve `.` and `..` components in an absolute path.
///
/// # Errors
///
/// Returns an error if the path contains too many `..` components that would
/// escape the root directory.
///
/// # Examples
///
/// ```
/// use dotcor::path::normalize::resolve_components;
/// use std::path::{Path, PathBuf};
///
/// let resolved = resolve_components(Path::new("/a/./b/../c")).unwrap();
/// assert_eq!(resolved, PathBuf::from("/a/c"));
///
/// let resolved = resolve_components(Path::new("/a/b/../../c")).unwrap();
/// assert_eq!(resolved, PathBuf::from("/c"));
/// ```
pub fn resolve_components(path: &Path) -> Result<PathBuf> {
    let mut result = PathBuf::new();
    let mut has_root = false;

    for component in path.components() {
        match component {
            Component::RootDir => {
                result.push(component);
                has_root = true;
            }
            Component::Prefix(prefix) => {
                result.push(prefix.as_os_str());
                has_root = true;
            }
            Component::Normal(c) => {
                result.push(c);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping the root itself would leave an empty path.
                if result.parent().is_none() || !result.pop() {
                    return Err(Error::InvalidPath {
                        path: path.to_path_buf(),
                        reason: "Path contains too many '..' components (escapes root)".to_string(),
                    });
                }
            }
        }
    }

    if has_root && result.as_os_str().is_empty() {
        result.push(Component::RootDir);
    }

    Ok(result)
}

/// Join a relative path onto the current directory.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined.
pub fn make_absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|e| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: format!("Cannot get current directory: {e}"),
    })?;
    Ok(cwd.join(path))
}

/// Render a path with forward slashes regardless of platform.
#[must_use]
pub fn to_portable_string(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
