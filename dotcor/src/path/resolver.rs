//! Portable path resolution.
//!
//! This module provides the `PathResolver` type, which converts between the
//! portable notation stored in the registry (`~/.zshrc`, `$XDG_CONFIG_HOME/..`)
//! and absolute filesystem paths.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path::normalize::{
    expand_env_vars, expand_tilde, make_absolute, resolve_components, to_portable_string,
};
use crate::path::relative::relative_path;

/// Resolves paths between portable and absolute notation.
///
/// The resolver is bound to one home directory, taken from the environment
/// by [`PathResolver::new`] or injected with [`PathResolver::with_home`] so
/// tests never touch the real home.
///
/// # Examples
///
/// ```
/// use dotcor::path::PathResolver;
/// use std::path::{Path, PathBuf};
///
/// let resolver = PathResolver::new().with_home("/home/alice");
///
/// let expanded = resolver.expand("~/.zshrc").unwrap();
/// assert_eq!(expanded, PathBuf::from("/home/alice/.zshrc"));
///
/// assert_eq!(resolver.normalize(&expanded).unwrap(), "~/.zshrc");
///
/// let rel = resolver
///     .relative_target("~/.zshrc", "~/.dotcor/files/shell/zshrc")
///     .unwrap();
/// assert_eq!(rel, PathBuf::from(".dotcor/files/shell/zshrc"));
/// ```
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Home directory used for `~`, if known.
    home: Option<PathBuf>,
    /// Whether `$VAR` references are expanded.
    expand_env: bool,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self {
            home: home::home_dir(),
            expand_env: true,
        }
    }
}

impl PathResolver {
    /// Create a resolver for the current user's home directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `home` instead of the detected home directory.
    #[must_use]
    pub fn with_home(mut self, home: impl AsRef<Path>) -> Self {
        self.home = Some(home.as_ref().to_path_buf());
        self
    }

    /// Forget the home directory; `~` paths will fail to expand.
    #[must_use]
    pub fn without_home(mut self) -> Self {
        self.home = None;
        self
    }

    /// Configure whether environment references are expanded.
    #[must_use]
    pub fn with_env_expansion(mut self, enabled: bool) -> Self {
        self.expand_env = enabled;
        self
    }

    /// The home directory this resolver expands `~` to.
    #[must_use]
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Expand a portable path to a clean absolute path.
    ///
    /// Steps, in order: tilde expansion, environment expansion, joining onto
    /// the current directory if still relative, and resolution of `.`/`..`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if the path is not valid UTF-8, needs an
    /// unknown home directory, uses `~user`, or escapes the root.
    pub fn expand(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let text = path.to_str().ok_or_else(|| Error::InvalidPath {
            path: path.to_path_buf(),
            reason: "Path contains invalid UTF-8".to_string(),
        })?;

        let tilde_expanded = expand_tilde(text, self.home.as_deref())?;
        let expanded = if self.expand_env {
            match tilde_expanded.to_str() {
                Some(s) if s.contains('$') || cfg!(windows) => PathBuf::from(expand_env_vars(s)),
                _ => tilde_expanded,
            }
        } else {
            tilde_expanded
        };

        resolve_components(&make_absolute(&expanded)?)
    }

    /// Convert a path to portable notation.
    ///
    /// Paths under the home directory become `~` or `~/rel/path` (always with
    /// forward slashes); anything else is returned as a clean absolute path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be expanded first.
    pub fn normalize(&self, path: impl AsRef<Path>) -> Result<String> {
        let absolute = self.expand(path)?;
        if let Some(home) = self.clean_home() {
            if let Ok(rest) = absolute.strip_prefix(&home) {
                let rest = to_portable_string(rest);
                return Ok(if rest.is_empty() {
                    "~".to_string()
                } else {
                    format!("~/{rest}")
                });
            }
        }
        Ok(absolute.to_string_lossy().into_owned())
    }

    /// Relative path from the directory containing `link` to `target`.
    ///
    /// This is the value stored inside every symlink dotcor creates, so the
    /// link keeps working when home and content store move together.
    ///
    /// # Errors
    ///
    /// Returns an error if either path cannot be expanded, or
    /// [`Error::PathComputation`] when no relative path exists.
    pub fn relative_target(
        &self,
        link: impl AsRef<Path>,
        target: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let link = self.expand(link)?;
        let target = self.expand(target)?;
        let link_dir = link.parent().ok_or_else(|| Error::PathComputation {
            from: link.clone(),
            to: target.clone(),
            reason: "link has no parent directory".to_string(),
        })?;
        relative_path(link_dir, &target)
    }

    /// Whether `path` lies inside (or is) `dir`, after expanding both.
    ///
    /// # Errors
    ///
    /// Returns an error if either path cannot be expanded.
    pub fn is_within(&self, path: impl AsRef<Path>, dir: impl AsRef<Path>) -> Result<bool> {
        Ok(self.expand(path)?.starts_with(self.expand(dir)?))
    }

    fn clean_home(&self) -> Option<PathBuf> {
        self.home
            .as_deref()
            .and_then(|home| resolve_components(home).ok())
    }
}
