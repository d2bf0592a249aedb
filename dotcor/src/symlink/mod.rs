//! Symbolic link creation, inspection and validation.
//!
//! Every link written by [`SymlinkManager::create`] stores a *relative*
//! target computed by [`PathResolver::relative_target`], so links survive the
//! home directory and content store being moved together.

mod platform;
mod status;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::fs_ops::ensure_parent;
use crate::path::normalize::resolve_components;
use crate::path::PathResolver;

pub use status::{LinkState, SymlinkStatus};

static CAPABILITY: OnceLock<std::result::Result<(), String>> = OnceLock::new();
static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Check once per process whether symlinks can be created here.
///
/// # Errors
///
/// Returns [`Error::SymlinkUnsupported`] if the probe link could not be made
/// (on Windows this usually means neither elevation nor developer mode).
pub fn ensure_symlink_support() -> Result<()> {
    CAPABILITY
        .get_or_init(platform::probe)
        .clone()
        .map_err(|reason| Error::SymlinkUnsupported { reason })
}

/// Creates, removes and inspects symlinks.
///
/// # Examples
///
/// ```no_run
/// use dotcor::path::PathResolver;
/// use dotcor::symlink::{LinkState, SymlinkManager};
///
/// let links = SymlinkManager::new(PathResolver::new());
/// links.create("~/.dotcor/files/shell/zshrc", "~/.zshrc").unwrap();
/// assert_eq!(links.status("~/.zshrc").unwrap().state(), LinkState::ValidSymlink);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SymlinkManager {
    resolver: PathResolver,
}

impl SymlinkManager {
    /// Create a manager resolving paths with `resolver`.
    #[must_use]
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// The resolver used for path expansion.
    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Create `link` pointing at `target` through a relative path.
    ///
    /// Missing parent directories of `link` are created. A file or link
    /// already at `link` is replaced atomically: the new link is made under
    /// a temporary sibling name and renamed over it. An empty directory at
    /// `link` is removed first; a non-empty one makes this fail.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SymlinkUnsupported`] if the platform cannot create
    /// links, a path error if the relative target cannot be computed, or
    /// [`Error::SymlinkCreation`] for I/O failures.
    pub fn create(&self, target: impl AsRef<Path>, link: impl AsRef<Path>) -> Result<()> {
        ensure_symlink_support()?;

        let link = self.resolver.expand(link)?;
        let target = self.resolver.expand(target)?;
        let relative = self.resolver.relative_target(&link, &target)?;
        let creation = |source: io::Error| Error::SymlinkCreation {
            link: link.clone(),
            source,
        };

        ensure_parent(&link).map_err(creation)?;

        if let Ok(metadata) = fs::symlink_metadata(&link) {
            if metadata.is_dir() {
                fs::remove_dir(&link).map_err(creation)?;
            }
        }

        let target_is_dir = fs::metadata(&target).is_ok_and(|m| m.is_dir());
        place(&relative, &link, target_is_dir).map_err(creation)?;

        log::debug!("linked {} -> {}", link.display(), relative.display());
        Ok(())
    }

    /// Create `link` storing `raw_target` verbatim.
    ///
    /// Used to put back a link exactly as it was, whatever form its target
    /// took. An existing symlink at `link` is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SymlinkCreation`] on failure.
    pub fn create_raw(&self, raw_target: &Path, link: impl AsRef<Path>) -> Result<()> {
        ensure_symlink_support()?;
        let link = self.resolver.expand(link)?;
        let creation = |source: io::Error| Error::SymlinkCreation {
            link: link.clone(),
            source,
        };
        ensure_parent(&link).map_err(creation)?;

        let dir = link.parent().unwrap_or_else(|| Path::new("/"));
        let target_is_dir = fs::metadata(dir.join(raw_target)).is_ok_and(|m| m.is_dir());
        place(raw_target, &link, target_is_dir).map_err(creation)
    }

    /// Remove the symlink at `link`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotASymlink`] if nothing is there or it is not a
    /// symlink; a regular file is never deleted by this call.
    pub fn remove(&self, link: impl AsRef<Path>) -> Result<()> {
        let link = self.resolver.expand(link)?;
        match fs::symlink_metadata(&link) {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                platform::remove_symlink(&link).map_err(|e| Error::from_io(&link, e))?;
                log::debug!("removed link {}", link.display());
                Ok(())
            }
            Ok(_) => Err(Error::NotASymlink { path: link }),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(Error::PermissionDenied { path: link })
            }
            Err(_) => Err(Error::NotASymlink { path: link }),
        }
    }

    /// Inspect `link` without following it.
    ///
    /// A path that does not exist yields an all-false status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] if the path cannot be read, or a
    /// path error if it cannot be expanded.
    pub fn status(&self, link: impl AsRef<Path>) -> Result<SymlinkStatus> {
        let link = self.resolver.expand(link)?;
        let metadata = match fs::symlink_metadata(&link) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(Error::PermissionDenied { path: link })
            }
            Err(_) => return Ok(SymlinkStatus::absent()),
        };

        if !metadata.file_type().is_symlink() {
            return Ok(SymlinkStatus {
                exists: true,
                ..SymlinkStatus::default()
            });
        }

        let target = fs::read_link(&link).map_err(|e| Error::from_io(&link, e))?;
        Ok(SymlinkStatus {
            exists: true,
            is_symlink: true,
            target_exists: fs::metadata(&link).is_ok(),
            is_relative: target.is_relative(),
            target: Some(target),
        })
    }

    /// True only if `link` is a symlink whose target currently exists.
    pub fn is_valid(&self, link: impl AsRef<Path>) -> bool {
        self.status(link)
            .is_ok_and(|s| s.state() == LinkState::ValidSymlink)
    }

    /// The raw target stored in `link`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotASymlink`] if `link` is not a symlink.
    pub fn read_target(&self, link: impl AsRef<Path>) -> Result<PathBuf> {
        let link = self.resolver.expand(link)?;
        match fs::symlink_metadata(&link) {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                fs::read_link(&link).map_err(|e| Error::from_io(&link, e))
            }
            _ => Err(Error::NotASymlink { path: link }),
        }
    }

    /// Absolute location `link` points at, with relative targets resolved
    /// against the link's own directory. The target need not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotASymlink`] if `link` is not a symlink.
    pub fn resolved_target(&self, link: impl AsRef<Path>) -> Result<PathBuf> {
        let link = self.resolver.expand(link)?;
        let raw = self.read_target(&link)?;
        if raw.is_absolute() {
            return resolve_components(&raw);
        }
        let dir = link.parent().unwrap_or_else(|| Path::new("/"));
        resolve_components(&dir.join(raw))
    }

    /// Whether `link` resolves to `expected`.
    ///
    /// Paths are compared lexically first, then by canonical form when both
    /// exist, so links through symlinked parent directories still match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotASymlink`] if `link` is not a symlink.
    pub fn points_to(&self, link: impl AsRef<Path>, expected: impl AsRef<Path>) -> Result<bool> {
        let resolved = self.resolved_target(link)?;
        let expected = self.resolver.expand(expected)?;
        if resolved == expected {
            return Ok(true);
        }
        Ok(match (fs::canonicalize(&resolved), fs::canonicalize(&expected)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        })
    }
}

/// Create the link under a temporary sibling name, then rename it over
/// `link` so any previous occupant is replaced in one step.
fn place(raw_target: &Path, link: &Path, target_is_dir: bool) -> io::Result<()> {
    let staging = staging_path(link);
    platform::symlink(raw_target, &staging, target_is_dir)?;
    fs::rename(&staging, link).inspect_err(|_| {
        let _ = platform::remove_symlink(&staging);
    })
}

fn staging_path(link: &Path) -> PathBuf {
    let name = link
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let n = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
    link.with_file_name(format!(".{name}.dotcor-{}-{n}", std::process::id()))
}
