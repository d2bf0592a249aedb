//! Platform-specific link primitives.

use std::fs;
use std::io;
use std::path::Path;

#[cfg(unix)]
pub(super) fn symlink(target: &Path, link: &Path, _target_is_dir: bool) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
pub(super) fn symlink(target: &Path, link: &Path, target_is_dir: bool) -> io::Result<()> {
    if target_is_dir {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(not(any(unix, windows)))]
pub(super) fn symlink(_target: &Path, _link: &Path, _target_is_dir: bool) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are not available on this platform",
    ))
}

/// Remove a link without touching its target.
pub(super) fn remove_symlink(link: &Path) -> io::Result<()> {
    match fs::remove_file(link) {
        Ok(()) => Ok(()),
        // Directory symlinks on Windows are removed as directories.
        #[cfg(windows)]
        Err(_) => fs::remove_dir(link),
        #[cfg(not(windows))]
        Err(e) => Err(e),
    }
}

/// Make a throwaway link in a fresh temporary directory.
pub(super) fn probe() -> Result<(), String> {
    let dir = tempfile::Builder::new()
        .prefix("dotcor-probe")
        .tempdir()
        .map_err(|e| format!("cannot create probe directory: {e}"))?;
    let target = dir.path().join("target");
    fs::write(&target, b"").map_err(|e| format!("cannot create probe target: {e}"))?;
    symlink(Path::new("target"), &dir.path().join("link"), false)
        .map_err(|e| format!("cannot create probe link: {e}"))
}
