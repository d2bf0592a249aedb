//! Link status value objects.

use std::fmt;
use std::path::PathBuf;

/// Where a path sits in the link state machine.
///
/// ```text
/// Absent -> Exists(NotSymlink | BrokenSymlink | ValidSymlink)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Nothing exists at the path.
    Absent,
    /// Something exists but it is not a symlink.
    NotSymlink,
    /// A symlink whose target does not exist.
    BrokenSymlink,
    /// A symlink whose target exists.
    ValidSymlink,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::NotSymlink => write!(f, "not-symlink"),
            Self::BrokenSymlink => write!(f, "broken"),
            Self::ValidSymlink => write!(f, "valid"),
        }
    }
}

/// Snapshot of a path's link status, read fresh from the filesystem.
///
/// Never cache one of these: the filesystem can change between calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymlinkStatus {
    /// Something exists at the path (without following links).
    pub exists: bool,
    /// The path is a symbolic link.
    pub is_symlink: bool,
    /// The link's target exists (following the whole chain).
    pub target_exists: bool,
    /// The stored target is a relative path.
    pub is_relative: bool,
    /// The raw stored target.
    pub target: Option<PathBuf>,
}

impl SymlinkStatus {
    /// Status of a path where nothing exists.
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// The state this status corresponds to.
    ///
    /// # Examples
    ///
    /// ```
    /// use dotcor::symlink::{LinkState, SymlinkStatus};
    ///
    /// assert_eq!(SymlinkStatus::absent().state(), LinkState::Absent);
    /// ```
    #[must_use]
    pub fn state(&self) -> LinkState {
        match (self.exists, self.is_symlink, self.target_exists) {
            (false, _, _) => LinkState::Absent,
            (true, false, _) => LinkState::NotSymlink,
            (true, true, false) => LinkState::BrokenSymlink,
            (true, true, true) => LinkState::ValidSymlink,
        }
    }
}
