//! Path handling between portable and absolute notation.
//!
//! The registry stores paths in a portable form so one configuration works
//! for every machine a user owns. This module converts between the two forms
//! and computes the relative targets written into symlinks.
//!
//! # Key Concepts
//!
//! ## Expansion
//!
//! Expansion turns a portable path into an absolute one by:
//! - Expanding tilde (~) to the home directory
//! - Expanding `$VAR` / `${VAR}` environment references
//! - Converting relative paths to absolute paths
//! - Resolving `.` and `..` components
//!
//! ## Normalization
//!
//! Normalization is the inverse: paths under the home directory are written
//! as `~/...` with forward slashes; other paths stay absolute.
//!
//! ## Relative targets
//!
//! Every symlink stores the path from its own directory to its target, so
//! moving home and content store together never breaks a link.
//!
//! # Examples
//!
//! ```
//! use dotcor::path::PathResolver;
//! use std::path::PathBuf;
//!
//! let resolver = PathResolver::new().with_home("/home/alice");
//! let rel = resolver
//!     .relative_target("~/.config/nvim/init.lua", "~/.dotcor/files/nvim/init.lua")
//!     .unwrap();
//! assert_eq!(rel, PathBuf::from("../../.dotcor/files/nvim/init.lua"));
//! ```

pub mod normalize;
pub mod relative;
pub mod resolver;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use resolver::PathResolver;
