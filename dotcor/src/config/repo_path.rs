//! Content store naming and platform selection.

use std::path::Path;

use crate::error::{Error, Result};
use crate::path::PathResolver;

/// Store-relative path for a file being added.
///
/// With a `category` the file goes to `<category>/<name>`. Files under
/// `~/.config/<app>/` keep their layout below the app directory. Everything
/// else is sorted by name into `shell`, `vim`, `nvim`, `git`, `tmux` or
/// `misc`. The stored name never keeps a leading dot.
///
/// # Errors
///
/// Returns an error if `source` cannot be expanded, has no file name, or the
/// category is not a plain relative path.
///
/// # Examples
///
/// ```
/// use dotcor::config::generate_repo_path;
/// use dotcor::path::PathResolver;
///
/// let resolver = PathResolver::new().with_home("/home/alice");
/// assert_eq!(generate_repo_path(&resolver, "~/.zshrc", None).unwrap(), "shell/zshrc");
/// assert_eq!(generate_repo_path(&resolver, "~/.tmux.conf", None).unwrap(), "tmux/tmux.conf");
/// assert_eq!(
///     generate_repo_path(&resolver, "~/.config/nvim/lua/plugins.lua", None).unwrap(),
///     "nvim/lua/plugins.lua"
/// );
/// assert_eq!(generate_repo_path(&resolver, "~/.inputrc", Some("input")).unwrap(), "input/inputrc");
/// ```
pub fn generate_repo_path(
    resolver: &PathResolver,
    source: impl AsRef<Path>,
    category: Option<&str>,
) -> Result<String> {
    let portable = resolver.normalize(source.as_ref())?;
    let file_name = portable
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty() && *n != "~")
        .ok_or_else(|| Error::InvalidPath {
            path: source.as_ref().to_path_buf(),
            reason: "path has no file name".into(),
        })?;
    let stored_name = file_name.strip_prefix('.').unwrap_or(file_name);

    if let Some(category) = category {
        let category = category.trim_matches('/');
        validate_repo_path(category)?;
        return Ok(format!("{category}/{stored_name}"));
    }

    if let Some(rest) = portable.strip_prefix("~/.config/") {
        if rest.contains('/') {
            return Ok(rest.to_string());
        }
    }

    Ok(format!("{}/{stored_name}", category_for(file_name)))
}

fn category_for(file_name: &str) -> &'static str {
    if file_name == ".nvimrc" {
        "nvim"
    } else if file_name.starts_with(".zsh")
        || file_name.starts_with(".bash")
        || file_name == ".profile"
    {
        "shell"
    } else if file_name.starts_with(".vim") {
        "vim"
    } else if file_name.starts_with(".git") {
        "git"
    } else if file_name.starts_with(".tmux") {
        "tmux"
    } else {
        "misc"
    }
}

/// Check that `repo_path` is a non-empty relative path that stays inside
/// the content store.
///
/// # Errors
///
/// Returns [`Error::Validation`] describing the problem.
pub fn validate_repo_path(repo_path: &str) -> Result<()> {
    let invalid = |message: &str| Error::Validation {
        field: "repo_path".into(),
        message: format!("{message}: '{repo_path}'"),
    };
    if repo_path.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if repo_path.starts_with('/') || repo_path.starts_with('\\') || Path::new(repo_path).is_absolute()
    {
        return Err(invalid("must be relative"));
    }
    if repo_path.split(['/', '\\']).any(|part| part == "..") {
        return Err(invalid("must not contain '..'"));
    }
    Ok(())
}

/// Identifier of the running platform: `linux`, `darwin`, `windows`, or
/// the raw OS name elsewhere.
#[must_use]
pub fn current_platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Whether a file restricted to `platforms` applies here. An empty list
/// means every platform.
#[must_use]
pub fn applies_to_platform(platforms: &[String]) -> bool {
    platforms.is_empty() || platforms.iter().any(|p| p == current_platform())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::new().with_home("/home/alice")
    }

    fn repo(source: &str) -> String {
        generate_repo_path(&resolver(), source, None).unwrap()
    }

    #[test]
    #[cfg(unix)]
    fn test_shell_family() {
        assert_eq!(repo("~/.zshrc"), "shell/zshrc");
        assert_eq!(repo("~/.zprofile"), "misc/zprofile");
        assert_eq!(repo("~/.bash_profile"), "shell/bash_profile");
        assert_eq!(repo("~/.profile"), "shell/profile");
        assert_eq!(repo("/home/alice/.zshenv"), "shell/zshenv");
    }

    #[test]
    #[cfg(unix)]
    fn test_editor_and_tools() {
        assert_eq!(repo("~/.vimrc"), "vim/vimrc");
        assert_eq!(repo("~/.nvimrc"), "nvim/nvimrc");
        assert_eq!(repo("~/.gitconfig"), "git/gitconfig");
        assert_eq!(repo("~/.tmux.conf"), "tmux/tmux.conf");
        assert_eq!(repo("~/.inputrc"), "misc/inputrc");
    }

    #[test]
    #[cfg(unix)]
    fn test_xdg_config_keeps_layout() {
        assert_eq!(repo("~/.config/nvim/init.lua"), "nvim/init.lua");
        assert_eq!(repo("~/.config/alacritty/alacritty.toml"), "alacritty/alacritty.toml");
        // A file directly in ~/.config has no app directory.
        assert_eq!(repo("~/.config/starship.toml"), "misc/starship.toml");
    }

    #[test]
    #[cfg(unix)]
    fn test_custom_category() {
        let r = resolver();
        assert_eq!(
            generate_repo_path(&r, "~/.config/nvim/init.lua", Some("editors/")).unwrap(),
            "editors/init.lua"
        );
        assert!(generate_repo_path(&r, "~/.zshrc", Some("../escape")).is_err());
    }

    #[test]
    fn test_validate_repo_path() {
        assert!(validate_repo_path("shell/zshrc").is_ok());
        assert!(validate_repo_path("").is_err());
        assert!(validate_repo_path("/etc/passwd").is_err());
        assert!(validate_repo_path("a/../../b").is_err());
    }

    #[test]
    fn test_platforms() {
        assert!(applies_to_platform(&[]));
        assert!(applies_to_platform(&[current_platform().to_string()]));
        assert!(!applies_to_platform(&["plan9".to_string()]));
        assert_ne!(current_platform(), "macos");
    }
}
