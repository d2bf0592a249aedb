//! End-to-end transaction scenarios against a real filesystem.
//!
//! Each test builds a throwaway home directory, runs one of the dotfile
//! workflows and checks both the filesystem and the persisted registry.

#![cfg(unix)]

mod common;

use std::fs;
use std::path::Path;

use common::Fixture;
use dotcor::{
    add_file_transaction, link_file_transaction, remove_file_transaction, Error, ErrorCategory,
    LinkState, ManagedFile, TransactionState,
};

fn home_snapshot(fx: &Fixture) -> Vec<String> {
    Fixture::snapshot(&fx.home)
        .into_iter()
        .filter(|p| !p.starts_with(".dotcor/backups"))
        .collect()
}

#[test]
fn test_add_moves_links_and_registers() {
    let fx = Fixture::new();
    let zshrc = fx.write_home_file(".zshrc", "export EDITOR=vim\n");

    let mut tx = add_file_transaction(&fx.ctx, ManagedFile::new("~/.zshrc", "shell/zshrc"), false)
        .unwrap();
    tx.execute_all().unwrap();
    tx.commit().unwrap();

    let store_file = fx.data.default_store_dir().join("shell/zshrc");
    assert_eq!(fs::read_to_string(&store_file).unwrap(), "export EDITOR=vim\n");
    assert_eq!(
        fs::read_link(&zshrc).unwrap(),
        Path::new(".dotcor/files/shell/zshrc")
    );
    assert_eq!(fs::read_to_string(&zshrc).unwrap(), "export EDITOR=vim\n");
    assert!(fx.saved_config().is_managed("~/.zshrc"));
}

/// The registry step fails after the file was moved and linked.
///
/// Rollback must remove the link, move the file back, remove the category
/// directory it created and leave the registry as it was. The error names
/// the registry step.
#[test]
fn test_registry_failure_restores_everything() {
    let fx = Fixture::new();
    fx.write_home_file(".zshrc", "original\n");

    // Another entry already claims the same store path, so the registry
    // step is rejected.
    {
        let mut registry = fx.ctx.registry.borrow_mut();
        registry
            .add(ManagedFile::new("~/.zshrc.old", "shell/zshrc"))
            .unwrap();
        registry.save().unwrap();
    }
    let before = home_snapshot(&fx);
    let config_before = fx.saved_config();

    let mut tx = add_file_transaction(&fx.ctx, ManagedFile::new("~/.zshrc", "shell/zshrc"), false)
        .unwrap();
    let err = tx.execute_all().unwrap_err();

    match &err {
        Error::OperationFailed {
            description,
            rollback_failures,
            ..
        } => {
            assert_eq!(description, "add ~/.zshrc to registry");
            assert!(rollback_failures.is_empty());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert_eq!(tx.state(), TransactionState::RolledBack);

    let zshrc = fx.home.join(".zshrc");
    assert!(!fs::symlink_metadata(&zshrc).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_to_string(&zshrc).unwrap(), "original\n");
    assert_eq!(home_snapshot(&fx), before);
    assert_eq!(fx.saved_config(), config_before);
}

#[test]
fn test_existing_store_file_blocks_add_without_force() {
    let fx = Fixture::new();
    fx.write_home_file(".vimrc", "new");
    fx.write_home_file(".dotcor/files/vim/vimrc", "old");

    let mut tx =
        add_file_transaction(&fx.ctx, ManagedFile::new("~/.vimrc", "vim/vimrc"), false).unwrap();
    assert!(tx.execute_all().is_err());
    assert_eq!(
        fs::read_to_string(fx.home.join(".dotcor/files/vim/vimrc")).unwrap(),
        "old"
    );
    assert_eq!(fs::read_to_string(fx.home.join(".vimrc")).unwrap(), "new");

    let mut tx =
        add_file_transaction(&fx.ctx, ManagedFile::new("~/.vimrc", "vim/vimrc"), true).unwrap();
    tx.execute_all().unwrap();
    tx.commit().unwrap();
    assert_eq!(fs::read_to_string(fx.home.join(".vimrc")).unwrap(), "new");
    assert_eq!(fx.ctx.backups.count().unwrap(), 1);
}

#[test]
fn test_remove_restores_real_file() {
    let fx = Fixture::new();
    fx.write_home_file(".gitconfig", "[user]\n");
    let mut tx =
        add_file_transaction(&fx.ctx, ManagedFile::new("~/.gitconfig", "git/gitconfig"), false)
            .unwrap();
    tx.execute_all().unwrap();
    tx.commit().unwrap();

    let mut tx = remove_file_transaction(&fx.ctx, "~/.gitconfig", false).unwrap();
    tx.execute_all().unwrap();
    tx.commit().unwrap();

    let gitconfig = fx.home.join(".gitconfig");
    assert!(!fs::symlink_metadata(&gitconfig).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_to_string(&gitconfig).unwrap(), "[user]\n");
    assert!(!fx.data.default_store_dir().join("git/gitconfig").exists());
    assert!(!fx.saved_config().is_managed("~/.gitconfig"));
    // The deleted store copy was backed up first.
    assert_eq!(fx.ctx.backups.backups_of("gitconfig").unwrap().len(), 1);
}

#[test]
fn test_remove_keep_repo_leaves_store_copy() {
    let fx = Fixture::new();
    fx.write_home_file(".tmux.conf", "set -g mouse on\n");
    let mut tx =
        add_file_transaction(&fx.ctx, ManagedFile::new("~/.tmux.conf", "tmux/tmux.conf"), false)
            .unwrap();
    tx.execute_all().unwrap();
    tx.commit().unwrap();

    let mut tx = remove_file_transaction(&fx.ctx, fx.home.join(".tmux.conf"), true).unwrap();
    tx.execute_all().unwrap();
    tx.commit().unwrap();

    assert!(fx.data.default_store_dir().join("tmux/tmux.conf").is_file());
    assert!(fx.home.join(".tmux.conf").is_file());
}

#[test]
fn test_remove_unmanaged_file() {
    let fx = Fixture::new();
    assert!(matches!(
        remove_file_transaction(&fx.ctx, "~/.nothing", false),
        Err(Error::NotManaged { .. })
    ));
}

#[test]
fn test_link_on_new_machine() {
    let fx = Fixture::new();
    fx.write_home_file(".dotcor/files/nvim/init.lua", "vim.o.number = true\n");
    let entry = ManagedFile::new("~/.config/nvim/init.lua", "nvim/init.lua");

    let mut tx = link_file_transaction(&fx.ctx, &entry).unwrap();
    tx.execute_all().unwrap();
    tx.commit().unwrap();

    let link = fx.home.join(".config/nvim/init.lua");
    assert_eq!(
        fs::read_link(&link).unwrap(),
        Path::new("../../.dotcor/files/nvim/init.lua")
    );

    // Running again finds nothing to do.
    let tx = link_file_transaction(&fx.ctx, &entry).unwrap();
    assert!(tx.planned_descriptions().is_empty());
}

#[test]
fn test_link_backs_up_occupying_file() {
    let fx = Fixture::new();
    fx.write_home_file(".dotcor/files/shell/bashrc", "managed\n");
    fx.write_home_file(".bashrc", "distro default\n");
    let entry = ManagedFile::new("~/.bashrc", "shell/bashrc");

    let mut tx = link_file_transaction(&fx.ctx, &entry).unwrap();
    tx.execute_all().unwrap();
    tx.commit().unwrap();

    assert!(fx.ctx.links.is_valid("~/.bashrc"));
    assert_eq!(
        fs::read_to_string(fx.home.join(".bashrc")).unwrap(),
        "managed\n"
    );
    let backups = fx.ctx.backups.backups_of(".bashrc").unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read_to_string(&backups[0]).unwrap(), "distro default\n");
}

#[test]
fn test_link_replaces_broken_link() {
    let fx = Fixture::new();
    fx.write_home_file(".dotcor/files/misc/inputrc", "set editing-mode vi\n");
    std::os::unix::fs::symlink("nowhere", fx.home.join(".inputrc")).unwrap();
    assert_eq!(
        fx.ctx.links.status("~/.inputrc").unwrap().state(),
        LinkState::BrokenSymlink
    );

    let entry = ManagedFile::new("~/.inputrc", "misc/inputrc");
    let mut tx = link_file_transaction(&fx.ctx, &entry).unwrap();
    tx.execute_all().unwrap();
    tx.commit().unwrap();
    assert!(fx.ctx.links.is_valid("~/.inputrc"));
}

#[test]
fn test_link_requires_store_file() {
    let fx = Fixture::new();
    let entry = ManagedFile::new("~/.profile", "shell/profile");
    assert!(matches!(
        link_file_transaction(&fx.ctx, &entry),
        Err(Error::SourceNotFound { .. })
    ));
}

#[test]
fn test_dropped_transaction_rolls_back() {
    let fx = Fixture::new();
    fx.write_home_file(".zshenv", "path=(~/bin $path)\n");
    let before = home_snapshot(&fx);

    {
        let mut tx =
            add_file_transaction(&fx.ctx, ManagedFile::new("~/.zshenv", "shell/zshenv"), false)
                .unwrap();
        tx.execute_all().unwrap();
        // Dropped without commit.
    }

    assert_eq!(home_snapshot(&fx), before);
    assert!(!fx.saved_config().is_managed("~/.zshenv"));
}
