//! Property-based tests for path handling.
//!
//! Note: The normalize module already has property tests for component
//! resolution. This module focuses on the resolver and relative targets.

#![cfg(unix)]

use super::normalize::resolve_components;
use super::relative::relative_path;
use super::PathResolver;
use proptest::prelude::*;
use std::path::{Path, PathBuf};

fn path_component_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_.-]{1,12}".prop_filter("no dot-only components", |s| s != "." && s != "..")
}

fn absolute_path_strategy() -> impl Strategy<Value = PathBuf> {
    prop::collection::vec(path_component_strategy(), 1..8).prop_map(|parts| {
        let mut path = PathBuf::from("/");
        for part in parts {
            path.push(part);
        }
        path
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        max_shrink_iters: 10000,
        .. ProptestConfig::default()
    })]

    // Joining the relative target back onto the link's directory reproduces the target.
    #[test]
    fn relative_target_round_trip(link in absolute_path_strategy(), target in absolute_path_strategy()) {
        let resolver = PathResolver::new().with_home("/home/prop").with_env_expansion(false);
        let rel = resolver.relative_target(&link, &target).unwrap();
        let link_dir = link.parent().unwrap();
        let rejoined = resolve_components(&link_dir.join(&rel)).unwrap();
        prop_assert_eq!(rejoined, target);
    }

    // Relative targets never contain an absolute root.
    #[test]
    fn relative_target_is_relative(link in absolute_path_strategy(), target in absolute_path_strategy()) {
        let rel = relative_path(link.parent().unwrap(), &target).unwrap();
        prop_assert!(rel.is_relative());
    }

    // Expansion is idempotent on absolute paths.
    #[test]
    fn expand_idempotent(path in absolute_path_strategy()) {
        let resolver = PathResolver::new().with_home("/home/prop").with_env_expansion(false);
        let once = resolver.expand(&path).unwrap();
        let twice = resolver.expand(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    // normalize then expand returns the same absolute path.
    #[test]
    fn normalize_expand_round_trip(rest in prop::collection::vec(path_component_strategy(), 0..6)) {
        let resolver = PathResolver::new().with_home("/home/prop").with_env_expansion(false);
        let mut absolute = PathBuf::from("/home/prop");
        for part in &rest {
            absolute.push(part);
        }
        let portable = resolver.normalize(&absolute).unwrap();
        prop_assert!(portable.starts_with('~'));
        prop_assert_eq!(resolver.expand(Path::new(&portable)).unwrap(), absolute);
    }
}
