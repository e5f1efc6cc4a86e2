//! Property-based tests for entry-name sanitization, path containment
//! and collision resolution.

#![allow(clippy::expect_used)]

use std::path::{Component, Path, PathBuf};

use picvault_core::security::{ClaimedPaths, resolve_entry_path, sanitize_entry_name};
use proptest::prelude::*;

proptest! {
    /// Any entry containing a `..` segment is rejected.
    #[test]
    fn prop_parent_traversal_rejected(
        prefix in "([a-z]{1,8}/){0,4}",
        suffix in "([a-z]{1,8}/){0,4}[a-z]{1,8}\\.jpg"
    ) {
        let entry = format!("{prefix}../{suffix}");
        prop_assert!(sanitize_entry_name(&entry).is_err());
    }

    /// Absolute entries are rejected.
    #[test]
    fn prop_absolute_rejected(rest in "([a-z]{1,8}/){0,4}[a-z]{1,8}\\.png") {
        let entry = format!("/{rest}");
        prop_assert!(sanitize_entry_name(&entry).is_err());
    }

    /// Clean relative names survive sanitization unchanged.
    #[test]
    fn prop_clean_names_unchanged(
        components in prop::collection::vec("[a-zA-Z0-9_-]{1,16}", 1..5)
    ) {
        let entry = components.join("/");
        let sanitized = sanitize_entry_name(&entry)
            .expect("clean name rejected")
            .expect("clean name erased");
        prop_assert_eq!(sanitized, PathBuf::from(&entry));
    }

    /// Whatever comes out of a successful sanitization is relative and
    /// free of `..` components.
    #[test]
    fn prop_sanitized_output_is_contained(entry in "\\PC{0,60}") {
        if let Ok(Some(sanitized)) = sanitize_entry_name(&entry) {
            prop_assert!(sanitized.is_relative());
            prop_assert!(
                !sanitized.components().any(|c| matches!(c, Component::ParentDir)),
                "sanitized output contains ..: {:?}", sanitized
            );
        }
    }

    /// A resolved path always stays under its root, whatever the input.
    #[test]
    fn prop_resolved_paths_stay_under_root(entry in "\\PC{0,60}") {
        let root = Path::new("/tmp/picvault-session");
        if let Ok(resolved) = resolve_entry_path(root, &entry) {
            prop_assert!(resolved.starts_with(root), "escaped root: {:?}", resolved);
        }
    }

    /// Backslash and forward-slash spellings of the same entry resolve to
    /// the same path.
    #[test]
    fn prop_separator_spelling_is_irrelevant(
        components in prop::collection::vec("[a-z0-9]{1,12}", 1..4)
    ) {
        let forward = components.join("/");
        let backward = components.join("\\");
        let a = sanitize_entry_name(&forward).expect("forward rejected");
        let b = sanitize_entry_name(&backward).expect("backward rejected");
        prop_assert_eq!(a, b);
    }

    /// Claiming the same path N times yields N distinct paths, in a
    /// deterministic order.
    #[test]
    fn prop_claims_are_unique_and_deterministic(
        name in "[a-z]{1,12}\\.jpg",
        count in 1usize..8
    ) {
        let run = |n: usize| -> Vec<PathBuf> {
            let mut claims = ClaimedPaths::new();
            (0..n)
                .map(|_| claims.claim(PathBuf::from("/nonexistent-root").join(&name)))
                .collect()
        };

        let first = run(count);
        let second = run(count);
        prop_assert_eq!(&first, &second, "claim order not deterministic");

        let mut unique = first.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), first.len(), "duplicate claim produced");
    }
}
