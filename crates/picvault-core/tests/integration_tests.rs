//! End-to-end tests of the vault facade: load, dedup, starring,
//! eviction and clearing against a real temporary data directory.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::PathBuf;

use picvault_core::db::Settings;
use picvault_core::test_utils::write_zip_fixture;
use picvault_core::{LoadOutcome, NoopProgress, Placement, Vault, VaultConfig, VaultError};
use tempfile::TempDir;

fn vault(dir: &TempDir) -> Vault {
    Vault::open(VaultConfig::new(dir.path().join("data"))).unwrap()
}

fn fixture(dir: &TempDir, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.path().join(name);
    write_zip_fixture(&path, entries);
    path
}

#[test]
fn test_load_local_copy_extracts_images() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    let source = fixture(
        &dir,
        "cats.zip",
        &[("one.jpg", b"11"), ("two.png", b"222"), ("notes.txt", b"x")],
    );

    let outcome = vault
        .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
        .unwrap();
    let LoadOutcome::Loaded(loaded) = outcome else {
        panic!("expected a load, got a placement prompt");
    };

    assert_eq!(loaded.images.len(), 2);
    assert!(!loaded.already_in_library);
    assert!(loaded.session_dir.join("one.jpg").exists());
    assert!(!loaded.session_dir.join("notes.txt").exists());
    assert!(source.exists(), "copy placement keeps the source");

    let archives = vault.list_archives();
    assert_eq!(archives.len(), 1);
    assert_eq!(archives[0].extracted_images.len(), 2);
    assert!(archives[0].archive_file_path().exists());
}

#[test]
fn test_load_without_placement_pauses() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    let source = fixture(&dir, "cats.zip", &[("a.jpg", b"a")]);

    let outcome = vault.load_local(&source, None, &mut NoopProgress).unwrap();
    assert!(matches!(outcome, LoadOutcome::NeedsPlacementChoice));
    assert!(vault.list_archives().is_empty(), "nothing recorded yet");
}

#[test]
fn test_reload_is_cache_hit() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    let source = fixture(&dir, "cats.zip", &[("a.jpg", b"a")]);

    let LoadOutcome::Loaded(first) = vault
        .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };
    let LoadOutcome::Loaded(second) = vault
        .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };

    assert_eq!(first.archive_id, second.archive_id);
    assert!(second.already_in_library);
    assert_eq!(vault.list_archives().len(), 1);
}

#[test]
fn test_move_placement_consumes_source() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    let source = fixture(&dir, "cats.zip", &[("a.jpg", b"a")]);

    vault
        .load_local(&source, Some(Placement::Move), &mut NoopProgress)
        .unwrap();
    assert!(!source.exists());
    assert!(vault.list_archives()[0].archive_file_path().exists());
}

#[test]
fn test_image_star_propagates_and_survives_reload() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    let source = fixture(&dir, "cats.zip", &[("a.jpg", b"a"), ("b.jpg", b"b")]);

    let LoadOutcome::Loaded(loaded) = vault
        .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };

    let starred = vault
        .toggle_image_star(&loaded.archive_id, &loaded.images[0].id)
        .unwrap();
    assert!(starred);
    assert!(vault.list_archives()[0].starred, "star propagates upward");

    // Reload regenerates image ids but keeps stars by original name.
    let LoadOutcome::Loaded(reloaded) = vault
        .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };
    let again = reloaded
        .images
        .iter()
        .find(|i| i.original_name == loaded.images[0].original_name)
        .unwrap();
    assert!(again.starred);
}

#[test]
fn test_clear_library_keeps_starred() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);

    let keep = fixture(&dir, "keep.zip", &[("a.jpg", b"a")]);
    let drop1 = fixture(&dir, "drop1.zip", &[("b.jpg", b"b")]);
    let drop2 = fixture(&dir, "drop2.zip", &[("c.jpg", b"c")]);

    let LoadOutcome::Loaded(kept) = vault
        .load_local(&keep, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };
    vault
        .load_local(&drop1, Some(Placement::Copy), &mut NoopProgress)
        .unwrap();
    vault
        .load_local(&drop2, Some(Placement::Copy), &mut NoopProgress)
        .unwrap();
    vault.toggle_archive_star(&kept.archive_id).unwrap();

    let removed = vault.clear_library().unwrap();
    assert_eq!(removed, 2);

    let remaining = vault.list_archives();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, kept.archive_id);
    assert!(remaining[0].archive_file_path().exists());

    // Second clear finds nothing.
    assert_eq!(vault.clear_library().unwrap(), 0);
}

#[test]
fn test_usage_excludes_starred_bytes() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);

    let a = fixture(&dir, "a.zip", &[("a.jpg", b"aaaa")]);
    let b = fixture(&dir, "b.zip", &[("b.jpg", b"bbbb")]);
    let LoadOutcome::Loaded(first) = vault
        .load_local(&a, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };
    vault
        .load_local(&b, Some(Placement::Copy), &mut NoopProgress)
        .unwrap();

    let before = vault.library_usage();
    assert_eq!(before.archive_count, 2);
    assert_eq!(before.starred_count, 0);

    vault.toggle_archive_star(&first.archive_id).unwrap();
    let after = vault.library_usage();
    assert_eq!(after.starred_count, 1);
    assert!(after.total_bytes < before.total_bytes);
}

#[test]
fn test_shrinking_budget_evicts_lru_not_starred() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);

    let old = fixture(&dir, "old.zip", &[("a.jpg", &[0u8; 500])]);
    let starred = fixture(&dir, "starred.zip", &[("b.jpg", &[0u8; 500])]);
    let fresh = fixture(&dir, "fresh.zip", &[("c.jpg", &[0u8; 500])]);

    let LoadOutcome::Loaded(oldest) = vault
        .load_local(&old, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };
    std::thread::sleep(std::time::Duration::from_millis(10));
    let LoadOutcome::Loaded(pinned) = vault
        .load_local(&starred, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };
    vault.toggle_archive_star(&pinned.archive_id).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(10));
    let LoadOutcome::Loaded(newest) = vault
        .load_local(&fresh, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };

    // Budget below one archive's size: every non-starred candidate except
    // nothing can fit, so LRU order decides who goes first.
    let one_archive = vault.list_archives()[0].archive_size;
    let evicted = vault
        .update_settings(Settings {
            library_size_gb: (one_archive as f64) / (1024.0 * 1024.0 * 1024.0),
            ..vault.settings()
        })
        .unwrap();

    assert!(evicted.contains(&oldest.archive_id), "oldest goes first");
    assert!(!evicted.contains(&pinned.archive_id), "starred never evicted");

    let survivors: Vec<String> = vault.list_archives().iter().map(|a| a.id.clone()).collect();
    assert!(survivors.contains(&pinned.archive_id));
    assert!(survivors.contains(&newest.archive_id));
}

#[test]
fn test_extract_single_image_fresh_process() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    let source = fixture(&dir, "cats.zip", &[("album/cat.jpg", b"meow")]);

    let (archive_id, image_id) = {
        let vault = Vault::open(VaultConfig::new(data_dir.clone())).unwrap();
        let LoadOutcome::Loaded(loaded) = vault
            .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
            .unwrap()
        else {
            panic!("expected load");
        };
        (loaded.archive_id.clone(), loaded.images[0].id.clone())
    };

    // A new vault instance: metadata reloaded from disk, no session state.
    let vault = Vault::open(VaultConfig::new(data_dir)).unwrap();
    let path = vault
        .extract_single_image(&archive_id, &image_id, &mut NoopProgress)
        .unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"meow");
    assert!(path
        .ancestors()
        .any(|p| p.file_name().is_some_and(|n| n.to_string_lossy().contains("-single-"))));
}

#[test]
fn test_local_load_records_file_source() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    let source = fixture(&dir, "cats.zip", &[("a.jpg", b"a")]);

    vault
        .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
        .unwrap();

    let recorded = vault.list_archives()[0].source_url.clone();
    let recorded = recorded.expect("local load records its source");
    assert!(recorded.starts_with("file://"));
    assert!(recorded.ends_with("cats.zip"));
}

#[test]
fn test_missing_binary_recovered_from_local_source() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    let source = fixture(&dir, "cats.zip", &[("album/cat.jpg", b"meow")]);

    let LoadOutcome::Loaded(loaded) = vault
        .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };

    // Delete the library binary behind the vault's back; the original
    // file is still where it was loaded from.
    let slot = vault.list_archives()[0].library_path.clone();
    fs::remove_dir_all(&slot).unwrap();

    let path = vault
        .extract_single_image(&loaded.archive_id, &loaded.images[0].id, &mut NoopProgress)
        .unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"meow");
    assert!(
        vault.list_archives()[0].archive_file_path().exists(),
        "binary re-copied into its slot"
    );
}

#[test]
fn test_missing_binary_with_unreachable_source_errors() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    let source = fixture(&dir, "cats.zip", &[("a.jpg", b"a")]);

    let LoadOutcome::Loaded(loaded) = vault
        .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };

    // Both the library binary and the original source are gone.
    let slot = vault.list_archives()[0].library_path.clone();
    fs::remove_dir_all(&slot).unwrap();
    fs::remove_file(&source).unwrap();

    let result =
        vault.extract_single_image(&loaded.archive_id, &loaded.images[0].id, &mut NoopProgress);
    assert!(matches!(result, Err(VaultError::ArchiveMissing { .. })));
}

#[test]
fn test_path_spelling_resolves_to_same_archive() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    fs::create_dir(dir.path().join("sub")).unwrap();
    let source = fixture(&dir, "cats.zip", &[("a.jpg", b"a")]);
    let dotted = dir.path().join("sub").join("..").join("cats.zip");

    let LoadOutcome::Loaded(first) = vault
        .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };
    let LoadOutcome::Loaded(second) = vault
        .load_local(&dotted, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };

    assert_eq!(first.archive_id, second.archive_id);
    assert!(second.already_in_library);
    assert_eq!(vault.list_archives().len(), 1);
}

#[test]
fn test_load_from_bytes_dedupes_by_content() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    let source = fixture(&dir, "cats.zip", &[("a.jpg", b"aa")]);
    let bytes = fs::read(&source).unwrap();

    let first = vault
        .load_from_bytes(&bytes, "dropped.zip", &mut NoopProgress)
        .unwrap();
    assert_eq!(first.images.len(), 1);
    assert!(!first.already_in_library);

    // Same content under a different name is the same archive.
    let second = vault
        .load_from_bytes(&bytes, "renamed.zip", &mut NoopProgress)
        .unwrap();
    assert_eq!(first.archive_id, second.archive_id);
    assert!(second.already_in_library);
    assert_eq!(vault.list_archives().len(), 1);
}

#[test]
fn test_history_records_and_renames() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    let source = fixture(&dir, "cats.zip", &[("a.jpg", b"a")]);

    vault
        .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
        .unwrap();
    vault
        .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
        .unwrap();

    let history = vault.history();
    assert_eq!(history.len(), 1, "same source deduplicates");
    assert_eq!(history[0].image_count, 1);

    vault
        .rename_history_entry(&history[0].id, "my favourite cats")
        .unwrap();
    assert_eq!(vault.history()[0].name, "my favourite cats");

    assert!(vault.toggle_history_star(&history[0].id).unwrap());
}

#[test]
fn test_metadata_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    let source = fixture(&dir, "cats.zip", &[("a.jpg", b"a")]);

    let archive_id = {
        let vault = Vault::open(VaultConfig::new(data_dir.clone())).unwrap();
        let LoadOutcome::Loaded(loaded) = vault
            .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
            .unwrap()
        else {
            panic!("expected load");
        };
        vault.toggle_archive_star(&loaded.archive_id).unwrap();
        loaded.archive_id
    };

    let vault = Vault::open(VaultConfig::new(data_dir)).unwrap();
    let archives = vault.list_archives();
    assert_eq!(archives.len(), 1);
    assert_eq!(archives[0].id, archive_id);
    assert!(archives[0].starred);
    assert_eq!(vault.list_images(&archive_id).len(), 1);
}

#[test]
fn test_hostile_entries_never_escape() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    let source = fixture(
        &dir,
        "evil.zip",
        &[
            ("../../escape.jpg", b"evil"),
            ("/abs/path.jpg", b"evil"),
            ("ok.jpg", b"fine"),
        ],
    );

    let LoadOutcome::Loaded(loaded) = vault
        .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };

    assert_eq!(loaded.images.len(), 1);
    assert_eq!(loaded.images[0].original_name, "ok.jpg");
    assert!(!dir.path().join("escape.jpg").exists());
    assert!(!PathBuf::from("/abs/path.jpg").exists());
}

#[test]
fn test_shutdown_removes_sessions_keeps_library() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    let source = fixture(&dir, "cats.zip", &[("a.jpg", b"a")]);

    let LoadOutcome::Loaded(loaded) = vault
        .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };
    assert!(loaded.session_dir.exists());

    vault.shutdown().unwrap();
    assert!(!loaded.session_dir.exists());
    assert!(vault.list_archives()[0].archive_file_path().exists());
}

#[test]
fn test_unsupported_format_rejected_before_copy() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    let source = dir.path().join("document.pdf");
    fs::write(&source, b"%PDF-1.4").unwrap();

    let result = vault.load_local(&source, Some(Placement::Copy), &mut NoopProgress);
    assert!(matches!(result, Err(VaultError::UnsupportedFormat { .. })));
    assert!(vault.list_archives().is_empty());
}

#[test]
fn test_cbz_extension_accepted() {
    let dir = TempDir::new().unwrap();
    let vault = vault(&dir);
    let source = fixture(&dir, "comic.cbz", &[("p1.jpg", b"1"), ("p2.jpg", b"2")]);

    let LoadOutcome::Loaded(loaded) = vault
        .load_local(&source, Some(Placement::Copy), &mut NoopProgress)
        .unwrap()
    else {
        panic!("expected load");
    };
    assert_eq!(loaded.images.len(), 2);
}
