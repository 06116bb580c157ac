//! Integration tests for fsroute-router
//!
//! Builds throwaway route trees on disk and checks the discovered table.

use fsroute_router::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "// route\n").unwrap();
}

fn routes_dir(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
        touch(dir.path(), file);
    }
    dir
}

#[test]
fn test_discovers_nextjs_style_tree() {
    let dir = routes_dir(&[
        "index.rs",
        "user/[id]/index.rs",
        "static/[[...a]].rs",
        "healthcheck/index.rs",
    ]);

    let router = FileSystemRouter::new(dir.path()).unwrap();
    let tokens: Vec<&str> = router.tokens().collect();

    assert_eq!(
        tokens,
        vec!["/", "/healthcheck", "/static/[[...a]]", "/user/[id]"]
    );
    assert_eq!(
        router.match_token("/user/[id]").unwrap().relative_path,
        "user/[id]/index.rs"
    );
}

#[test]
fn test_ignores_non_route_files() {
    let dir = routes_dir(&[
        "index.rs",
        "mod.rs",
        "user/mod.rs",
        "_helpers.rs",
        "_private/secret.rs",
        ".hidden/x.rs",
        "notes.md",
    ]);

    let router = FileSystemRouter::new(dir.path()).unwrap();
    let tokens: Vec<&str> = router.tokens().collect();
    assert_eq!(tokens, vec!["/"]);
}

#[test]
fn test_route_groups_do_not_add_segments() {
    let dir = routes_dir(&["(marketing)/pricing.rs", "(shop)/cart/index.rs"]);

    let router = FileSystemRouter::new(dir.path()).unwrap();
    let tokens: Vec<&str> = router.tokens().collect();
    assert_eq!(tokens, vec!["/cart", "/pricing"]);
}

#[test]
fn test_invalid_files_are_skipped() {
    let dir = routes_dir(&["docs/[...slug]/edit.rs", "ok.rs"]);

    let router = FileSystemRouter::new(dir.path()).unwrap();
    assert_eq!(router.len(), 1);
    assert!(router.match_token("/ok").is_some());
}

#[test]
fn test_collision_keeps_first_file() {
    let dir = routes_dir(&["about.rs", "about/index.rs"]);

    let router = FileSystemRouter::new(dir.path()).unwrap();
    assert_eq!(router.len(), 1);
    assert_eq!(router.match_token("/about").unwrap().relative_path, "about/index.rs");
}

#[test]
fn test_match_token_normalizes() {
    let dir = routes_dir(&["user/[id]/index.rs"]);

    let router = FileSystemRouter::new(dir.path()).unwrap();
    assert!(router.match_token("/user/[id]/").is_some());
    assert!(router.match_token("/user").is_none());
}

#[test]
fn test_reload_picks_up_changes() {
    let dir = routes_dir(&["index.rs"]);

    let mut router = FileSystemRouter::new(dir.path()).unwrap();
    assert_eq!(router.len(), 1);

    touch(dir.path(), "user/[id]/index.rs");
    fs::remove_file(dir.path().join("index.rs")).unwrap();
    router.reload().unwrap();

    let tokens: Vec<&str> = router.tokens().collect();
    assert_eq!(tokens, vec!["/user/[id]"]);
}

#[test]
fn test_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");

    let err = FileSystemRouter::new(&missing).unwrap_err();
    assert!(matches!(err, ScanError::MissingDir(p) if p == missing));
}

#[test]
fn test_custom_extension_and_origin() {
    let dir = routes_dir(&["index.ts", "about.ts", "skipped.rs"]);

    let router = FileSystemRouter::with_options(
        dir.path(),
        RouterOptions {
            extension: "ts".to_string(),
            origin: "http://example.com/".to_string(),
        },
    )
    .unwrap();

    let tokens: Vec<&str> = router.tokens().collect();
    assert_eq!(tokens, vec!["/", "/about"]);
    assert_eq!(router.url_for("/about"), "http://example.com/about");
}
