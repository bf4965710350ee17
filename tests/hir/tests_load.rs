//! Load results: grouping, ordering and cache identity.

use std::sync::Arc;

use crate::helpers::workspace::*;
use pkgscope::{LoadError, Loader, PackageCache};

fn tree() -> Workspace {
    Workspace::new()
        .file("zeta/zeta.go", "package zeta\n\nconst Z = 26\n")
        .file("alpha/alpha.go", "package alpha\n\nconst A = 1\n")
        .file("alpha/one/one.go", "package one\n\nconst One = 1\n")
        .file(
            "alpha/one/one_test.go",
            "package one_test\n\nimport \"alpha/one\"\n\nvar Check = one.One\n",
        )
        .file("alpha/two/two.go", "package two\n\nconst Two = 2\n")
        .file("alpha/.hidden/h.go", "package hidden\n")
        .file("alpha/_skip/s.go", "package skip\n")
        .file("alpha/testdata/t.go", "package fixture\n")
}

// =============================================================================
// ORDERING
// =============================================================================

#[test]
fn test_groups_follow_request_order_and_sort_by_identity() {
    let ws = tree();
    let pkgs = ws.loader().load(&["zeta", "alpha/..."]).unwrap();
    assert_eq!(
        identities(&pkgs),
        vec!["zeta", "alpha", "alpha/one", "alpha/one:xtest", "alpha/two"]
    );
}

#[test]
fn test_package_in_several_groups_appears_once() {
    let ws = tree();
    let pkgs = ws.loader().load(&["alpha/one", "alpha/...", "zeta"]).unwrap();
    assert_eq!(
        identities(&pkgs),
        vec!["alpha/one", "alpha", "alpha/one:xtest", "alpha/two", "zeta"]
    );
}

#[test]
fn test_wildcard_skips_hidden_underscore_and_fixture_dirs() {
    let ws = tree();
    let pkgs = ws.loader().load(&["alpha/..."]).unwrap();
    assert!(
        pkgs.iter()
            .all(|p| !["hidden", "skip", "fixture"].contains(&p.name()))
    );
}

// =============================================================================
// DETERMINISM
// =============================================================================

#[test]
fn test_repeated_loads_return_identical_packages() {
    let ws = tree();
    let loader = ws.loader();

    let first = loader.load(&["alpha/..."]).unwrap();
    let again = loader.load(&["alpha/..."]).unwrap();
    let exact = loader.load(&["alpha/two", "alpha/one:xtest"]).unwrap();

    for (a, b) in first.iter().zip(again.iter()) {
        assert!(Arc::ptr_eq(a, b), "{a} was checked twice");
    }
    assert!(Arc::ptr_eq(first.get("alpha/two").unwrap(), &exact[0]));
    assert!(Arc::ptr_eq(first.get("alpha/one:xtest").unwrap(), &exact[1]));
}

#[test]
fn test_overlapping_patterns_share_packages() {
    let ws = tree();
    let loader = ws.loader();

    let one = loader.load(&["alpha/one"]).unwrap();

    assert_eq!(loader.cache().len(), 1);
    let all = loader.load(&["alpha/..."]).unwrap();

    assert!(Arc::ptr_eq(&one[0], all.get("alpha/one").unwrap()));
    assert_eq!(loader.cache().len(), 4);
}

#[test]
fn test_loaders_sharing_a_cache_share_packages() {
    let ws = tree();
    let cache = Arc::new(PackageCache::new());
    let first = Loader::with_cache(ws.config(), cache.clone());
    let second = Loader::with_cache(ws.config(), cache);

    let a = first.load(&["zeta"]).unwrap();
    let b = second.load(&["zeta"]).unwrap();
    assert!(Arc::ptr_eq(&a[0], &b[0]));
}

// =============================================================================
// VARIANTS
// =============================================================================

#[test]
fn test_excluded_only_package_gets_its_own_identity() {
    let ws = Workspace::new()
        .file("tools/main.go", "package main\n\nfunc main() {}\n")
        .file("tools/gen.go", "//go:build ignore\n\npackage gen\n\nvar Generated = 1\n");
    let loader = ws.loader();

    let pkgs = loader.load(&["tools/..."]).unwrap();
    assert_eq!(identities(&pkgs), vec!["tools", "tools:nobuild(gen)"]);

    let gen_pkg = loader.load(&["tools:nobuild(gen)"]).unwrap();
    assert!(Arc::ptr_eq(&gen_pkg[0], &pkgs[1]));
    assert_eq!(gen_pkg[0].name(), "gen");
    assert_eq!(gen_pkg[0].path(), "tools:nobuild(gen)");
}

#[test]
fn test_excluded_name_is_primary_when_nothing_builds() {
    let ws = Workspace::new().file("win/only_windows.go", "package win\n\nvar Handle = 1\n");

    let pkgs = ws.loader().load(&["win"]).unwrap();
    assert_eq!(identities(&pkgs), vec!["win"]);
    assert_eq!(pkgs[0].files().len(), 1);
}

// =============================================================================
// ERRORS
// =============================================================================

#[test]
fn test_unmatched_wildcard_is_an_error() {
    let ws = tree();
    let err = ws.loader().load(&["zeta", "nothing/..."]).unwrap_err();
    assert!(matches!(err, LoadError::NoMatch(ref p) if p == "nothing/..."), "{err}");
}

#[test]
fn test_missing_package_is_an_error() {
    let ws = tree();
    let loader = ws.loader();
    assert!(matches!(
        loader.load(&["missing"]).unwrap_err(),
        LoadError::PackageNotFound(ref p) if p == "missing"
    ));
    assert!(matches!(
        loader.load(&["zeta:xtest"]).unwrap_err(),
        LoadError::PackageNotFound(ref p) if p == "zeta:xtest"
    ));
}

#[test]
fn test_two_buildable_package_names_are_ambiguous() {
    let ws = Workspace::new()
        .file("mixed/a.go", "package first\n")
        .file("mixed/b.go", "package second\n");
    let err = ws.loader().load(&["mixed"]).unwrap_err();
    assert!(
        matches!(err, LoadError::AmbiguousPackage { ref first, ref second, .. } if first == "first" && second == "second"),
        "{err}"
    );
}

#[test]
fn test_two_external_test_packages_are_rejected() {
    let ws = Workspace::new()
        .file("dup/dup.go", "package dup\n")
        .file("dup/a_test.go", "package dup_test\n")
        .file("dup/b_test.go", "package other_test\n");
    let err = ws.loader().load(&["dup"]).unwrap_err();
    assert!(matches!(err, LoadError::MultipleTestPackages { .. }), "{err}");
}

#[test]
fn test_block_comments_are_accepted() {
    let ws = Workspace::new().file(
        "bc/bc.go",
        "/* Package bc has a block doc comment. */\npackage bc\n\nvar X = /* inline */ 1\n",
    );
    let pkgs = ws.loader().load(&["bc"]).unwrap();
    assert!(pkgs[0].lookup_object("bc.X").is_ok());
}

#[test]
fn test_syntax_error_aborts_the_load() {
    let ws = Workspace::new().file("bad/bad.go", "package bad\n\nfunc (\n");
    let err = ws.loader().load(&["bad"]).unwrap_err();
    assert!(matches!(err, LoadError::Parse(_)), "{err}");
}

#[test]
fn test_hard_error_in_buildable_file_aborts_the_load() {
    let ws = Workspace::new().file(
        "broken/broken.go",
        "package broken\n\nfunc f() int {\n\treturn missing\n}\n",
    );
    let loader = ws.loader();
    let err = loader.load(&["broken"]).unwrap_err();

    let LoadError::Analysis {
        identity,
        position,
        message,
    } = err
    else {
        panic!("expected an analysis error, got {err}");
    };
    assert_eq!(identity, "broken");
    assert_eq!(message, "undefined: missing");
    assert_eq!(position.line, 4);
    assert!(position.filename.ends_with("broken.go"));
    assert!(loader.cache().is_empty());
}

#[test]
fn test_errors_in_excluded_files_are_ignored() {
    let ws = Workspace::new()
        .file("plat/plat.go", "package plat\n\nvar Ready = true\n")
        .file(
            "plat/plat_windows.go",
            "package plat\n\nimport \"golang.org/x/sys/windows\"\n\nvar handle = windows.Handle(0)\n\nvar typo int = \"nope\"\n",
        );
    let pkgs = ws.loader().load(&["plat"]).unwrap();
    assert_eq!(pkgs[0].files().len(), 2);
    assert!(pkgs[0].lookup_object("plat.handle").is_ok());
}

#[test]
fn test_soft_diagnostics_are_ignored() {
    let ws = Workspace::new()
        .file("util/util.go", "package util\n\nfunc Twice(n int) int {\n\treturn n * 2\n}\n")
        .file(
            "lazy/lazy.go",
            "package lazy\n\nimport \"util\"\n\nfunc f() {\n\tunused := 1\n}\n",
        );
    assert!(ws.loader().load(&["lazy"]).is_ok());
}
