//! Pattern matching and directory splitting before any checking.

use pkgscope::project::{discover, parse_dir};

use crate::helpers::workspace::*;

fn tree() -> Workspace {
    Workspace::new()
        .file("net/net.go", "package net\n")
        .file("net/net_test.go", "package net_test\n")
        .file("net/http/http.go", "package http\n")
        .file("net/http/gen.go", "//go:build ignore\n\npackage main\n")
        .file("net/testdata/fixture.go", "package fixture\n")
        .file("netx/netx.go", "package netx\n")
}

#[test]
fn test_tree_pattern_groups_every_variant() {
    let ws = tree();
    let found = discover(&ws.config(), &["net/...", "netx"]).unwrap();
    assert_eq!(
        found.groups,
        vec![
            vec!["net", "net:xtest", "net/http", "net/http:nobuild(main)"],
            vec!["netx"],
        ]
    );
    assert_eq!(found.packages.len(), 5);
}

#[test]
fn test_reserved_dirs_are_not_walked() {
    let ws = tree();
    let found = discover(&ws.config(), &["..."]).unwrap();
    assert!(found.groups[0].iter().all(|id| !id.contains("testdata")));
    assert!(found.groups[0].contains(&"netx".to_string()));

    let config = ws.config().with_reserved_dir("http");
    let found = discover(&config, &["net/..."]).unwrap();
    assert_eq!(found.groups[0], vec!["net", "net:xtest"]);
}

#[test]
fn test_directory_is_parsed_once_per_discovery() {
    let ws = tree();
    let found = discover(&ws.config(), &["net", "net/...", "net:xtest"]).unwrap();
    assert_eq!(found.groups[0], vec!["net"]);
    assert_eq!(found.groups[2], vec!["net:xtest"]);
    let net = &found.packages["net"];
    let xtest = &found.packages["net:xtest"];
    assert!(std::sync::Arc::ptr_eq(&net.fset, &xtest.fset));
}

#[test]
fn test_local_wildcard_keeps_relative_identities() {
    let ws = tree();
    let found = discover(&ws.config(), &["./net/..."]).unwrap();
    assert_eq!(found.groups[0][0], "./net");
    assert!(found.groups[0].contains(&"./net/http".to_string()));
}

#[test]
fn test_parse_dir_marks_excluded_files() {
    let ws = Workspace::new()
        .file("os/file.go", "package os\n")
        .file("os/file_windows.go", "package os\n")
        .file("os/file_linux.go", "package os\n")
        .file("os/tagged.go", "//go:build darwin || freebsd\n\npackage os\n");
    let raws = parse_dir(&ws.config(), &ws.root().join("os"), "os").unwrap();
    assert_eq!(raws.len(), 1);

    let raw = &raws[0];
    assert_eq!(raw.files.len(), 4);
    let mut excluded: Vec<&str> = raw.non_buildable_files().map(|f| f.base_name()).collect();
    excluded.sort();
    assert_eq!(excluded, vec!["file_windows.go", "tagged.go"]);
}

#[test]
fn test_build_tags_select_files() {
    let ws = Workspace::new()
        .file("feat/base.go", "package feat\n")
        .file("feat/extra.go", "//go:build extra\n\npackage feat\n")
        .with_build(linux().with_tags(["extra"]));
    let raws = parse_dir(&ws.config(), &ws.root().join("feat"), "feat").unwrap();
    assert_eq!(raws[0].non_buildable_files().count(), 0);
}
