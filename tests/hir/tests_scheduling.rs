//! Import-ordered checking within one load.

use std::sync::Arc;

use crate::helpers::workspace::*;
use pkgscope::SymbolKind;

#[test]
fn test_importer_sees_the_checked_dependency() {
    let ws = shapes_workspace();
    let pkgs = ws.loader().load(&["geo", "shapes"]).unwrap();
    let geo = pkgs.get("geo").unwrap();
    let shapes = pkgs.get("shapes").unwrap();

    let pkg_name = geo
        .search_objects(|s| s.kind() == SymbolKind::PkgName && s.name() == "shapes")
        .pop()
        .unwrap();
    let imported = pkg_name.imported().unwrap();
    assert!(Arc::ptr_eq(imported, shapes.scope()));

    let new_point = shapes.scope().lookup("NewPoint").unwrap();
    assert!(geo.lifetime_of(new_point).is_some());
}

#[test]
fn test_external_test_package_uses_its_primary() {
    let ws = Workspace::new()
        .file("calc/calc.go", "package calc\n\nfunc Sum(a, b int) int {\n\treturn a + b\n}\n")
        .file(
            "calc/calc_test.go",
            "package calc_test\n\nimport \"calc\"\n\nvar Five = calc.Sum(2, 3)\n",
        );
    let pkgs = ws.loader().load(&["calc/..."]).unwrap();
    assert_eq!(identities(&pkgs), vec!["calc", "calc:xtest"]);

    let sum = pkgs[0].scope().lookup("Sum").unwrap();
    let uses = &pkgs[1].lifetime_of(sum).unwrap().uses;
    assert_eq!(uses.len(), 1);
}

#[test]
fn test_import_cycle_falls_back_to_unordered_checking() {
    let ws = Workspace::new()
        .file("a/a.go", "package a\n\nimport \"b\"\n\nvar X = b.Y + 1\n")
        .file("b/b.go", "package b\n\nimport \"a\"\n\nvar Y = a.Z\n")
        .file("b/vendor/a/a.go", "package a\n\nvar Z = 41\n");
    let loader = ws.loader();

    let pkgs = loader.load(&["a", "b"]).unwrap();
    assert_eq!(identities(&pkgs), vec!["a", "b"]);
    assert!(loader.cache().contains("a"));
    assert!(loader.cache().contains("b"));
    for pkg in pkgs.iter() {
        assert!(!pkg.lifetimes().is_empty(), "{pkg} has no lifetimes");
    }
    assert!(pkgs[0].lookup_object("a.X").is_ok());
    assert!(pkgs[1].lookup_object("b.Y").is_ok());
}

#[test]
fn test_dependency_outside_the_load_is_checked_from_source() {
    let ws = shapes_workspace();
    let loader = ws.loader();

    let pkgs = loader.load(&["geo"]).unwrap();
    assert_eq!(identities(&pkgs), vec!["geo"]);
    assert!(!loader.cache().contains("shapes"));
    assert!(pkgs[0].lookup_type("shapes.Point").is_ok());
}
