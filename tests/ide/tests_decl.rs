//! Declaration jumps within and across packages.

use std::sync::Arc;

use pkgscope::{Node, QueryError, SymbolKind};

use crate::helpers::workspace::*;

fn declared_name(node: Node<'_>) -> String {
    node.as_ident().map(|i| i.name.to_string()).unwrap_or_default()
}

#[test]
fn test_declaration_of_function_in_loaded_package() {
    let geo = SHARED.packages.get("geo").unwrap();
    let new_point = geo.lookup_object("shapes.NewPoint").unwrap();

    let (name, parent, owner) = SHARED
        .loader
        .decl_of(geo, &new_point, |owner, decl| {
            (
                declared_name(decl.node),
                decl.ancestors.parent().map(|p| p.kind_name()),
                owner.identity().to_string(),
            )
        })
        .unwrap();
    assert_eq!(name, "NewPoint");
    assert_eq!(parent, Some("FuncDecl"));
    assert_eq!(owner, "shapes");
}

#[test]
fn test_owner_of_local_symbol_is_the_package_itself() {
    let geo = SHARED.packages.get("geo").unwrap();
    let at = geo
        .search_objects(|s| s.kind() == SymbolKind::Var && s.name() == "at")
        .pop()
        .unwrap();

    let owner = SHARED.loader.owner_of(geo, &at).unwrap();
    assert!(Arc::ptr_eq(&owner, geo));

    let decl = geo.declaration_of(&at).unwrap();
    assert_eq!(declared_name(decl.node), "at");
    assert_eq!(decl.ancestors.parent().map(|p| p.kind_name()), Some("AssignStmt"));
}

#[test]
fn test_declaration_of_field() {
    let shapes = SHARED.packages.get("shapes").unwrap();
    let y = shapes.lookup_object("shapes.Point.Y").unwrap();

    let decl = shapes.declaration_of(&y).unwrap();
    assert_eq!(declared_name(decl.node), "Y");
    assert_eq!(decl.ancestors.parent().map(|p| p.kind_name()), Some("Field"));
}

#[test]
fn test_declaration_across_independent_checks() {
    let ws = shapes_workspace();
    let loader = ws.loader();
    let pkgs = loader.load(&["geo"]).unwrap();
    let geo = &pkgs[0];
    assert!(!loader.cache().contains("shapes"));

    let area = geo.lookup_object("shapes.Area").unwrap();
    let line = loader
        .decl_of(geo, &area, |owner, decl| {
            owner.position(decl.node.span().start).map(|p| p.line)
        })
        .unwrap();
    assert_eq!(line, Some(16));
    assert!(loader.cache().contains("shapes"));
}

#[test]
fn test_universe_symbols_have_no_declaration() {
    let geo = SHARED.packages.get("geo").unwrap();
    let int = geo
        .search_objects(|s| s.name() == "int" && s.package().is_none())
        .pop()
        .unwrap();

    assert!(matches!(
        SHARED.loader.owner_of(geo, &int),
        Err(QueryError::NoDeclaration(_))
    ));
    assert!(matches!(
        geo.declaration_of(&int),
        Err(QueryError::NoDeclaration(_))
    ));
}

#[test]
fn test_owner_that_cannot_be_loaded() {
    let ws = Workspace::new()
        .file("gone/gone.go", "package gone\n\nfunc F() {}\n")
        .file("user/user.go", "package user\n\nimport \"gone\"\n\nfunc G() {\n\tgone.F()\n}\n");
    let loader = ws.loader();
    let pkgs = loader.load(&["user"]).unwrap();
    let f = pkgs[0].lookup_object("gone.F").unwrap();

    std::fs::remove_dir_all(ws.root().join("gone")).unwrap();
    assert!(matches!(
        loader.owner_of(&pkgs[0], &f),
        Err(QueryError::OwnerNotLoaded { ref path, .. }) if path == "gone"
    ));
}
