//! Type and object lookup by specifier.

use pkgscope::{LookupError, SymbolKind};
use rstest::rstest;

use crate::helpers::workspace::*;

#[rstest]
#[case("shapes.Point", "shapes.Point")]
#[case("*shapes.Point", "*shapes.Point")]
#[case("shapes.*Point", "*shapes.Point")]
#[case("geo.Path", "geo.Path")]
#[case("[5]int", "[5]int")]
#[case("map[string]int", "map[string]int")]
fn test_lookup_type(#[case] spec: &str, #[case] expected: &str) {
    let geo = SHARED.packages.get("geo").unwrap();
    let ty = geo.lookup_type(spec).unwrap();
    assert_eq!(ty.to_string(), expected);
}

#[test]
fn test_lookup_type_through_import_is_the_loaded_type() {
    let geo = SHARED.packages.get("geo").unwrap();
    let shapes = SHARED.packages.get("shapes").unwrap();
    let point = shapes.scope().lookup("Point").unwrap();

    let ty = geo.lookup_type("shapes.Point").unwrap();
    assert_eq!(ty.as_named(), Some(point));
}

#[test]
fn test_lookup_type_rejects_non_types() {
    let geo = SHARED.packages.get("geo").unwrap();
    assert!(matches!(
        geo.lookup_type("shapes.Area"),
        Err(LookupError::NotAType(ref name)) if name == "shapes.Area"
    ));
    assert!(matches!(
        geo.lookup_type("shapes.Missing"),
        Err(LookupError::NotFound { .. })
    ));
    assert!(matches!(geo.lookup_type("[x]int"), Err(LookupError::Eval { .. })));
}

#[test]
fn test_lookup_object_members() {
    let geo = SHARED.packages.get("geo").unwrap();

    let x = geo.lookup_object("shapes.Point.X").unwrap();
    assert!(x.is_field());
    assert_eq!(x.name(), "X");

    let add = geo.lookup_object("shapes.Point.Add").unwrap();
    assert!(add.is_func());

    let walk = geo.lookup_object("geo.Walk").unwrap();
    assert_eq!(walk.kind(), SymbolKind::Func);
}

#[test]
fn test_lookup_object_errors() {
    let geo = SHARED.packages.get("geo").unwrap();
    assert!(matches!(
        geo.lookup_object("shapes"),
        Err(LookupError::InvalidSpecifier(_))
    ));
    assert!(matches!(
        geo.lookup_object("shapes.Point.Z"),
        Err(LookupError::NoMember { ref member, .. }) if member == "Z"
    ));
    assert!(matches!(
        geo.lookup_object("nowhere.X"),
        Err(LookupError::Import { ref path, .. }) if path == "nowhere"
    ));
    assert!(matches!(
        geo.lookup_object("geo.Nothing"),
        Err(LookupError::NotFound { .. })
    ));
}

#[test]
fn test_lookup_object_falls_back_to_implicit_import_name() {
    let geo = SHARED.packages.get("geo").unwrap();
    let pkg_name = geo.lookup_object("geo.shapes").unwrap();
    assert_eq!(pkg_name.kind(), SymbolKind::PkgName);
}

#[test]
fn test_lookups_are_memoized() {
    let geo = SHARED.packages.get("geo").unwrap();
    let first = geo.lookup_object("shapes.NewPoint").unwrap();
    let again = geo.lookup_object("shapes.NewPoint").unwrap();
    assert_eq!(first, again);
    assert_eq!(
        geo.lookup_type("*shapes.Point").unwrap(),
        geo.lookup_type("*shapes.Point").unwrap()
    );
}
