//! Lifetime index contents of checked packages.

use crate::helpers::workspace::*;
use pkgscope::SymbolKind;

#[test]
fn test_lifetime_spans_every_definition_and_use() {
    for pkg in SHARED.packages.iter() {
        for (sym, lifetime) in pkg.lifetimes().iter() {
            let idents = lifetime.def.iter().chain(&lifetime.uses);
            for ident in idents {
                assert!(lifetime.first <= ident.pos, "{sym:?} starts too late");
                assert!(lifetime.last >= ident.end, "{sym:?} ends too early");
            }
        }
    }
}

#[test]
fn test_records_are_ordered_by_first_position() {
    let geo = SHARED.packages.get("geo").unwrap();
    let firsts: Vec<_> = geo.lifetimes().iter().map(|(_, l)| l.first).collect();
    let mut sorted = firsts.clone();
    sorted.sort();
    assert_eq!(firsts, sorted);
}

#[test]
fn test_local_variable_lifetime() {
    let geo = SHARED.packages.get("geo").unwrap();
    let at = geo
        .search_objects(|s| s.kind() == SymbolKind::Var && s.name() == "at")
        .pop()
        .unwrap();
    let lifetime = geo.lifetime_of(&at).unwrap();

    let def = lifetime.def.as_ref().unwrap();
    assert_eq!(geo.position(def.pos).unwrap().line, 10);
    let lines: Vec<usize> = lifetime
        .uses
        .iter()
        .map(|u| geo.position(u.pos).unwrap().line)
        .collect();
    assert_eq!(lines, vec![13, 13, 15]);
    assert_eq!(geo.position(lifetime.last).unwrap().line, 15);
    assert!(lifetime.contains(def.pos));
    assert!(!lifetime.contains(lifetime.last));
}

#[test]
fn test_imported_symbol_has_no_local_definition() {
    let shapes = SHARED.packages.get("shapes").unwrap();
    let geo = SHARED.packages.get("geo").unwrap();
    let area = shapes.scope().lookup("Area").unwrap();

    let in_geo = geo.lifetime_of(area).unwrap();
    assert!(in_geo.def.is_none());
    assert_eq!(in_geo.uses.len(), 2);

    let in_shapes = shapes.lifetime_of(area).unwrap();
    assert!(in_shapes.def.is_some());
    assert!(in_shapes.uses.is_empty());
}

#[test]
fn test_iterate_objects_visits_every_record() {
    let shapes = SHARED.packages.get("shapes").unwrap();
    let mut seen = Vec::new();
    shapes.iterate_objects(|sym| seen.push(sym.clone()));
    let recorded: Vec<_> = shapes.lifetimes().symbols().cloned().collect();
    for sym in &recorded {
        assert!(seen.contains(sym), "{} not visited", sym.name());
    }
}

#[test]
fn test_iterate_objects_includes_type_switch_clause_symbols() {
    let ws = Workspace::new().file(
        "sw/sw.go",
        "package sw\n\ntype T struct{}\n\nfunc f(x any) {\n\tswitch v := x.(type) {\n\tcase T:\n\t\t_ = v\n\tcase int:\n\t}\n}\n",
    );
    let pkgs = ws.loader().load(&["sw"]).unwrap();
    let pkg = &pkgs[0];

    let mut all = Vec::new();
    pkg.iterate_objects(|sym| all.push(sym.clone()));
    assert_eq!(all.len(), pkg.lifetimes().len() + 1);

    let clauses: Vec<_> = all.iter().filter(|s| s.name() == "v").collect();
    assert_eq!(clauses.len(), 2);
    let mut types: Vec<String> = clauses.iter().map(|s| s.ty().to_string()).collect();
    types.sort();
    assert_eq!(types, vec!["int", "sw.T"]);

    let used: Vec<_> = clauses
        .iter()
        .filter_map(|s| pkg.lifetime_of(s))
        .collect();
    assert_eq!(used.len(), 1);
    assert_eq!(used[0].uses.len(), 1);
    assert!(used[0].def.is_none());
}
