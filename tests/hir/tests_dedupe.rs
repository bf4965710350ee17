//! Renaming of colliding declarations in non-buildable files.

use pkgscope::hir::dedupe_declarations;
use pkgscope::project::parse_dir;

use crate::helpers::workspace::*;

fn colliding() -> Workspace {
    Workspace::new()
        .file(
            "dedupe/shared.go",
            "package dedupe\n\nfunc shared() int {\n\treturn 1\n}\n\nvar _ = shared()\n",
        )
        .file(
            "dedupe/shared_plan9.go",
            "package dedupe\n\nfunc shared() int {\n\treturn 9\n}\n\nvar usePlan9 = shared()\n",
        )
        .file(
            "dedupe/shared_windows.go",
            "package dedupe\n\nfunc shared() int {\n\treturn 3\n}\n\nvar useWindows = shared()\n",
        )
}

#[test]
fn test_collisions_get_numbered_names_in_file_order() {
    let ws = colliding();
    let pkgs = ws.loader().load(&["dedupe"]).unwrap();
    let pkg = &pkgs[0];

    let mut funcs: Vec<String> = pkg
        .scope()
        .members()
        .filter(|s| s.is_func())
        .map(|s| s.name().to_string())
        .collect();
    funcs.sort();
    assert_eq!(funcs, vec!["shared", "shared_nobuild1", "shared_nobuild2"]);
}

#[test]
fn test_renamed_function_keeps_its_uses() {
    let ws = colliding();
    let pkgs = ws.loader().load(&["dedupe"]).unwrap();
    let pkg = &pkgs[0];

    for (name, file) in [
        ("shared", "shared.go"),
        ("shared_nobuild1", "shared_plan9.go"),
        ("shared_nobuild2", "shared_windows.go"),
    ] {
        let sym = pkg.scope().lookup(name).unwrap();
        let lifetime = pkg.lifetime_of(sym).unwrap();
        assert_eq!(lifetime.uses.len(), 1, "{name}");
        let at = pkg.position(lifetime.uses[0].pos).unwrap();
        assert!(at.filename.ends_with(file), "{name} used in {}", at.filename);
    }
}

#[test]
fn test_methods_collide_per_receiver_type() {
    let ws = Workspace::new()
        .file(
            "shapes/box.go",
            "package shapes\n\ntype Box struct{}\n\nfunc (b Box) Len() int {\n\treturn 1\n}\n\ntype Pin struct{}\n",
        )
        .file(
            "shapes/box_windows.go",
            "package shapes\n\nfunc (b Box) Len() int {\n\treturn 2\n}\n\nfunc (p *Pin) Len() int {\n\treturn 3\n}\n",
        );
    let mut raws = parse_dir(&ws.config(), &ws.root().join("shapes"), "shapes").unwrap();
    assert_eq!(raws.len(), 1);

    assert_eq!(dedupe_declarations(&mut raws[0]), 1);
    let pkgs = ws.loader().load(&["shapes"]).unwrap();
    let scope = pkgs[0].scope();
    let box_methods: Vec<String> = scope
        .lookup("Box")
        .unwrap()
        .methods()
        .iter()
        .map(|m| m.name().to_string())
        .collect();
    assert!(box_methods.contains(&"Len".to_string()));
    assert!(box_methods.contains(&"Len_nobuild1".to_string()));
    assert!(scope.lookup("Pin").unwrap().method("Len").is_some());
}

#[test]
fn test_renamed_type_carries_its_methods() {
    let ws = Workspace::new()
        .file("kinds/kind.go", "package kinds\n\ntype Kind int\n\nfunc (k Kind) Name() string {\n\treturn \"kind\"\n}\n")
        .file(
            "kinds/kind_plan9.go",
            "package kinds\n\ntype Kind string\n\nfunc (k Kind) Name() string {\n\treturn string(k)\n}\n",
        );
    let pkgs = ws.loader().load(&["kinds"]).unwrap();
    let scope = pkgs[0].scope();

    let renamed = scope.lookup("Kind_nobuild1").unwrap();
    assert!(renamed.method("Name").is_some());
    assert!(scope.lookup("Kind").unwrap().method("Name").is_some());
}

#[test]
fn test_map_literal_keys_follow_the_rename() {
    let ws = Workspace::new()
        .file("keys/a.go", "package keys\n\nconst shared = \"a\"\n")
        .file(
            "keys/b_windows.go",
            "package keys\n\nconst shared = \"b\"\n\nvar m = map[string]int{shared: 1}\n\nvar n = shared\n",
        );
    let pkgs = ws.loader().load(&["keys"]).unwrap();
    let pkg = &pkgs[0];

    let original = pkg.scope().lookup("shared").unwrap();
    assert!(pkg.lifetime_of(original).unwrap().uses.is_empty());

    let renamed = pkg.scope().lookup("shared_nobuild1").unwrap();
    let uses = &pkg.lifetime_of(renamed).unwrap().uses;
    assert_eq!(uses.len(), 2);
    let lines: Vec<usize> = uses
        .iter()
        .map(|u| pkg.position(u.pos).unwrap().line)
        .collect();
    assert_eq!(lines, vec![5, 7]);
}

#[test]
fn test_generated_name_already_declared_is_skipped() {
    let ws = Workspace::new()
        .file(
            "taken/a.go",
            "package taken\n\nconst shared = 1\n\nconst shared_nobuild1 = 2\n",
        )
        .file("taken/b_windows.go", "package taken\n\nconst shared = 3\n\nvar n = shared\n");
    let pkgs = ws.loader().load(&["taken"]).unwrap();
    let scope = pkgs[0].scope();

    let mut names: Vec<String> = scope
        .members()
        .filter(|s| s.name().starts_with("shared"))
        .map(|s| s.name().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["shared", "shared_nobuild1", "shared_nobuild2"]);

    let renamed = scope.lookup("shared_nobuild2").unwrap();
    assert_eq!(pkgs[0].lifetime_of(renamed).unwrap().uses.len(), 1);
}

#[test]
fn test_nothing_to_rename_without_collisions() {
    let ws = Workspace::new()
        .file("clean/a.go", "package clean\n\nvar A = 1\n")
        .file("clean/b_windows.go", "package clean\n\nvar B = A\n");
    let mut raws = parse_dir(&ws.config(), &ws.root().join("clean"), "clean").unwrap();
    assert_eq!(dedupe_declarations(&mut raws[0]), 0);
}
