use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::*;
use crate::analyzer::{ImportError, SymbolKind};
use crate::parser::parse_file;

#[derive(Default)]
struct MapImporter {
    scopes: FxHashMap<String, Arc<PackageScope>>,
}

impl ImportResolver for MapImporter {
    fn import(&self, path: &str, _src_dir: Option<&Path>) -> Result<Arc<PackageScope>, ImportError> {
        self.scopes
            .get(path)
            .cloned()
            .ok_or_else(|| ImportError::NotFound(path.to_string()))
    }
}

struct Checked {
    analysis: Analysis,
    files: Vec<SourceFile>,
    diags: Vec<Diagnostic>,
}

impl Checked {
    fn hard(&self) -> Vec<&str> {
        self.diags.iter().filter(|d| !d.soft).map(|d| d.message.as_str()).collect()
    }

    fn soft(&self) -> Vec<&str> {
        self.diags.iter().filter(|d| d.soft).map(|d| d.message.as_str()).collect()
    }

    fn member(&self, name: &str) -> Symbol {
        self.analysis.scope.lookup(name).cloned().unwrap()
    }
}

fn check_with(path: &str, sources: &[&str], importer: &MapImporter, fake_foreign: bool) -> Checked {
    let fset = Arc::new(FileSet::new());
    let files: Vec<SourceFile> = sources
        .iter()
        .enumerate()
        .map(|(idx, src)| parse_file(&fset, &format!("f{idx}.go"), src).unwrap())
        .collect();
    let mut diags = Vec::new();
    let analysis = HostChecker.check(
        CheckRequest {
            path,
            dir: None,
            files: files.iter().collect(),
            fset: &fset,
            importer,
            fake_foreign_imports: fake_foreign,
        },
        &mut |d| diags.push(d),
    );
    Checked {
        analysis,
        files,
        diags,
    }
}

fn check(sources: &[&str]) -> Checked {
    check_with("example.com/demo", sources, &MapImporter::default(), false)
}

#[test]
fn test_clean_package() {
    let checked = check(&[
        "package demo\n\nconst (\n\tA = iota\n\tB\n\tC\n)\n\ntype Point struct {\n\tX, Y int\n}\n\nfunc (p *Point) Sum() int {\n\treturn p.X + p.Y\n}\n\nfunc Origin() Point {\n\treturn Point{X: 0, Y: B}\n}\n",
    ]);
    assert!(checked.diags.is_empty(), "{:?}", checked.diags);
    assert_eq!(checked.member("C").const_value(), Some(2));
    let point = checked.member("Point");
    assert_eq!(point.methods().len(), 1);
    assert_eq!(point.methods()[0].ty().to_string(), "func() int");
    assert_eq!(checked.member("Origin").ty().to_string(), "func() example.com/demo.Point");
}

#[test]
fn test_declaration_order_does_not_matter() {
    let checked = check(&[
        "package demo\n\nvar total = count * 2\n\nvar count = len(names)\n\nvar names = []string{\"a\", \"b\"}\n",
        "package demo\n\nfunc use() int {\n\treturn total\n}\n",
    ]);
    assert!(checked.hard().is_empty(), "{:?}", checked.diags);
    assert_eq!(checked.member("total").ty().to_string(), "int");
}

#[test]
fn test_undefined_is_hard() {
    let checked = check(&["package demo\n\nfunc f() int {\n\treturn missing\n}\n"]);
    assert_eq!(checked.hard(), vec!["undefined: missing"]);
}

#[test]
fn test_unused_import_and_local_are_soft() {
    let mut importer = MapImporter::default();
    importer.scopes.insert(
        "strings".into(),
        Arc::new(PackageScope::new("strings", "strings", Default::default())),
    );
    let checked = check_with(
        "example.com/demo",
        &["package demo\n\nimport \"strings\"\n\nfunc f() {\n\tx := 1\n}\n"],
        &importer,
        false,
    );
    assert!(checked.hard().is_empty(), "{:?}", checked.diags);
    assert_eq!(
        checked.soft(),
        vec!["\"strings\" imported and not used", "declared and not used: x"]
    );
}

#[test]
fn test_missing_import_is_hard() {
    let checked = check(&["package demo\n\nimport \"nowhere\"\n"]);
    let hard = checked.hard();
    assert_eq!(hard.len(), 1);
    assert!(hard[0].starts_with("could not import nowhere"));
}

#[test]
fn test_fake_foreign_package_accepts_anything() {
    let src = "package demo\n\n// #include <stdio.h>\nimport \"C\"\n\nfunc f() {\n\tC.puts(C.CString(\"hi\"))\n}\n";
    let checked = check_with("example.com/demo", &[src], &MapImporter::default(), true);
    assert!(checked.diags.is_empty(), "{:?}", checked.diags);

    let checked = check_with("example.com/demo", &[src], &MapImporter::default(), false);
    assert!(!checked.hard().is_empty());
}

#[test]
fn test_imported_members() {
    let lib = check_with(
        "example.com/lib",
        &["package lib\n\ntype Greeter struct{ Name string }\n\nfunc (g Greeter) Hello() string {\n\treturn \"hi \" + g.Name\n}\n\nfunc hidden() {}\n"],
        &MapImporter::default(),
        false,
    );
    assert!(lib.diags.is_empty(), "{:?}", lib.diags);

    let mut importer = MapImporter::default();
    importer
        .scopes
        .insert("example.com/lib".into(), lib.analysis.scope.clone());
    let app = check_with(
        "example.com/app",
        &["package app\n\nimport \"example.com/lib\"\n\nfunc run() string {\n\tg := lib.Greeter{Name: \"x\"}\n\tlib.hidden()\n\treturn g.Hello()\n}\n"],
        &importer,
        false,
    );
    assert_eq!(app.hard(), vec!["name hidden not exported by package lib"]);

    // The import has no name, so its symbol is recorded as implicit.
    let spec = app.files[0].imports().next().unwrap();
    let pkg = &app.analysis.info.implicits[&spec.id];
    assert_eq!(pkg.kind(), SymbolKind::PkgName);
    assert_eq!(pkg.imported().unwrap().path().as_ref(), "example.com/lib");
}

#[test]
fn test_type_switch_clause_symbols() {
    let checked = check(&[
        "package demo\n\nfunc f(v any) int {\n\tswitch x := v.(type) {\n\tcase int:\n\t\treturn x\n\tcase string, bool:\n\t\treturn 0\n\tdefault:\n\t\treturn 1\n\t}\n\treturn 2\n}\n",
    ]);
    assert!(checked.diags.is_empty(), "{:?}", checked.diags);
    let implicits: Vec<String> = checked
        .analysis
        .info
        .implicits
        .values()
        .map(|sym| sym.ty().to_string())
        .collect();
    assert_eq!(implicits, vec!["int", "interface{}", "interface{}"]);
}

#[test]
fn test_no_new_variables() {
    let checked = check(&["package demo\n\nfunc f() int {\n\tx := 1\n\tx := 2\n\treturn x\n}\n"]);
    assert_eq!(checked.hard(), vec!["no new variables on left side of :="]);
}

#[test]
fn test_comma_ok_and_mismatch() {
    let checked = check(&[
        "package demo\n\nfunc pair() (int, error) {\n\treturn 0, nil\n}\n\nfunc f(m map[string]int) int {\n\tv, ok := m[\"k\"]\n\ta, err := pair()\n\tif ok && err == nil {\n\t\treturn v + a\n\t}\n\tb := pair()\n\treturn b\n}\n",
    ]);
    assert_eq!(checked.hard().len(), 1, "{:?}", checked.diags);
    assert!(checked.hard()[0].starts_with("multiple-value pair()"));
}

#[test]
fn test_embedded_field_promotion() {
    let checked = check(&[
        "package demo\n\ntype Base struct{ ID int }\n\nfunc (b Base) Key() int {\n\treturn b.ID\n}\n\ntype Item struct {\n\tBase\n\tName string\n}\n\nfunc f(it *Item) int {\n\treturn it.ID + it.Key()\n}\n",
    ]);
    assert!(checked.diags.is_empty(), "{:?}", checked.diags);
}

#[test]
fn test_recursive_type_reported() {
    let checked = check(&["package demo\n\ntype A B\n\ntype B A\n"]);
    assert!(checked.hard().iter().any(|m| m.starts_with("invalid recursive type")));
}

#[test]
fn test_eval_type() {
    let importer = MapImporter::default();
    let ty = HostChecker.eval_type("[10]int", &importer).unwrap();
    assert_eq!(ty.to_string(), "[10]int");
    let ty = HostChecker.eval_type("map[string]*bool", &importer).unwrap();
    assert_eq!(ty.to_string(), "map[string]*bool");
    let err = HostChecker.eval_type("nope", &importer).unwrap_err();
    assert_eq!(err.message, "undefined: nope");
}
