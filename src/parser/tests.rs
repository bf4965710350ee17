use super::*;
use crate::base::FileSet;
use crate::syntax::ast::*;

fn parse(src: &str) -> SourceFile {
    let fset = FileSet::new();
    parse_file(&fset, "test.go", src).unwrap()
}

fn func<'a>(file: &'a SourceFile, name: &str) -> &'a FuncDecl {
    file.decls
        .iter()
        .find_map(|d| match d {
            Decl::Func(f) if f.name.name == name => Some(f),
            _ => None,
        })
        .unwrap()
}

#[test]
fn test_package_and_imports() {
    let file = parse(
        "package demo\n\nimport (\n\t\"fmt\"\n\tstrs \"strings\"\n)\n\nimport \"os\"\n",
    );
    assert_eq!(file.package_name.name, "demo");
    let paths: Vec<String> = file.import_paths().collect();
    assert_eq!(paths, vec!["fmt", "strings", "os"]);
    let named = file.imports().nth(1).unwrap();
    assert_eq!(named.name.as_ref().unwrap().name, "strs");
}

#[test]
fn test_foreign_import_keeps_preamble() {
    let file = parse("package demo\n\n// #include <stdio.h>\n// int x;\nimport \"C\"\n");
    assert!(file.imports_foreign());
    let spec = file.imports().next().unwrap();
    assert_eq!(spec.doc.as_deref(), Some("#include <stdio.h>\nint x;"));
}

#[test]
fn test_foreign_import_keeps_block_preamble() {
    let file = parse("/* Package demo wraps libc. */
package demo

/*
#include <stdlib.h>
*/
import \"C\"
");
    assert_eq!(file.package_name.name, "demo");
    let spec = file.imports().next().unwrap();
    assert_eq!(spec.doc.as_deref(), Some("#include <stdlib.h>"));
}

#[test]
fn test_method_and_receiver() {
    let file = parse(
        "package demo\n\ntype T struct {\n\tA, B int\n\tname string `json:\"name\"`\n}\n\nfunc (t *T) Sum(x, y int) (int, error) {\n\treturn t.A + x + y, nil\n}\n",
    );
    let sum = func(&file, "Sum");
    assert_eq!(sum.receiver_base().unwrap().name, "T");
    assert_eq!(sum.ty.params.len(), 1);
    assert_eq!(sum.ty.params[0].names.len(), 2);
    assert_eq!(sum.ty.results.len(), 2);

    let Decl::Gen(gen_decl) = &file.decls[0] else {
        panic!("expected type decl");
    };
    let Spec::Type(spec) = &gen_decl.specs[0] else {
        panic!("expected type spec");
    };
    let Expr::StructType(st) = &spec.ty else {
        panic!("expected struct");
    };
    assert_eq!(st.fields.len(), 2);
    assert_eq!(st.fields[0].names.len(), 2);
}

#[test]
fn test_control_flow_headers() {
    let file = parse(
        "package demo\n\ntype P struct{ X int }\n\nfunc f(n int) {\n\tfor i := 0; i < n; i++ {\n\t}\n\tif p := (P{X: 1}); p.X > 0 {\n\t}\n\tswitch {\n\tcase n > 1:\n\t\tn--\n\tdefault:\n\t}\n\tfor {\n\t\tbreak\n\t}\n}\n",
    );
    let body = func(&file, "f").body.as_ref().unwrap();
    assert!(matches!(body.stmts[0], Stmt::For(_)));
    assert!(matches!(body.stmts[1], Stmt::If(_)));
    let Stmt::Switch(switch) = &body.stmts[2] else {
        panic!("expected switch");
    };
    assert!(switch.tag.is_none());
    assert_eq!(switch.clauses.len(), 2);
    assert!(switch.clauses[1].list.is_empty());
}

#[test]
fn test_type_switch() {
    let file = parse(
        "package demo\n\nfunc f(v interface{}) {\n\tswitch x := v.(type) {\n\tcase int, string:\n\t\t_ = x\n\tcase nil:\n\t}\n}\n",
    );
    let body = func(&file, "f").body.as_ref().unwrap();
    let Stmt::TypeSwitch(ts) = &body.stmts[0] else {
        panic!("expected type switch");
    };
    assert_eq!(ts.binding.as_ref().unwrap().name, "x");
    assert_eq!(ts.clauses.len(), 2);
    assert_eq!(ts.clauses[0].list.len(), 2);
}

#[test]
fn test_func_literal_and_calls() {
    let file = parse(
        "package demo\n\nfunc f() {\n\tg := func(a int) int { return a * 2 }\n\tdefer g(1)\n\tgo func() {}()\n\tm := map[string][]int{\"a\": []int{1}}\n\t_ = m\n}\n",
    );
    let body = func(&file, "f").body.as_ref().unwrap();
    assert_eq!(body.stmts.len(), 5);
    let Stmt::Assign(define) = &body.stmts[0] else {
        panic!("expected assignment");
    };
    assert_eq!(define.op, AssignOp::Define);
    assert!(matches!(define.rhs[0], Expr::FuncLit(_)));
    let Stmt::Deferred(go) = &body.stmts[2] else {
        panic!("expected go statement");
    };
    assert!(go.is_go);
    let Stmt::Assign(map) = &body.stmts[3] else {
        panic!("expected assignment");
    };
    let Expr::CompositeLit(lit) = &map.rhs[0] else {
        panic!("expected composite literal");
    };
    assert!(matches!(lit.ty, Expr::MapType(_)));
    assert!(matches!(lit.elts[0], Expr::KeyValue(_)));
}

#[test]
fn test_syntax_error_position() {
    let fset = FileSet::new();
    let err = parse_file(&fset, "bad.go", "package demo\n\nfunc f( {\n}\n").unwrap_err();
    assert_eq!(err.position.line, 3);
    assert!(err.to_string().starts_with("bad.go:3:"));
}

#[test]
fn test_parse_type_expression() {
    let fset = FileSet::new();
    let expr = parse_expr(&fset, "expr", "[10]int").unwrap();
    let Expr::ArrayType(array) = expr else {
        panic!("expected array type");
    };
    assert!(array.len.is_some());
    assert_eq!(array.elem.as_ident().unwrap().name, "int");
}

#[test]
fn test_spans_nest() {
    let src = "package demo\n\nfunc f() {\n\tprintln(1, 2)\n}\n";
    let file = parse(src);
    let f = func(&file, "f");
    let body = f.body.as_ref().unwrap();
    assert!(f.span.start <= body.span.start && body.span.end <= f.span.end);
    let Stmt::Expr(stmt) = &body.stmts[0] else {
        panic!("expected expression statement");
    };
    let Expr::Call(call) = &stmt.x else {
        panic!("expected call");
    };
    assert_eq!(call.args.len(), 2);
    assert_eq!(call.fun.span().start, stmt.span.start);
}
