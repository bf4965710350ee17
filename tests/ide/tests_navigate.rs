//! Ancestor chains and call sites.

use pkgscope::syntax::next_stmt;
use pkgscope::{Node, QueryError, SymbolKind};

use crate::helpers::workspace::*;

#[test]
fn test_ancestors_match_the_walk() {
    let geo = SHARED.packages.get("geo").unwrap();
    let mut checked = 0;
    geo.walk(|node, ancestors| {
        if let Node::Ident(_) = node {
            let found = geo.ancestors_of(node.id()).unwrap();
            assert!(found == *ancestors);
            checked += 1;
        }
    });
    assert!(checked > 0);
}

#[test]
fn test_invocations_of_imported_function() {
    let geo = SHARED.packages.get("geo").unwrap();
    let new_point = geo.lookup_object("shapes.NewPoint").unwrap();

    let calls = geo.invocations_of(&new_point).unwrap();
    assert_eq!(calls.len(), 2);
    for call in &calls {
        let receiver = call.receiver.as_ref().unwrap();
        assert_eq!(receiver.kind(), SymbolKind::PkgName);
        assert_eq!(receiver.name(), "shapes");
        assert_eq!(call.args.len(), 2);
    }
    let line = |idx: usize| geo.position(calls[idx].call.span.start).unwrap().line;
    assert!(line(0) < line(1));
}

#[test]
fn test_function_values_are_not_invocations() {
    let geo = SHARED.packages.get("geo").unwrap();
    let area = geo.lookup_object("shapes.Area").unwrap();

    let calls = geo.invocations_of(&area).unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(geo.position(calls[0].call.span.start).unwrap().line, 20);
}

#[test]
fn test_method_invocation_has_receiver_variable() {
    let geo = SHARED.packages.get("geo").unwrap();
    let add = geo.lookup_object("shapes.Point.Add").unwrap();

    let calls = geo.invocations_of(&add).unwrap();
    assert_eq!(calls.len(), 1);
    let receiver = calls[0].receiver.as_ref().unwrap();
    assert_eq!(receiver.kind(), SymbolKind::Var);
    assert_eq!(receiver.name(), "at");
    assert_eq!(calls[0].args.len(), 1);
    assert!(calls[0].ancestors.iter().any(|n| matches!(n, Node::FuncDecl(_))));
}

#[test]
fn test_local_method_calls() {
    let ws = Workspace::new().file(
        "calls/calls.go",
        "package calls\n\ntype Acc struct {\n\tn int\n}\n\nfunc (a *Acc) Add(x, y int) int {\n\treturn a.n + x + y\n}\n\nfunc Use() int {\n\ta := &Acc{}\n\ta.Add(1, 2)\n\treturn a.Add(3, 4)\n}\n",
    );
    let pkgs = ws.loader().load(&["calls"]).unwrap();
    let add = pkgs[0].lookup_object("calls.Acc.Add").unwrap();

    let calls = pkgs[0].invocations_of(&add).unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.args.len() == 2));
    assert!(calls.iter().all(|c| c.receiver.as_ref().is_some_and(|r| r.name() == "a")));
}

#[test]
fn test_function_never_called_has_no_invocations() {
    let shapes = SHARED.packages.get("shapes").unwrap();
    let area = shapes.lookup_object("shapes.Area").unwrap();
    assert!(shapes.invocations_of(&area).unwrap().is_empty());
}

#[test]
fn test_invocations_of_non_function() {
    let geo = SHARED.packages.get("geo").unwrap();
    let point = geo.lookup_object("shapes.Point").unwrap();
    assert!(matches!(
        geo.invocations_of(&point),
        Err(QueryError::NotAFunction(_))
    ));
}

#[test]
fn test_next_statement_after_a_call() {
    let geo = SHARED.packages.get("geo").unwrap();
    let new_point = geo.lookup_object("shapes.NewPoint").unwrap();
    let calls = geo.invocations_of(&new_point).unwrap();

    let first = &calls[0];
    let next = next_stmt(Node::Expr(first_call_expr(first)), &first.ancestors).unwrap();
    assert_eq!(geo.position(next.span().start).unwrap().line, 11);
}

fn first_call_expr<'a>(call: &pkgscope::Invocation<'a>) -> &'a pkgscope::syntax::ast::Expr {
    let Some(Node::Stmt(stmt)) = call.ancestors.parent() else {
        panic!("call should sit directly in a statement");
    };
    let pkgscope::syntax::ast::Stmt::Assign(assign) = stmt else {
        panic!("expected an assignment");
    };
    &assign.rhs[0]
}
