//! Tree traversal with ancestor stacks, interval search and statement
//! navigation.

use std::ops::Deref;

use crate::base::Pos;

use super::ast::{NodeId, PackageSyntax, Stmt};
use super::node::Node;

/// Root-to-parent chain of nodes above some target node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ancestors<'a>(Vec<Node<'a>>);

impl<'a> Ancestors<'a> {
    pub fn new(nodes: Vec<Node<'a>>) -> Self {
        Self(nodes)
    }

    /// The immediate parent, if any.
    pub fn parent(&self) -> Option<Node<'a>> {
        self.0.last().copied()
    }

    /// The `n`th ancestor counting outward from the parent (`0` is the parent).
    pub fn nth_outward(&self, n: usize) -> Option<Node<'a>> {
        self.0.len().checked_sub(n + 1).map(|idx| self.0[idx])
    }

    pub fn into_vec(self) -> Vec<Node<'a>> {
        self.0
    }
}

impl<'a> Deref for Ancestors<'a> {
    type Target = [Node<'a>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// What the walker does after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Descend,
    SkipChildren,
    Stop,
}

/// Depth-first pre-order traversal.
///
/// `visit` receives every node together with its ancestors (root first).
/// Returns `false` when the walk was stopped early.
pub fn walk<'a, F>(root: Node<'a>, visit: &mut F) -> bool
where
    F: FnMut(Node<'a>, &Ancestors<'a>) -> Visit,
{
    let mut stack = Ancestors::default();
    walk_inner(root, &mut stack, visit)
}

fn walk_inner<'a, F>(node: Node<'a>, stack: &mut Ancestors<'a>, visit: &mut F) -> bool
where
    F: FnMut(Node<'a>, &Ancestors<'a>) -> Visit,
{
    match visit(node, stack) {
        Visit::Stop => return false,
        Visit::SkipChildren => return true,
        Visit::Descend => {}
    }
    stack.0.push(node);
    for child in node.children() {
        if !walk_inner(child, stack, visit) {
            stack.0.pop();
            return false;
        }
    }
    stack.0.pop();
    true
}

/// Visit every node, ignoring control flow.
pub fn walk_all<'a, F>(root: Node<'a>, mut visit: F)
where
    F: FnMut(Node<'a>, &Ancestors<'a>),
{
    walk(root, &mut |node, ancestors| {
        visit(node, ancestors);
        Visit::Descend
    });
}

/// Ancestors of the node with identity `target`, found by a full traversal
/// from `root`. Returns `None` when the node is not part of the tree.
pub fn find_ancestors<'a>(root: Node<'a>, target: NodeId) -> Option<Ancestors<'a>> {
    let mut found = None;
    walk(root, &mut |node, ancestors| {
        if node.id() == target {
            found = Some(ancestors.clone());
            Visit::Stop
        } else {
            Visit::Descend
        }
    });
    found
}

/// Result of [`path_enclosing_interval`].
#[derive(Debug, Clone)]
pub struct EnclosingPath<'a> {
    /// Innermost node enclosing the interval.
    pub node: Node<'a>,
    /// Root-to-parent chain above `node`, starting with the package.
    pub ancestors: Ancestors<'a>,
    /// Whether `node` spans the interval exactly (identifiers and literals
    /// count as exact for any interval inside them).
    pub exact: bool,
}

/// Innermost node of `pkg` enclosing `[start, end]`.
pub fn path_enclosing_interval(
    pkg: &PackageSyntax,
    start: Pos,
    end: Pos,
) -> Option<EnclosingPath<'_>> {
    let file = pkg
        .files
        .iter()
        .find(|file| file.span.contains_interval(start, end))?;

    let mut ancestors = vec![Node::Package(pkg)];
    let mut node = Node::File(file);
    loop {
        let next = node
            .children()
            .into_iter()
            .find(|child| child.span().contains_interval(start, end));
        match next {
            Some(child) => {
                ancestors.push(node);
                node = child;
            }
            None => break,
        }
    }

    let span = node.span();
    let exact = matches!(node, Node::Ident(_))
        || matches!(node, Node::Expr(super::ast::Expr::BasicLit(_)))
        || (span.start == start && span.end == end);
    Some(EnclosingPath {
        node,
        ancestors: Ancestors(ancestors),
        exact,
    })
}

/// The statement following the one that contains `node`, within the
/// nearest enclosing block.
///
/// `None` when the containing statement is the last one in that block or
/// when no block encloses `node`.
pub fn next_stmt<'a>(node: Node<'a>, ancestors: &Ancestors<'a>) -> Option<&'a Stmt> {
    let chain = &ancestors[..];
    let (idx, block) = chain
        .iter()
        .enumerate()
        .rev()
        .find_map(|(idx, anc)| anc.as_block().map(|b| (idx, b)))?;

    let current = if idx + 1 == chain.len() {
        node
    } else {
        chain[idx + 1]
    };

    let pos = block.stmts.iter().position(|s| s.id() == current.id())?;
    block.stmts.get(pos + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileSet;
    use crate::parser::parse_file;
    use crate::syntax::ast::{Decl, Expr};

    fn package(src: &str) -> (FileSet, PackageSyntax) {
        let fset = FileSet::new();
        let file = parse_file(&fset, "p.go", src).unwrap();
        let pkg = PackageSyntax::new("p", vec![file]);
        (fset, pkg)
    }

    const SRC: &str = "package p\n\nfunc f() {\n\ta := 1\n\tif a > 0 {\n\t\ta++\n\t}\n\tprintln(a)\n}\n";

    #[test]
    fn test_walk_ancestors_match_find() {
        let (_fset, pkg) = package(SRC);
        let mut seen = Vec::new();
        walk_all(Node::Package(&pkg), |node, ancestors| {
            seen.push((node.id(), ancestors.clone()));
        });
        assert!(seen.len() > 10);
        for (id, ancestors) in seen {
            let found = find_ancestors(Node::Package(&pkg), id).unwrap();
            assert_eq!(found, ancestors);
        }
    }

    #[test]
    fn test_find_ancestors_missing() {
        let (_fset, pkg) = package(SRC);
        let (_other_fset, other) = package(SRC);
        assert!(find_ancestors(Node::Package(&pkg), other.files[0].id).is_none());
    }

    #[test]
    fn test_path_enclosing_ident_is_exact() {
        let (fset, pkg) = package(SRC);
        let file = fset.file_by_name("p.go").unwrap();
        let offset = SRC.find("println").unwrap() as u32;
        let pos = file.pos(offset);
        let path = path_enclosing_interval(&pkg, pos, pos).unwrap();
        assert!(path.exact);
        assert_eq!(path.node.as_ident().unwrap().name, "println");
        assert!(matches!(path.ancestors[0], Node::Package(_)));
        assert!(path.ancestors.parent().unwrap().as_call().is_some());
    }

    #[test]
    fn test_next_stmt() {
        let (_fset, pkg) = package(SRC);
        let Decl::Func(func) = &pkg.files[0].decls[0] else {
            panic!("expected func");
        };
        let body = func.body.as_ref().unwrap();
        let define = &body.stmts[0];
        let ancestors = find_ancestors(Node::Package(&pkg), define.id()).unwrap();
        let next = next_stmt(Node::from_stmt(define), &ancestors).unwrap();
        assert!(matches!(next, Stmt::If(_)));

        // The last statement has no successor.
        let last = body.stmts.last().unwrap();
        let ancestors = find_ancestors(Node::Package(&pkg), last.id()).unwrap();
        assert!(next_stmt(Node::from_stmt(last), &ancestors).is_none());

        // Nested nodes resolve through their enclosing statement.
        let Stmt::If(if_stmt) = &body.stmts[1] else {
            panic!("expected if");
        };
        let Expr::Binary(cond) = &if_stmt.cond else {
            panic!("expected binary");
        };
        let ancestors = find_ancestors(Node::Package(&pkg), cond.x.id()).unwrap();
        let next = next_stmt(Node::from_expr(&cond.x), &ancestors).unwrap();
        assert!(matches!(next, Stmt::Expr(_)));
    }
}
