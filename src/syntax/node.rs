//! Borrowed, closed view over every syntax node kind.

use std::fmt;

use crate::base::Span;

use super::ast::*;

/// A borrowed reference to one node of a [`PackageSyntax`] tree.
///
/// Identifiers, blocks and function types always appear through their own
/// variants, never through [`Node::Expr`] / [`Node::Stmt`].
#[derive(Clone, Copy)]
pub enum Node<'a> {
    Package(&'a PackageSyntax),
    File(&'a SourceFile),
    GenDecl(&'a GenDecl),
    FuncDecl(&'a FuncDecl),
    ImportSpec(&'a ImportSpec),
    ValueSpec(&'a ValueSpec),
    TypeSpec(&'a TypeSpec),
    Field(&'a Field),
    FuncType(&'a FuncType),
    Block(&'a Block),
    CaseClause(&'a CaseClause),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
    Ident(&'a Ident),
}

impl<'a> Node<'a> {
    pub fn from_expr(expr: &'a Expr) -> Self {
        match expr {
            Expr::Ident(ident) => Node::Ident(ident),
            Expr::FuncType(ty) => Node::FuncType(ty),
            other => Node::Expr(other),
        }
    }

    pub fn from_stmt(stmt: &'a Stmt) -> Self {
        match stmt {
            Stmt::Block(block) => Node::Block(block),
            other => Node::Stmt(other),
        }
    }

    pub fn id(&self) -> NodeId {
        match self {
            Node::Package(n) => n.id,
            Node::File(n) => n.id,
            Node::GenDecl(n) => n.id,
            Node::FuncDecl(n) => n.id,
            Node::ImportSpec(n) => n.id,
            Node::ValueSpec(n) => n.id,
            Node::TypeSpec(n) => n.id,
            Node::Field(n) => n.id,
            Node::FuncType(n) => n.id,
            Node::Block(n) => n.id,
            Node::CaseClause(n) => n.id,
            Node::Stmt(n) => n.id(),
            Node::Expr(n) => n.id(),
            Node::Ident(n) => n.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Node::Package(n) => n.span(),
            Node::File(n) => n.span,
            Node::GenDecl(n) => n.span,
            Node::FuncDecl(n) => n.span,
            Node::ImportSpec(n) => n.span,
            Node::ValueSpec(n) => n.span,
            Node::TypeSpec(n) => n.span,
            Node::Field(n) => n.span,
            Node::FuncType(n) => n.span,
            Node::Block(n) => n.span,
            Node::CaseClause(n) => n.span,
            Node::Stmt(n) => n.span(),
            Node::Expr(n) => n.span(),
            Node::Ident(n) => n.span(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Package(_) => "Package",
            Node::File(_) => "File",
            Node::GenDecl(_) => "GenDecl",
            Node::FuncDecl(_) => "FuncDecl",
            Node::ImportSpec(_) => "ImportSpec",
            Node::ValueSpec(_) => "ValueSpec",
            Node::TypeSpec(_) => "TypeSpec",
            Node::Field(_) => "Field",
            Node::FuncType(_) => "FuncType",
            Node::Block(_) => "BlockStmt",
            Node::CaseClause(_) => "CaseClause",
            Node::Stmt(stmt) => match stmt {
                Stmt::Decl(_) => "DeclStmt",
                Stmt::Assign(_) => "AssignStmt",
                Stmt::Expr(_) => "ExprStmt",
                Stmt::IncDec(_) => "IncDecStmt",
                Stmt::Return(_) => "ReturnStmt",
                Stmt::Block(_) => "BlockStmt",
                Stmt::If(_) => "IfStmt",
                Stmt::For(_) => "ForStmt",
                Stmt::Switch(_) => "SwitchStmt",
                Stmt::TypeSwitch(_) => "TypeSwitchStmt",
                Stmt::Deferred(s) if s.is_go => "GoStmt",
                Stmt::Deferred(_) => "DeferStmt",
                Stmt::Branch(_) => "BranchStmt",
            },
            Node::Expr(expr) => match expr {
                Expr::Ident(_) => "Ident",
                Expr::BasicLit(_) => "BasicLit",
                Expr::Selector(_) => "SelectorExpr",
                Expr::Call(_) => "CallExpr",
                Expr::Star(_) => "StarExpr",
                Expr::Unary(_) => "UnaryExpr",
                Expr::Binary(_) => "BinaryExpr",
                Expr::Paren(_) => "ParenExpr",
                Expr::TypeAssert(_) => "TypeAssertExpr",
                Expr::Index(_) => "IndexExpr",
                Expr::CompositeLit(_) => "CompositeLit",
                Expr::KeyValue(_) => "KeyValueExpr",
                Expr::FuncLit(_) => "FuncLit",
                Expr::ArrayType(_) => "ArrayType",
                Expr::MapType(_) => "MapType",
                Expr::StructType(_) => "StructType",
                Expr::InterfaceType(_) => "InterfaceType",
                Expr::FuncType(_) => "FuncType",
            },
            Node::Ident(_) => "Ident",
        }
    }

    pub fn as_ident(&self) -> Option<&'a Ident> {
        match *self {
            Node::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&'a Expr> {
        match *self {
            Node::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&'a CallExpr> {
        match *self {
            Node::Expr(Expr::Call(call)) => Some(call),
            _ => None,
        }
    }

    pub fn as_selector(&self) -> Option<&'a SelectorExpr> {
        match *self {
            Node::Expr(Expr::Selector(sel)) => Some(sel),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&'a Block> {
        match *self {
            Node::Block(block) => Some(block),
            _ => None,
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<Node<'a>> {
        let mut out = Vec::new();
        match *self {
            Node::Package(pkg) => out.extend(pkg.files.iter().map(Node::File)),
            Node::File(file) => {
                out.push(Node::Ident(&file.package_name));
                for decl in &file.decls {
                    out.push(match decl {
                        Decl::Gen(d) => Node::GenDecl(d),
                        Decl::Func(d) => Node::FuncDecl(d),
                    });
                }
            }
            Node::GenDecl(decl) => {
                for spec in &decl.specs {
                    out.push(match spec {
                        Spec::Import(s) => Node::ImportSpec(s),
                        Spec::Value(s) => Node::ValueSpec(s),
                        Spec::Type(s) => Node::TypeSpec(s),
                    });
                }
            }
            Node::FuncDecl(decl) => {
                if let Some(recv) = &decl.recv {
                    out.push(Node::Field(recv));
                }
                out.push(Node::Ident(&decl.name));
                out.push(Node::FuncType(&decl.ty));
                if let Some(body) = &decl.body {
                    out.push(Node::Block(body));
                }
            }
            Node::ImportSpec(spec) => {
                if let Some(name) = &spec.name {
                    out.push(Node::Ident(name));
                }
                out.push(Node::Expr(&spec.path));
            }
            Node::ValueSpec(spec) => {
                out.extend(spec.names.iter().map(Node::Ident));
                if let Some(ty) = &spec.ty {
                    out.push(Node::from_expr(ty));
                }
                out.extend(spec.values.iter().map(Node::from_expr));
            }
            Node::TypeSpec(spec) => {
                out.push(Node::Ident(&spec.name));
                out.push(Node::from_expr(&spec.ty));
            }
            Node::Field(field) => {
                out.extend(field.names.iter().map(Node::Ident));
                out.push(Node::from_expr(&field.ty));
            }
            Node::FuncType(ty) => {
                out.extend(ty.params.iter().map(Node::Field));
                out.extend(ty.results.iter().map(Node::Field));
            }
            Node::Block(block) => out.extend(block.stmts.iter().map(Node::from_stmt)),
            Node::CaseClause(clause) => {
                out.extend(clause.list.iter().map(Node::from_expr));
                out.extend(clause.body.iter().map(Node::from_stmt));
            }
            Node::Stmt(stmt) => stmt_children(stmt, &mut out),
            Node::Expr(expr) => expr_children(expr, &mut out),
            Node::Ident(_) => {}
        }
        out
    }
}

fn stmt_children<'a>(stmt: &'a Stmt, out: &mut Vec<Node<'a>>) {
    match stmt {
        Stmt::Decl(s) => out.push(Node::GenDecl(&s.decl)),
        Stmt::Assign(s) => {
            out.extend(s.lhs.iter().map(Node::from_expr));
            out.extend(s.rhs.iter().map(Node::from_expr));
        }
        Stmt::Expr(s) => out.push(Node::from_expr(&s.x)),
        Stmt::IncDec(s) => out.push(Node::from_expr(&s.x)),
        Stmt::Return(s) => out.extend(s.results.iter().map(Node::from_expr)),
        Stmt::Block(block) => out.extend(block.stmts.iter().map(Node::from_stmt)),
        Stmt::If(s) => {
            if let Some(init) = &s.init {
                out.push(Node::from_stmt(init));
            }
            out.push(Node::from_expr(&s.cond));
            out.push(Node::Block(&s.body));
            if let Some(els) = &s.els {
                out.push(Node::from_stmt(els));
            }
        }
        Stmt::For(s) => {
            if let Some(init) = &s.init {
                out.push(Node::from_stmt(init));
            }
            if let Some(cond) = &s.cond {
                out.push(Node::from_expr(cond));
            }
            if let Some(post) = &s.post {
                out.push(Node::from_stmt(post));
            }
            out.push(Node::Block(&s.body));
        }
        Stmt::Switch(s) => {
            if let Some(init) = &s.init {
                out.push(Node::from_stmt(init));
            }
            if let Some(tag) = &s.tag {
                out.push(Node::from_expr(tag));
            }
            out.extend(s.clauses.iter().map(Node::CaseClause));
        }
        Stmt::TypeSwitch(s) => {
            if let Some(init) = &s.init {
                out.push(Node::from_stmt(init));
            }
            if let Some(binding) = &s.binding {
                out.push(Node::Ident(binding));
            }
            out.push(Node::from_expr(&s.guard));
            out.extend(s.clauses.iter().map(Node::CaseClause));
        }
        Stmt::Deferred(s) => out.push(Node::from_expr(&s.call)),
        Stmt::Branch(_) => {}
    }
}

fn expr_children<'a>(expr: &'a Expr, out: &mut Vec<Node<'a>>) {
    match expr {
        Expr::Ident(_) | Expr::BasicLit(_) => {}
        Expr::Selector(e) => {
            out.push(Node::from_expr(&e.x));
            out.push(Node::Ident(&e.sel));
        }
        Expr::Call(e) => {
            out.push(Node::from_expr(&e.fun));
            out.extend(e.args.iter().map(Node::from_expr));
        }
        Expr::Star(e) => out.push(Node::from_expr(&e.x)),
        Expr::Unary(e) => out.push(Node::from_expr(&e.x)),
        Expr::Binary(e) => {
            out.push(Node::from_expr(&e.x));
            out.push(Node::from_expr(&e.y));
        }
        Expr::Paren(e) => out.push(Node::from_expr(&e.x)),
        Expr::TypeAssert(e) => {
            out.push(Node::from_expr(&e.x));
            if let Some(ty) = &e.ty {
                out.push(Node::from_expr(ty));
            }
        }
        Expr::Index(e) => {
            out.push(Node::from_expr(&e.x));
            out.push(Node::from_expr(&e.index));
        }
        Expr::CompositeLit(e) => {
            out.push(Node::from_expr(&e.ty));
            out.extend(e.elts.iter().map(Node::from_expr));
        }
        Expr::KeyValue(e) => {
            out.push(Node::from_expr(&e.key));
            out.push(Node::from_expr(&e.value));
        }
        Expr::FuncLit(e) => {
            out.push(Node::FuncType(&e.ty));
            out.push(Node::Block(&e.body));
        }
        Expr::ArrayType(e) => {
            if let Some(len) = &e.len {
                out.push(Node::from_expr(len));
            }
            out.push(Node::from_expr(&e.elem));
        }
        Expr::MapType(e) => {
            out.push(Node::from_expr(&e.key));
            out.push(Node::from_expr(&e.value));
        }
        Expr::StructType(e) => out.extend(e.fields.iter().map(Node::Field)),
        Expr::InterfaceType(e) => out.extend(e.methods.iter().map(Node::Field)),
        Expr::FuncType(e) => {
            out.extend(e.params.iter().map(Node::Field));
            out.extend(e.results.iter().map(Node::Field));
        }
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Ident(ident) => write!(f, "Ident({} @{})", ident.name, ident.pos.raw()),
            other => write!(f, "{}#{}", other.kind_name(), other.id().raw()),
        }
    }
}
