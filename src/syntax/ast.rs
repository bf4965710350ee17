//! Typed syntax tree for the host language.
//!
//! The tree is a closed set of node structs. Every node carries a
//! process-unique [`NodeId`]; identity comparisons between nodes (for
//! ancestor lookups, lifetime records, invocation extraction) always go
//! through that id, never through addresses.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use smol_str::SmolStr;

use crate::base::{Pos, Span};

/// Identity of one syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

static NEXT_NODE: AtomicU32 = AtomicU32::new(1);

impl NodeId {
    pub fn fresh() -> Self {
        Self(NEXT_NODE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

// ============================================================================
// LEAVES
// ============================================================================

/// An identifier occurrence.
///
/// `end` is fixed at parse time, so renaming an identifier keeps its span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub id: NodeId,
    pub pos: Pos,
    pub end: Pos,
    pub name: SmolStr,
}

impl Ident {
    pub fn span(&self) -> Span {
        Span::new(self.pos, self.end)
    }

    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }

    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

/// Exported names start with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LitKind {
    Int,
    Float,
    Char,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicLit {
    pub id: NodeId,
    pub span: Span,
    pub kind: LitKind,
    /// Literal text as written, including quotes.
    pub value: SmolStr,
}

impl BasicLit {
    /// The unquoted value of a string literal.
    pub fn string_value(&self) -> Option<String> {
        if self.kind != LitKind::String {
            return None;
        }
        let raw = self.value.as_str();
        if let Some(inner) = raw.strip_prefix('`').and_then(|r| r.strip_suffix('`')) {
            return Some(inner.to_string());
        }
        let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => break,
            }
        }
        Some(out)
    }

    pub fn int_value(&self) -> Option<i64> {
        if self.kind != LitKind::Int {
            return None;
        }
        let text = self.value.replace('_', "");
        if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            i64::from_str_radix(hex, 16).ok()
        } else {
            text.parse().ok()
        }
    }
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    Addr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    LogOr,
    LogAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Or,
    Xor,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    AndNot,
}

impl BinaryOp {
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::LogOr => 1,
            BinaryOp::LogAnd => 2,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 3,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or | BinaryOp::Xor => 4,
            _ => 5,
        }
    }

    pub fn is_comparison(self) -> bool {
        self.precedence() == 3
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorExpr {
    pub id: NodeId,
    pub span: Span,
    pub x: Expr,
    pub sel: Ident,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    pub id: NodeId,
    pub span: Span,
    pub fun: Expr,
    pub args: Vec<Expr>,
}

/// `*x`, either a dereference or a pointer type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarExpr {
    pub id: NodeId,
    pub span: Span,
    pub x: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryExpr {
    pub id: NodeId,
    pub span: Span,
    pub op: UnaryOp,
    pub x: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryExpr {
    pub id: NodeId,
    pub span: Span,
    pub op: BinaryOp,
    pub x: Expr,
    pub y: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParenExpr {
    pub id: NodeId,
    pub span: Span,
    pub x: Expr,
}

/// `x.(T)`; `ty` is `None` for the `x.(type)` guard of a type switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAssertExpr {
    pub id: NodeId,
    pub span: Span,
    pub x: Expr,
    pub ty: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexExpr {
    pub id: NodeId,
    pub span: Span,
    pub x: Expr,
    pub index: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeLit {
    pub id: NodeId,
    pub span: Span,
    pub ty: Expr,
    pub elts: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueExpr {
    pub id: NodeId,
    pub span: Span,
    pub key: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncLit {
    pub id: NodeId,
    pub span: Span,
    pub ty: FuncType,
    pub body: Block,
}

/// `[N]T`, or `[]T` when `len` is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayType {
    pub id: NodeId,
    pub span: Span,
    pub len: Option<Expr>,
    pub elem: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapType {
    pub id: NodeId,
    pub span: Span,
    pub key: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    pub id: NodeId,
    pub span: Span,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceType {
    pub id: NodeId,
    pub span: Span,
    pub methods: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncType {
    pub id: NodeId,
    pub span: Span,
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}

/// A parameter, result, struct field or interface method.
///
/// `names` is empty for unnamed parameters and embedded fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub id: NodeId,
    pub span: Span,
    pub names: Vec<Ident>,
    pub ty: Expr,
}

impl Field {
    /// Number of parameters/fields this entry declares.
    pub fn arity(&self) -> usize {
        self.names.len().max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(Ident),
    BasicLit(BasicLit),
    Selector(Box<SelectorExpr>),
    Call(Box<CallExpr>),
    Star(Box<StarExpr>),
    Unary(Box<UnaryExpr>),
    Binary(Box<BinaryExpr>),
    Paren(Box<ParenExpr>),
    TypeAssert(Box<TypeAssertExpr>),
    Index(Box<IndexExpr>),
    CompositeLit(Box<CompositeLit>),
    KeyValue(Box<KeyValueExpr>),
    FuncLit(Box<FuncLit>),
    ArrayType(Box<ArrayType>),
    MapType(Box<MapType>),
    StructType(Box<StructType>),
    InterfaceType(Box<InterfaceType>),
    FuncType(Box<FuncType>),
}

impl Expr {
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Ident(e) => e.id,
            Expr::BasicLit(e) => e.id,
            Expr::Selector(e) => e.id,
            Expr::Call(e) => e.id,
            Expr::Star(e) => e.id,
            Expr::Unary(e) => e.id,
            Expr::Binary(e) => e.id,
            Expr::Paren(e) => e.id,
            Expr::TypeAssert(e) => e.id,
            Expr::Index(e) => e.id,
            Expr::CompositeLit(e) => e.id,
            Expr::KeyValue(e) => e.id,
            Expr::FuncLit(e) => e.id,
            Expr::ArrayType(e) => e.id,
            Expr::MapType(e) => e.id,
            Expr::StructType(e) => e.id,
            Expr::InterfaceType(e) => e.id,
            Expr::FuncType(e) => e.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(e) => e.span(),
            Expr::BasicLit(e) => e.span,
            Expr::Selector(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Star(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Paren(e) => e.span,
            Expr::TypeAssert(e) => e.span,
            Expr::Index(e) => e.span,
            Expr::CompositeLit(e) => e.span,
            Expr::KeyValue(e) => e.span,
            Expr::FuncLit(e) => e.span,
            Expr::ArrayType(e) => e.span,
            Expr::MapType(e) => e.span,
            Expr::StructType(e) => e.span,
            Expr::InterfaceType(e) => e.span,
            Expr::FuncType(e) => e.span,
        }
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr {
        match self {
            Expr::Paren(p) => p.x.unparen(),
            other => other,
        }
    }
}

// ============================================================================
// STATEMENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `:=`
    Define,
    /// `=`
    Assign,
    /// `op=`
    Compound(BinaryOp),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: NodeId,
    pub span: Span,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclStmt {
    pub id: NodeId,
    pub span: Span,
    pub decl: GenDecl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignStmt {
    pub id: NodeId,
    pub span: Span,
    pub lhs: Vec<Expr>,
    pub op: AssignOp,
    pub rhs: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprStmt {
    pub id: NodeId,
    pub span: Span,
    pub x: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncDecStmt {
    pub id: NodeId,
    pub span: Span,
    pub x: Expr,
    pub inc: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnStmt {
    pub id: NodeId,
    pub span: Span,
    pub results: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfStmt {
    pub id: NodeId,
    pub span: Span,
    pub init: Option<Stmt>,
    pub cond: Expr,
    pub body: Block,
    /// Either a [`Stmt::Block`] or a nested [`Stmt::If`].
    pub els: Option<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForStmt {
    pub id: NodeId,
    pub span: Span,
    pub init: Option<Stmt>,
    pub cond: Option<Expr>,
    pub post: Option<Stmt>,
    pub body: Block,
}

/// One `case`/`default` arm. An empty `list` is the default arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseClause {
    pub id: NodeId,
    pub span: Span,
    pub list: Vec<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchStmt {
    pub id: NodeId,
    pub span: Span,
    pub init: Option<Stmt>,
    pub tag: Option<Expr>,
    pub clauses: Vec<CaseClause>,
}

/// `switch [init;] [binding :=] x.(type) { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSwitchStmt {
    pub id: NodeId,
    pub span: Span,
    pub init: Option<Stmt>,
    pub binding: Option<Ident>,
    /// The `x.(type)` guard expression.
    pub guard: Expr,
    pub clauses: Vec<CaseClause>,
}

/// `go f()` / `defer f()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredCallStmt {
    pub id: NodeId,
    pub span: Span,
    pub is_go: bool,
    pub call: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchStmt {
    pub id: NodeId,
    pub span: Span,
    pub is_break: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Decl(Box<DeclStmt>),
    Assign(Box<AssignStmt>),
    Expr(Box<ExprStmt>),
    IncDec(Box<IncDecStmt>),
    Return(Box<ReturnStmt>),
    Block(Box<Block>),
    If(Box<IfStmt>),
    For(Box<ForStmt>),
    Switch(Box<SwitchStmt>),
    TypeSwitch(Box<TypeSwitchStmt>),
    Deferred(Box<DeferredCallStmt>),
    Branch(Box<BranchStmt>),
}

impl Stmt {
    pub fn id(&self) -> NodeId {
        match self {
            Stmt::Decl(s) => s.id,
            Stmt::Assign(s) => s.id,
            Stmt::Expr(s) => s.id,
            Stmt::IncDec(s) => s.id,
            Stmt::Return(s) => s.id,
            Stmt::Block(s) => s.id,
            Stmt::If(s) => s.id,
            Stmt::For(s) => s.id,
            Stmt::Switch(s) => s.id,
            Stmt::TypeSwitch(s) => s.id,
            Stmt::Deferred(s) => s.id,
            Stmt::Branch(s) => s.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Stmt::Decl(s) => s.span,
            Stmt::Assign(s) => s.span,
            Stmt::Expr(s) => s.span,
            Stmt::IncDec(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Block(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Switch(s) => s.span,
            Stmt::TypeSwitch(s) => s.span,
            Stmt::Deferred(s) => s.span,
            Stmt::Branch(s) => s.span,
        }
    }
}

// ============================================================================
// DECLARATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Import,
    Const,
    Var,
    Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub id: NodeId,
    pub span: Span,
    pub name: Option<Ident>,
    /// Always an [`Expr::BasicLit`] string.
    pub path: Expr,
    /// Comment block directly above the import (the foreign-interop preamble
    /// for `import "C"`).
    pub doc: Option<String>,
}

impl ImportSpec {
    pub fn path_value(&self) -> String {
        match &self.path {
            Expr::BasicLit(lit) => lit.string_value().unwrap_or_default(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSpec {
    pub id: NodeId,
    pub span: Span,
    pub names: Vec<Ident>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub id: NodeId,
    pub span: Span,
    pub name: Ident,
    /// `type A = B`
    pub alias: bool,
    pub ty: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spec {
    Import(ImportSpec),
    Value(ValueSpec),
    Type(TypeSpec),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenDecl {
    pub id: NodeId,
    pub span: Span,
    pub kind: DeclKind,
    pub specs: Vec<Spec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub id: NodeId,
    pub span: Span,
    pub recv: Option<Field>,
    pub name: Ident,
    pub ty: FuncType,
    pub body: Option<Block>,
}

impl FuncDecl {
    /// Base type name of the receiver (`T` for both `T` and `*T`).
    pub fn receiver_base(&self) -> Option<&Ident> {
        let recv = self.recv.as_ref()?;
        match recv.ty.unparen() {
            Expr::Ident(ident) => Some(ident),
            Expr::Star(star) => star.x.unparen().as_ident(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Gen(GenDecl),
    Func(FuncDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Gen(d) => d.span,
            Decl::Func(d) => d.span,
        }
    }
}

// ============================================================================
// FILES AND PACKAGES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub id: NodeId,
    pub span: Span,
    /// Path the file was registered under in its file set.
    pub name: Arc<str>,
    pub package_name: Ident,
    pub decls: Vec<Decl>,
}

impl SourceFile {
    pub fn imports(&self) -> impl Iterator<Item = &ImportSpec> {
        self.decls.iter().flat_map(|decl| match decl {
            Decl::Gen(gen_decl) if gen_decl.kind == DeclKind::Import => gen_decl.specs.as_slice(),
            _ => &[],
        })
        .filter_map(|spec| match spec {
            Spec::Import(import) => Some(import),
            _ => None,
        })
    }

    pub fn import_paths(&self) -> impl Iterator<Item = String> + '_ {
        self.imports().map(ImportSpec::path_value)
    }

    /// Whether the file uses the foreign-interop pseudo-package.
    pub fn imports_foreign(&self) -> bool {
        self.import_paths().any(|p| p == FOREIGN_IMPORT_PATH)
    }

    /// The base name of the file (`foo.go` for `/src/pkg/foo.go`).
    pub fn base_name(&self) -> &str {
        self.name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.name)
    }
}

/// Import path of the foreign-interop pseudo-package.
pub const FOREIGN_IMPORT_PATH: &str = "C";

/// The syntax forest of one package: the root of every traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSyntax {
    pub id: NodeId,
    pub name: SmolStr,
    /// Files sorted by name.
    pub files: Vec<SourceFile>,
}

impl PackageSyntax {
    pub fn new(name: impl Into<SmolStr>, mut files: Vec<SourceFile>) -> Self {
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            id: NodeId::fresh(),
            name: name.into(),
            files,
        }
    }

    pub fn file(&self, name: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| &*f.name == name)
    }

    pub fn span(&self) -> Span {
        self.files
            .iter()
            .map(|f| f.span)
            .reduce(Span::cover)
            .unwrap_or_default()
    }
}
