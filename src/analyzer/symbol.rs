//! Resolved symbols.
//!
//! A [`Symbol`] is a shared handle; two handles are equal only when they
//! point at the same symbol. Type information is filled in once during
//! checking and never changes afterwards.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use smol_str::SmolStr;

use crate::base::{FileSet, Pos, Position};
use crate::syntax::ast::is_exported;

use super::scope::PackageScope;
use super::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Var,
    Const,
    TypeName,
    Func,
    /// An imported package name.
    PkgName,
    Builtin,
    Nil,
}

/// Where a symbol was declared: a position and the file set it belongs to.
#[derive(Clone)]
pub struct Origin {
    pub files: Arc<FileSet>,
    pub pos: Pos,
}

impl fmt::Debug for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.files.space(), self.pos.raw())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SymbolFlags {
    pub field: bool,
    pub embedded: bool,
    pub alias: bool,
    pub local: bool,
}

pub struct SymbolData {
    kind: SymbolKind,
    name: SmolStr,
    package: Option<Arc<str>>,
    origin: Option<Origin>,
    flags: SymbolFlags,
    ty: OnceLock<Type>,
    underlying: OnceLock<Type>,
    const_value: OnceLock<Option<i64>>,
    methods: RwLock<Vec<Symbol>>,
    imported: OnceLock<Arc<PackageScope>>,
}

/// A shared handle to a resolved symbol.
#[derive(Clone)]
pub struct Symbol(Arc<SymbolData>);

impl Symbol {
    pub(crate) fn new(
        kind: SymbolKind,
        name: impl Into<SmolStr>,
        package: Option<Arc<str>>,
        origin: Option<Origin>,
        flags: SymbolFlags,
    ) -> Self {
        Self(Arc::new(SymbolData {
            kind,
            name: name.into(),
            package,
            origin,
            flags,
            ty: OnceLock::new(),
            underlying: OnceLock::new(),
            const_value: OnceLock::new(),
            methods: RwLock::new(Vec::new()),
            imported: OnceLock::new(),
        }))
    }

    pub(crate) fn with_type(self, ty: Type) -> Self {
        self.set_type(ty);
        self
    }

    pub fn kind(&self) -> SymbolKind {
        self.0.kind
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Import path of the declaring package; `None` for predeclared symbols.
    pub fn package(&self) -> Option<&Arc<str>> {
        self.0.package.as_ref()
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.0.origin.as_ref()
    }

    /// Declaration position in the symbol's own file set.
    pub fn pos(&self) -> Pos {
        self.0.origin.as_ref().map(|o| o.pos).unwrap_or(Pos::NONE)
    }

    pub fn position(&self) -> Option<Position> {
        let origin = self.0.origin.as_ref()?;
        origin.files.position(origin.pos)
    }

    pub fn is_exported(&self) -> bool {
        is_exported(&self.0.name)
    }

    pub fn is_field(&self) -> bool {
        self.0.flags.field
    }

    pub fn is_embedded(&self) -> bool {
        self.0.flags.embedded
    }

    pub fn is_alias(&self) -> bool {
        self.0.flags.alias
    }

    pub(crate) fn is_local(&self) -> bool {
        self.0.flags.local
    }

    pub fn is_func(&self) -> bool {
        self.0.kind == SymbolKind::Func
    }

    /// The symbol's type. A defined type name denotes its own named type.
    pub fn ty(&self) -> Type {
        if self.0.kind == SymbolKind::TypeName && !self.0.flags.alias {
            return Type::Named(self.clone());
        }
        self.0.ty.get().cloned().unwrap_or(Type::Invalid)
    }

    pub(crate) fn has_type(&self) -> bool {
        self.0.ty.get().is_some()
    }

    pub(crate) fn set_type(&self, ty: Type) {
        let _ = self.0.ty.set(ty);
    }

    /// Underlying type of a defined type name.
    pub fn underlying(&self) -> Type {
        if self.0.flags.alias {
            return self.ty().underlying();
        }
        self.0.underlying.get().cloned().unwrap_or(Type::Invalid)
    }

    pub(crate) fn has_underlying(&self) -> bool {
        self.0.underlying.get().is_some()
    }

    pub(crate) fn set_underlying(&self, ty: Type) {
        let _ = self.0.underlying.set(ty);
    }

    pub fn const_value(&self) -> Option<i64> {
        self.0.const_value.get().copied().flatten()
    }

    pub(crate) fn set_const_value(&self, value: Option<i64>) {
        let _ = self.0.const_value.set(value);
    }

    /// Methods declared on a defined type, in declaration order.
    pub fn methods(&self) -> Vec<Symbol> {
        self.0.methods.read().clone()
    }

    pub fn method(&self, name: &str) -> Option<Symbol> {
        self.0.methods.read().iter().find(|m| m.name() == name).cloned()
    }

    pub(crate) fn add_method(&self, method: Symbol) {
        self.0.methods.write().push(method);
    }

    /// Scope of the package an import name refers to.
    pub fn imported(&self) -> Option<&Arc<PackageScope>> {
        self.0.imported.get()
    }

    pub(crate) fn set_imported(&self, scope: Arc<PackageScope>) {
        let _ = self.0.imported.set(scope);
    }

    fn addr(&self) -> *const SymbolData {
        Arc::as_ptr(&self.0)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ", self.0.kind)?;
        if let Some(package) = &self.0.package {
            write!(f, "{package}.")?;
        }
        write!(f, "{}", self.0.name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.kind {
            SymbolKind::PkgName => write!(f, "package {}", self.0.name),
            SymbolKind::TypeName => write!(f, "type {}", self.ty()),
            SymbolKind::Func => write!(f, "func {}", self.0.name),
            SymbolKind::Const => write!(f, "const {} {}", self.0.name, self.ty()),
            SymbolKind::Var if self.0.flags.field => write!(f, "field {} {}", self.0.name, self.ty()),
            SymbolKind::Var => write!(f, "var {} {}", self.0.name, self.ty()),
            SymbolKind::Builtin => write!(f, "builtin {}", self.0.name),
            SymbolKind::Nil => write!(f, "nil"),
        }
    }
}
