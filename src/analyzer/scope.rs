//! Package scopes and per-package type information.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::syntax::NodeId;
use crate::syntax::ast::Ident;

use super::symbol::Symbol;
use super::types::Type;

/// The exported view of a checked package.
#[derive(Debug)]
pub struct PackageScope {
    path: Arc<str>,
    name: SmolStr,
    members: IndexMap<SmolStr, Symbol>,
    fake: bool,
}

impl PackageScope {
    pub fn new(path: impl Into<Arc<str>>, name: impl Into<SmolStr>, members: IndexMap<SmolStr, Symbol>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            members,
            fake: false,
        }
    }

    /// A stand-in package that accepts any member name.
    pub fn fake(path: impl Into<Arc<str>>, name: impl Into<SmolStr>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            members: IndexMap::new(),
            fake: true,
        }
    }

    pub fn path(&self) -> &Arc<str> {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_fake(&self) -> bool {
        self.fake
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.members.get(name)
    }

    /// Package-level members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = &Symbol> {
        self.members.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(SmolStr::as_str)
    }
}

/// An identifier occurrence together with the symbol it defines or uses.
#[derive(Debug, Clone)]
pub struct IdentRef {
    pub ident: Ident,
    pub symbol: Symbol,
}

/// Everything the analyzer learned about one package's syntax.
#[derive(Debug, Default)]
pub struct TypeInfo {
    /// Type of every checked expression (and type expression).
    pub types: FxHashMap<NodeId, Type>,
    /// Identifiers that declare a symbol.
    pub defs: IndexMap<NodeId, IdentRef>,
    /// Identifiers that refer to a symbol.
    pub uses: IndexMap<NodeId, IdentRef>,
    /// Symbols with no declaring identifier, keyed by the node that
    /// introduces them: unnamed imports and type-switch clauses.
    pub implicits: IndexMap<NodeId, Symbol>,
}

impl TypeInfo {
    pub fn type_of(&self, id: NodeId) -> Option<&Type> {
        self.types.get(&id)
    }

    /// The symbol an identifier defines or uses.
    pub fn object_of(&self, id: NodeId) -> Option<&Symbol> {
        self.defs
            .get(&id)
            .or_else(|| self.uses.get(&id))
            .map(|r| &r.symbol)
    }

    pub(crate) fn record_def(&mut self, ident: &Ident, symbol: &Symbol) {
        self.defs.insert(
            ident.id,
            IdentRef {
                ident: ident.clone(),
                symbol: symbol.clone(),
            },
        );
    }

    pub(crate) fn record_use(&mut self, ident: &Ident, symbol: &Symbol) {
        self.uses.insert(
            ident.id,
            IdentRef {
                ident: ident.clone(),
                symbol: symbol.clone(),
            },
        );
    }

    pub(crate) fn record_type(&mut self, id: NodeId, ty: Type) {
        self.types.insert(id, ty);
    }
}
