//! Jumping from a symbol to the syntax that declares it.

use std::sync::Arc;

use crate::analyzer::Symbol;
use crate::base::FileSet;
use crate::error::QueryError;
use crate::hir::{Loader, ResolvedPackage};
use crate::syntax::{Ancestors, Node, path_enclosing_interval};

/// The innermost node at a declaration (usually the declaring identifier)
/// and its ancestors.
#[derive(Debug, Clone)]
pub struct Declaration<'a> {
    pub node: Node<'a>,
    pub ancestors: Ancestors<'a>,
}

impl ResolvedPackage {
    /// Where `symbol` is declared in this package.
    ///
    /// The symbol may come from another check of the same files, so its
    /// position is translated into this package's file set first.
    pub fn declaration_of(&self, symbol: &Symbol) -> Result<Declaration<'_>, QueryError> {
        let origin = symbol
            .origin()
            .ok_or_else(|| QueryError::NoDeclaration(symbol.to_string()))?;
        let pos = FileSet::translate(origin.pos, &origin.files, self.fset())
            .ok_or_else(|| QueryError::NoExactNode(symbol.to_string()))?;

        match path_enclosing_interval(self.syntax(), pos, pos) {
            Some(found) if found.exact => Ok(Declaration {
                node: found.node,
                ancestors: found.ancestors,
            }),
            _ => Err(QueryError::NoExactNode(symbol.to_string())),
        }
    }
}

impl Loader {
    /// The package declaring `symbol`: `pkg` itself, or the package loaded
    /// under the symbol's path.
    pub fn owner_of(
        &self,
        pkg: &Arc<ResolvedPackage>,
        symbol: &Symbol,
    ) -> Result<Arc<ResolvedPackage>, QueryError> {
        let path: &str = symbol
            .package()
            .map(|path| &**path)
            .ok_or_else(|| QueryError::NoDeclaration(symbol.to_string()))?;
        if path == pkg.path() {
            return Ok(pkg.clone());
        }

        let loaded = self
            .load(&[path])
            .map_err(|err| QueryError::OwnerNotLoaded {
                path: path.to_string(),
                symbol: symbol.to_string(),
                message: err.to_string(),
            })?;
        loaded
            .get(path)
            .cloned()
            .ok_or_else(|| QueryError::OwnerNotLoaded {
                path: path.to_string(),
                symbol: symbol.to_string(),
                message: "no package with that identity".to_string(),
            })
    }

    /// Find the declaration of `symbol` and hand it to `f` together with
    /// the package it lives in.
    pub fn decl_of<R>(
        &self,
        pkg: &Arc<ResolvedPackage>,
        symbol: &Symbol,
        f: impl FnOnce(&ResolvedPackage, Declaration<'_>) -> R,
    ) -> Result<R, QueryError> {
        let owner = self.owner_of(pkg, symbol)?;
        let decl = owner.declaration_of(symbol)?;
        Ok(f(&owner, decl))
    }
}
