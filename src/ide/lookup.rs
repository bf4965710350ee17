//! Types and objects by specifier.
//!
//! ```text
//! lookup_type("encoding/json.Marshaler")   // <import path>.<name>
//! lookup_type("*encoding/json.Encoder")    // leading `*` adds a pointer
//! lookup_type("[5]int")                    // anything else is evaluated
//! lookup_object("io.Reader.Read")          // members chain with `.`
//! ```

use std::sync::Arc;

use crate::analyzer::{PackageScope, Symbol, SymbolKind, Type, lookup_field_or_method};
use crate::error::LookupError;
use crate::hir::ResolvedPackage;

/// Split at the first `.` after the last `/`.
fn split_specifier(spec: &str) -> Option<(&str, &str)> {
    let after_slash = spec.rfind('/').map_or(0, |idx| idx + 1);
    let dot = after_slash + spec[after_slash..].find('.')?;
    Some((&spec[..dot], &spec[dot + 1..]))
}

impl ResolvedPackage {
    /// The type named by `spec`, memoized per package.
    pub fn lookup_type(&self, spec: &str) -> Result<Type, LookupError> {
        if let Some(ty) = self.type_cache.lock().get(spec) {
            return Ok(ty.clone());
        }
        let ty = self.resolve_type(spec)?;
        self.type_cache.lock().insert(spec.to_string(), ty.clone());
        Ok(ty)
    }

    /// The object named by `spec`, memoized per package.
    pub fn lookup_object(&self, spec: &str) -> Result<Symbol, LookupError> {
        if let Some(sym) = self.object_cache.lock().get(spec) {
            return Ok(sym.clone());
        }
        let sym = self.resolve_object(spec)?;
        self.object_cache.lock().insert(spec.to_string(), sym.clone());
        Ok(sym)
    }

    fn resolve_type(&self, spec: &str) -> Result<Type, LookupError> {
        let Some((path, name)) = split_specifier(spec) else {
            return self
                .analyzer()
                .eval_type(spec, &**self.importer())
                .map_err(|diag| LookupError::Eval {
                    spec: spec.to_string(),
                    message: diag.message,
                });
        };

        let import_path = path.trim_start_matches('*');
        let type_name = name.trim_start_matches('*');
        let pointers = (path.len() - import_path.len()) + (name.len() - type_name.len());

        let scope = self.scope_for(import_path)?;
        let sym = scope
            .lookup(type_name)
            .ok_or_else(|| LookupError::not_found("type", spec))?;
        if sym.kind() != SymbolKind::TypeName {
            return Err(LookupError::NotAType(format!("{}.{type_name}", scope.path())));
        }

        let mut ty = sym.ty();
        for _ in 0..pointers {
            ty = Type::pointer(ty);
        }
        Ok(ty)
    }

    fn resolve_object(&self, spec: &str) -> Result<Symbol, LookupError> {
        let (path, members) =
            split_specifier(spec).ok_or_else(|| LookupError::InvalidSpecifier(spec.to_string()))?;
        let scope = self.scope_for(path)?;

        let mut parts = members.split('.');
        let first = parts.next().unwrap_or_default();
        let mut sym = scope
            .lookup(first)
            .cloned()
            .or_else(|| self.implicit_package_name(first))
            .ok_or_else(|| LookupError::not_found("object", spec))?;

        for member in parts {
            sym = lookup_field_or_method(&sym.ty(), member).ok_or_else(|| LookupError::NoMember {
                member: member.to_string(),
                owner: sym.to_string(),
            })?;
        }
        Ok(sym)
    }

    /// Packages imported without a local name have no scope entry.
    fn implicit_package_name(&self, name: &str) -> Option<Symbol> {
        self.info()
            .implicits
            .values()
            .find(|sym| sym.kind() == SymbolKind::PkgName && sym.name() == name)
            .cloned()
    }

    fn scope_for(&self, path: &str) -> Result<Arc<PackageScope>, LookupError> {
        if path == self.path() {
            return Ok(self.scope().clone());
        }
        self.importer()
            .import(path, Some(self.dir()))
            .map_err(|err| LookupError::Import {
                path: path.to_string(),
                message: err.to_string(),
            })
    }
}
