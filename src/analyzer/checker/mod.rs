//! Reference checker for the host language.
//!
//! Checking runs in phases over all files of a package at once:
//!
//! 1. imports and package-level declarations are collected
//! 2. defined types get their underlying types
//! 3. methods are attached to their receiver types
//! 4. package-level variables and constants are typed
//! 5. function bodies are checked
//! 6. unused imports and locals are reported as soft diagnostics
//!
//! Package-level objects are resolved lazily, so declaration order does not
//! matter between phases.

mod decl;
mod expr;
mod stmt;

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::trace;

use crate::base::{FileSet, Pos};
use crate::parser::parse_expr;
use crate::syntax::ast::{FuncDecl, Ident, SourceFile};

use super::scope::{PackageScope, TypeInfo};
use super::symbol::{Origin, Symbol, SymbolFlags, SymbolKind};
use super::types::Type;
use super::universe::universe;
use super::{Analysis, CheckRequest, Diagnostic, ImportResolver, SemanticAnalyzer};

use decl::{PendingDecl, ValueGroup};

/// The bundled analyzer.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostChecker;

impl HostChecker {
    pub fn new() -> Self {
        Self
    }
}

impl SemanticAnalyzer for HostChecker {
    fn check(&self, request: CheckRequest<'_>, sink: &mut dyn FnMut(Diagnostic)) -> Analysis {
        let package_name = request
            .files
            .first()
            .map(|f| f.package_name.name.clone())
            .unwrap_or_default();
        let mut checker = Checker::new(&request, sink);
        checker.run(&request.files);
        let (members, info) = checker.finish();
        Analysis {
            scope: Arc::new(PackageScope::new(request.path, package_name, members)),
            info,
        }
    }

    fn eval_type(&self, src: &str, importer: &dyn ImportResolver) -> Result<Type, Diagnostic> {
        let fset = Arc::new(FileSet::new());
        let expr = parse_expr(&fset, "<type>", src)
            .map_err(|err| Diagnostic::hard(Pos::NONE, err.message))?;

        let mut first_error = None;
        let mut sink = |diag: Diagnostic| {
            if !diag.soft && first_error.is_none() {
                first_error = Some(diag);
            }
        };
        let request = CheckRequest {
            path: "",
            dir: None,
            files: Vec::new(),
            fset: &fset,
            importer,
            fake_foreign_imports: false,
        };
        let mut checker = Checker::new(&request, &mut sink);
        checker.files.push(FileScope::default());
        let ty = checker.type_expr(&expr);
        drop(checker);
        match first_error {
            Some(diag) => Err(diag),
            None => Ok(ty),
        }
    }
}

/// Names visible in one file: its imports.
#[derive(Default)]
pub(super) struct FileScope {
    imports: FxHashMap<SmolStr, Symbol>,
    dot_imports: Vec<Arc<PackageScope>>,
    /// Import names in declaration order, for unused reporting.
    declared: Vec<(Symbol, Pos, String)>,
}

/// Mutable state of one check.
pub(super) struct Checker<'r, 's> {
    path: Arc<str>,
    dir: Option<&'r Path>,
    fset: Arc<FileSet>,
    importer: &'r dyn ImportResolver,
    fake_foreign: bool,
    sink: &'s mut dyn FnMut(Diagnostic),
    info: TypeInfo,
    members: IndexMap<SmolStr, Symbol>,
    files: Vec<FileScope>,
    current_file: usize,
    /// Package-level symbols in declaration order, blank ones included.
    objects: Vec<Symbol>,
    pending: FxHashMap<Symbol, PendingDecl<'r>>,
    groups: Vec<ValueGroup<'r>>,
    resolving: FxHashSet<Symbol>,
    resolving_groups: FxHashSet<usize>,
    funcs: Vec<(&'r FuncDecl, Symbol, usize)>,
    /// Local block scopes, innermost last.
    scopes: Vec<FxHashMap<SmolStr, Symbol>>,
    iota: Option<i64>,
    /// Results of the function whose body is being checked.
    results: Vec<Vec<Type>>,
    used: FxHashSet<Symbol>,
    locals: Vec<Symbol>,
    /// Type-switch bindings: clause symbols sharing one declared name.
    switch_bindings: Vec<(Ident, Vec<Symbol>)>,
    foreign: FxHashMap<SmolStr, Symbol>,
}

impl<'r, 's> Checker<'r, 's> {
    fn new(request: &CheckRequest<'r>, sink: &'s mut dyn FnMut(Diagnostic)) -> Self {
        Self {
            path: Arc::from(request.path),
            dir: request.dir,
            fset: request.fset.clone(),
            importer: request.importer,
            fake_foreign: request.fake_foreign_imports,
            sink,
            info: TypeInfo::default(),
            members: IndexMap::new(),
            files: Vec::new(),
            current_file: 0,
            objects: Vec::new(),
            pending: FxHashMap::default(),
            groups: Vec::new(),
            resolving: FxHashSet::default(),
            resolving_groups: FxHashSet::default(),
            funcs: Vec::new(),
            scopes: Vec::new(),
            iota: None,
            results: Vec::new(),
            used: FxHashSet::default(),
            locals: Vec::new(),
            switch_bindings: Vec::new(),
            foreign: FxHashMap::default(),
        }
    }

    fn run(&mut self, files: &[&'r SourceFile]) {
        for (idx, &file) in files.iter().enumerate() {
            self.current_file = idx;
            self.files.push(FileScope::default());
            self.collect_imports(file);
            self.collect_decls(file);
        }

        let objects = self.objects.clone();
        for sym in objects.iter().filter(|s| s.kind() == SymbolKind::TypeName) {
            self.ensure_resolved(sym);
        }

        self.collect_methods(files);

        for sym in &objects {
            self.ensure_resolved(sym);
        }
        for (_, sym, _) in self.funcs.clone() {
            self.ensure_resolved(&sym);
        }

        for (decl, sym, file) in self.funcs.clone() {
            self.current_file = file;
            self.check_func_body(decl, &sym);
        }

        self.report_unused();
    }

    fn finish(self) -> (IndexMap<SmolStr, Symbol>, TypeInfo) {
        (self.members, self.info)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    fn error(&mut self, pos: Pos, message: impl Into<String>) {
        let diag = Diagnostic::hard(pos, message);
        trace!(pos = pos.raw(), message = %diag.message, "check error");
        (self.sink)(diag);
    }

    fn soft_error(&mut self, pos: Pos, message: impl Into<String>) {
        (self.sink)(Diagnostic::soft(pos, message));
    }

    fn report_unused(&mut self) {
        let mut reports = Vec::new();
        for file in &self.files {
            for (sym, pos, path) in &file.declared {
                if !self.used.contains(sym) {
                    reports.push((*pos, format!("\"{path}\" imported and not used")));
                }
            }
        }
        for local in &self.locals {
            if !self.used.contains(local) {
                reports.push((local.pos(), format!("declared and not used: {}", local.name())));
            }
        }
        for (binding, clauses) in &self.switch_bindings {
            if !clauses.iter().any(|sym| self.used.contains(sym)) {
                reports.push((binding.pos, format!("declared and not used: {}", binding.name)));
            }
        }
        for (pos, message) in reports {
            self.soft_error(pos, message);
        }
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    fn origin(&self, pos: Pos) -> Option<Origin> {
        Some(Origin {
            files: self.fset.clone(),
            pos,
        })
    }

    fn new_symbol(&self, kind: SymbolKind, ident: &Ident, flags: SymbolFlags) -> Symbol {
        Symbol::new(
            kind,
            ident.name.clone(),
            Some(self.path.clone()),
            self.origin(ident.pos),
            flags,
        )
    }

    fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declare a local in the innermost scope and record its definition.
    fn declare_local(&mut self, ident: &Ident, sym: &Symbol) {
        self.info.record_def(ident, sym);
        if ident.is_blank() {
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&ident.name) {
                let message = format!("{} redeclared in this block", ident.name);
                self.error(ident.pos, message);
                return;
            }
            scope.insert(ident.name.clone(), sym.clone());
        }
    }

    fn lookup_innermost(&self, name: &str) -> Option<Symbol> {
        self.scopes.last().and_then(|s| s.get(name)).cloned()
    }

    /// Local scopes, then file imports, then package members, then the
    /// universe.
    fn lookup(&self, name: &str) -> Option<Symbol> {
        for scope in self.scopes.iter().rev() {
            if let Some(sym) = scope.get(name) {
                return Some(sym.clone());
            }
        }
        if let Some(file) = self.files.get(self.current_file) {
            if let Some(sym) = file.imports.get(name) {
                return Some(sym.clone());
            }
        }
        if let Some(sym) = self.members.get(name) {
            return Some(sym.clone());
        }
        if let Some(file) = self.files.get(self.current_file) {
            for scope in &file.dot_imports {
                if let Some(sym) = scope.lookup(name).filter(|s| s.is_exported()) {
                    return Some(sym.clone());
                }
            }
        }
        universe().lookup(name).cloned()
    }

    fn mark_used(&mut self, sym: &Symbol) {
        if matches!(sym.kind(), SymbolKind::Var | SymbolKind::PkgName) {
            self.used.insert(sym.clone());
        }
    }

    /// Symbol for a member of the stand-in foreign package.
    fn foreign_member(&mut self, ident: &Ident) -> Symbol {
        if let Some(sym) = self.foreign.get(&ident.name) {
            return sym.clone();
        }
        let sym = Symbol::new(
            SymbolKind::Var,
            ident.name.clone(),
            Some(Arc::from("C")),
            None,
            SymbolFlags::default(),
        )
        .with_type(Type::Invalid);
        self.foreign.insert(ident.name.clone(), sym.clone());
        sym
    }
}

#[cfg(test)]
mod tests;
