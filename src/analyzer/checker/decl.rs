//! Package-level declarations, lazy resolution and type expressions.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::analyzer::scope::PackageScope;
use crate::analyzer::symbol::{Symbol, SymbolFlags, SymbolKind};
use crate::analyzer::types::{BasicKind, Signature, Type, assignable};
use crate::syntax::ast::*;

use super::Checker;

/// Syntax a package-level symbol is resolved from on first use.
#[derive(Clone, Copy)]
pub(super) enum PendingDecl<'r> {
    Type { spec: &'r TypeSpec, file: usize },
    Value(usize),
    Func { decl: &'r FuncDecl, file: usize },
}

/// One `ValueSpec`, typed as a unit.
#[derive(Clone)]
pub(super) struct ValueGroup<'r> {
    symbols: Vec<Symbol>,
    ty: Option<&'r Expr>,
    values: &'r [Expr],
    iota: i64,
    is_const: bool,
    file: usize,
}

/// Checker context saved while resolving a package-level object on demand.
pub(super) struct Saved {
    file: usize,
    scopes: Vec<FxHashMap<SmolStr, Symbol>>,
    iota: Option<i64>,
    results: Vec<Vec<Type>>,
}

impl<'r> Checker<'r, '_> {
    pub(super) fn enter(&mut self, file: usize) -> Saved {
        Saved {
            file: std::mem::replace(&mut self.current_file, file),
            scopes: std::mem::take(&mut self.scopes),
            iota: self.iota.take(),
            results: std::mem::take(&mut self.results),
        }
    }

    pub(super) fn leave(&mut self, saved: Saved) {
        self.current_file = saved.file;
        self.scopes = saved.scopes;
        self.iota = saved.iota;
        self.results = saved.results;
    }

    // =========================================================================
    // Collection
    // =========================================================================

    pub(super) fn collect_imports(&mut self, file: &'r SourceFile) {
        for spec in file.imports() {
            let path = spec.path_value();
            let pos = spec.path.span().start;
            let scope = if path == FOREIGN_IMPORT_PATH && self.fake_foreign {
                Arc::new(PackageScope::fake(FOREIGN_IMPORT_PATH, FOREIGN_IMPORT_PATH))
            } else {
                match self.importer.import(&path, self.dir) {
                    Ok(scope) => scope,
                    Err(err) => {
                        self.error(pos, format!("could not import {path} ({err})"));
                        continue;
                    }
                }
            };

            let local_name = spec
                .name
                .as_ref()
                .map(|n| n.name.clone())
                .unwrap_or_else(|| SmolStr::new(scope.name()));
            let sym_pos = spec.name.as_ref().map(|n| n.pos).unwrap_or(pos);
            let sym = Symbol::new(
                SymbolKind::PkgName,
                local_name.clone(),
                Some(self.path.clone()),
                self.origin(sym_pos),
                SymbolFlags::default(),
            );
            sym.set_imported(scope.clone());
            match &spec.name {
                Some(name) => self.info.record_def(name, &sym),
                None => {
                    self.info.implicits.insert(spec.id, sym.clone());
                }
            }

            let file_scope = &mut self.files[self.current_file];
            match local_name.as_str() {
                "_" => {}
                "." => file_scope.dot_imports.push(scope),
                _ => {
                    file_scope.imports.insert(local_name, sym.clone());
                    if !scope.is_fake() {
                        file_scope.declared.push((sym, pos, path));
                    }
                }
            }
        }
    }

    fn declare_member(&mut self, ident: &Ident, sym: Symbol) {
        self.objects.push(sym.clone());
        if ident.is_blank() {
            return;
        }
        if self.members.contains_key(&ident.name) {
            self.error(ident.pos, format!("{} redeclared in this block", ident.name));
            return;
        }
        self.members.insert(ident.name.clone(), sym);
    }

    pub(super) fn collect_decls(&mut self, file: &'r SourceFile) {
        let file_idx = self.current_file;
        for decl in &file.decls {
            match decl {
                Decl::Gen(gen_decl) => self.collect_gen_decl(gen_decl, file_idx),
                Decl::Func(func) if func.recv.is_none() => {
                    let sym = self.new_symbol(SymbolKind::Func, &func.name, SymbolFlags::default());
                    self.info.record_def(&func.name, &sym);
                    self.pending.insert(
                        sym.clone(),
                        PendingDecl::Func {
                            decl: func,
                            file: file_idx,
                        },
                    );
                    self.funcs.push((func, sym.clone(), file_idx));
                    if func.name.name != "init" {
                        self.declare_member(&func.name, sym);
                    }
                }
                Decl::Func(_) => {}
            }
        }
    }

    fn collect_gen_decl(&mut self, gen_decl: &'r GenDecl, file_idx: usize) {
        let mut inherited: Option<(Option<&'r Expr>, &'r [Expr])> = None;
        for (iota, spec) in gen_decl.specs.iter().enumerate() {
            match spec {
                Spec::Import(_) => {}
                Spec::Type(spec) => {
                    let flags = SymbolFlags {
                        alias: spec.alias,
                        ..SymbolFlags::default()
                    };
                    let sym = self.new_symbol(SymbolKind::TypeName, &spec.name, flags);
                    self.info.record_def(&spec.name, &sym);
                    self.pending.insert(
                        sym.clone(),
                        PendingDecl::Type {
                            spec,
                            file: file_idx,
                        },
                    );
                    self.declare_member(&spec.name, sym);
                }
                Spec::Value(spec) => {
                    let is_const = gen_decl.kind == DeclKind::Const;
                    let (ty, values) = if is_const && spec.ty.is_none() && spec.values.is_empty() {
                        inherited.unwrap_or((None, &[]))
                    } else {
                        (spec.ty.as_ref(), spec.values.as_slice())
                    };
                    if is_const {
                        inherited = Some((ty, values));
                    }

                    let kind = if is_const { SymbolKind::Const } else { SymbolKind::Var };
                    let group_idx = self.groups.len();
                    let mut symbols = Vec::with_capacity(spec.names.len());
                    for name in &spec.names {
                        let sym = self.new_symbol(kind, name, SymbolFlags::default());
                        self.info.record_def(name, &sym);
                        self.pending.insert(sym.clone(), PendingDecl::Value(group_idx));
                        self.declare_member(name, sym.clone());
                        symbols.push(sym);
                    }
                    self.groups.push(ValueGroup {
                        symbols,
                        ty,
                        values,
                        iota: iota as i64,
                        is_const,
                        file: file_idx,
                    });
                }
            }
        }
    }

    pub(super) fn collect_methods(&mut self, files: &[&'r SourceFile]) {
        for (file_idx, &file) in files.iter().enumerate() {
            self.current_file = file_idx;
            for decl in &file.decls {
                let Decl::Func(func) = decl else {
                    continue;
                };
                if func.recv.is_none() {
                    continue;
                }
                let sym = self.new_symbol(SymbolKind::Func, &func.name, SymbolFlags::default());
                self.info.record_def(&func.name, &sym);
                self.pending.insert(
                    sym.clone(),
                    PendingDecl::Func {
                        decl: func,
                        file: file_idx,
                    },
                );
                self.funcs.push((func, sym.clone(), file_idx));

                let Some(base) = func.receiver_base() else {
                    self.error(func.name.pos, "invalid receiver type");
                    continue;
                };
                match self.members.get(&base.name).cloned() {
                    Some(owner) if owner.kind() == SymbolKind::TypeName && !owner.is_alias() => {
                        if func.name.is_blank() {
                            continue;
                        }
                        let clashes = owner.method(&func.name.name).is_some()
                            || matches!(owner.underlying(), Type::Struct(fields) if fields.iter().any(|f| f.name() == func.name.name));
                        if clashes {
                            let message = format!(
                                "field and method with the same name {}.{}",
                                owner.name(),
                                func.name.name
                            );
                            self.error(func.name.pos, message);
                        } else {
                            owner.add_method(sym);
                        }
                    }
                    Some(_) => {
                        self.error(base.pos, format!("invalid receiver type {}", base.name));
                    }
                    None => self.error(base.pos, format!("undefined: {}", base.name)),
                }
            }
        }
    }

    // =========================================================================
    // Lazy resolution
    // =========================================================================

    /// Make sure a package-level symbol has its type.
    pub(super) fn ensure_resolved(&mut self, sym: &Symbol) {
        let Some(pending) = self.pending.get(sym).copied() else {
            return;
        };
        match pending {
            PendingDecl::Type { spec, file } => self.resolve_type_decl(sym, spec, file),
            PendingDecl::Value(group) => self.resolve_value_group(group),
            PendingDecl::Func { decl, file } => {
                if sym.has_type() {
                    return;
                }
                let saved = self.enter(file);
                let sig = self.signature(&decl.ty);
                self.leave(saved);
                sym.set_type(Type::Signature(sig));
            }
        }
    }

    fn resolve_type_decl(&mut self, sym: &Symbol, spec: &'r TypeSpec, file: usize) {
        let done = if spec.alias {
            sym.has_type()
        } else {
            sym.has_underlying()
        };
        if done {
            return;
        }
        if !self.resolving.insert(sym.clone()) {
            self.error(spec.name.pos, format!("invalid recursive type {}", spec.name.name));
            if spec.alias {
                sym.set_type(Type::Invalid);
            } else {
                sym.set_underlying(Type::Invalid);
            }
            return;
        }

        let saved = self.enter(file);
        let ty = self.type_expr(&spec.ty);
        self.leave(saved);

        if spec.alias {
            sym.set_type(ty);
        } else {
            let under = self.underlying_of(&ty);
            sym.set_underlying(under);
        }
        self.resolving.remove(sym);
    }

    pub(super) fn underlying_of(&mut self, ty: &Type) -> Type {
        match ty {
            Type::Named(named) => {
                self.ensure_resolved(named);
                named.underlying()
            }
            other => other.clone(),
        }
    }

    fn resolve_value_group(&mut self, group_idx: usize) {
        let group = self.groups[group_idx].clone();
        if group.symbols.iter().all(Symbol::has_type) {
            return;
        }
        if !self.resolving_groups.insert(group_idx) {
            for sym in group.symbols.iter().filter(|s| !s.has_type()) {
                self.error(sym.pos(), format!("initialization cycle for {}", sym.name()));
                sym.set_type(Type::Invalid);
            }
            return;
        }

        let saved = self.enter(group.file);
        if group.is_const {
            self.iota = Some(group.iota);
        }
        self.init_symbols(&group.symbols, group.ty, group.values, group.is_const);
        self.leave(saved);
        self.resolving_groups.remove(&group_idx);
    }

    /// Type (and for constants, evaluate) symbols from a declared type and
    /// initializer list.
    pub(super) fn init_symbols(
        &mut self,
        symbols: &[Symbol],
        ty: Option<&Expr>,
        values: &[Expr],
        is_const: bool,
    ) {
        let declared = ty.map(|t| self.type_expr(t));
        let pos = symbols.first().map(Symbol::pos).unwrap_or_default();

        if is_const {
            for (idx, sym) in symbols.iter().enumerate() {
                let Some(value) = values.get(idx) else {
                    self.error(sym.pos(), "missing init expr for const declaration");
                    sym.set_type(Type::Invalid);
                    continue;
                };
                let op = self.expr(value);
                let ty = declared.clone().unwrap_or_else(|| op.ty.clone());
                if !assignable(&op.ty, &ty) {
                    self.error(value.span().start, format!("cannot use {} as {ty} value", op.ty));
                }
                sym.set_const_value(op.value);
                sym.set_type(ty);
            }
            if values.len() > symbols.len() {
                self.error(pos, "extra init expr");
            }
            return;
        }

        if values.is_empty() {
            for sym in symbols {
                sym.set_type(declared.clone().unwrap_or(Type::Invalid));
            }
            return;
        }

        let types = self.value_types(values, symbols.len(), pos);
        for (sym, value_ty) in symbols.iter().zip(types) {
            let ty = match &declared {
                Some(declared) => {
                    if !assignable(&value_ty, declared) {
                        self.error(sym.pos(), format!("cannot use {value_ty} as {declared} value"));
                    }
                    declared.clone()
                }
                None => value_ty.default_type(),
            };
            sym.set_type(ty);
        }
    }

    /// Types produced by `values` for `count` targets, unpacking a single
    /// multi-value expression.
    pub(super) fn value_types(
        &mut self,
        values: &[Expr],
        count: usize,
        pos: crate::base::Pos,
    ) -> Vec<Type> {
        if values.len() == count {
            return values
                .iter()
                .map(|v| {
                    let op = self.expr(v);
                    self.single_value(&op, v)
                })
                .collect();
        }
        if values.len() == 1 {
            let value = &values[0];
            let op = self.expr(value);
            if count == 2 && self.is_comma_ok(value) {
                return vec![op.ty, Type::Basic(BasicKind::UntypedBool)];
            }
            match &op.ty {
                Type::Tuple(types) if types.len() == count => return types.to_vec(),
                Type::Invalid => return vec![Type::Invalid; count],
                _ => {}
            }
            let produced = match &op.ty {
                Type::Tuple(types) => types.len(),
                _ => 1,
            };
            self.error(
                pos,
                format!("assignment mismatch: {count} variables but {produced} value(s)"),
            );
            return vec![Type::Invalid; count];
        }
        for value in values {
            self.expr(value);
        }
        self.error(
            pos,
            format!(
                "assignment mismatch: {count} variables but {} values",
                values.len()
            ),
        );
        vec![Type::Invalid; count]
    }

    fn is_comma_ok(&self, value: &Expr) -> bool {
        match value.unparen() {
            Expr::TypeAssert(assert) => assert.ty.is_some(),
            Expr::Index(index) => matches!(
                self.info.type_of(index.x.id()).map(Type::underlying),
                Some(Type::Map(..))
            ),
            _ => false,
        }
    }

    // =========================================================================
    // Type expressions
    // =========================================================================

    pub(super) fn type_expr(&mut self, expr: &Expr) -> Type {
        let ty = self.type_expr_inner(expr);
        self.info.record_type(expr.id(), ty.clone());
        ty
    }

    fn type_expr_inner(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::Ident(ident) => {
                let Some(sym) = self.lookup(&ident.name) else {
                    self.error(ident.pos, format!("undefined: {}", ident.name));
                    return Type::Invalid;
                };
                self.info.record_use(ident, &sym);
                if sym.kind() != SymbolKind::TypeName {
                    self.mark_used(&sym);
                    self.error(ident.pos, format!("{} is not a type", ident.name));
                    return Type::Invalid;
                }
                if sym.is_alias() && !sym.has_type() {
                    self.ensure_resolved(&sym);
                }
                sym.ty()
            }
            Expr::Selector(sel) => {
                let Some(pkg_ident) = sel.x.as_ident() else {
                    self.error(sel.span.start, "invalid qualified type");
                    return Type::Invalid;
                };
                let Some(pkg) = self.lookup(&pkg_ident.name) else {
                    self.error(pkg_ident.pos, format!("undefined: {}", pkg_ident.name));
                    return Type::Invalid;
                };
                self.info.record_use(pkg_ident, &pkg);
                self.mark_used(&pkg);
                let Some(scope) = pkg.imported().cloned() else {
                    self.error(pkg_ident.pos, format!("{} is not a package", pkg_ident.name));
                    return Type::Invalid;
                };
                if scope.is_fake() {
                    let sym = self.foreign_member(&sel.sel);
                    self.info.record_use(&sel.sel, &sym);
                    return Type::Invalid;
                }
                match scope.lookup(&sel.sel.name).cloned() {
                    Some(sym) if sym.kind() == SymbolKind::TypeName && sym.is_exported() => {
                        self.info.record_use(&sel.sel, &sym);
                        sym.ty()
                    }
                    Some(_) => {
                        let message = format!("{}.{} is not a type", pkg_ident.name, sel.sel.name);
                        self.error(sel.sel.pos, message);
                        Type::Invalid
                    }
                    None => {
                        let message = format!("undefined: {}.{}", pkg_ident.name, sel.sel.name);
                        self.error(sel.sel.pos, message);
                        Type::Invalid
                    }
                }
            }
            Expr::Paren(paren) => self.type_expr(&paren.x),
            Expr::Star(star) => Type::pointer(self.type_expr(&star.x)),
            Expr::ArrayType(array) => {
                let elem = Arc::new(self.type_expr(&array.elem));
                let Some(len) = &array.len else {
                    return Type::Slice(elem);
                };
                let op = self.expr(len);
                match op.value {
                    Some(n) if n >= 0 => Type::Array(n as u64, elem),
                    _ => {
                        self.error(
                            len.span().start,
                            "array length must be a non-negative integer constant",
                        );
                        Type::Invalid
                    }
                }
            }
            Expr::MapType(map) => {
                let key = self.type_expr(&map.key);
                let value = self.type_expr(&map.value);
                Type::Map(Arc::new(key), Arc::new(value))
            }
            Expr::StructType(st) => self.struct_type(st),
            Expr::InterfaceType(it) => self.interface_type(it),
            Expr::FuncType(ft) => Type::Signature(self.signature(ft)),
            other => {
                self.error(other.span().start, "expression is not a type");
                Type::Invalid
            }
        }
    }

    fn struct_type(&mut self, st: &StructType) -> Type {
        let mut fields: Vec<Symbol> = Vec::new();
        for field in &st.fields {
            let ty = self.type_expr(&field.ty);
            if field.names.is_empty() {
                let Some(name) = embedded_name(&field.ty) else {
                    self.error(field.span.start, "invalid embedded field type");
                    continue;
                };
                let flags = SymbolFlags {
                    field: true,
                    embedded: true,
                    ..SymbolFlags::default()
                };
                let sym = self.new_symbol(SymbolKind::Var, name, flags).with_type(ty);
                fields.push(sym);
                continue;
            }
            for name in &field.names {
                let flags = SymbolFlags {
                    field: true,
                    ..SymbolFlags::default()
                };
                let sym = self.new_symbol(SymbolKind::Var, name, flags).with_type(ty.clone());
                self.info.record_def(name, &sym);
                if !name.is_blank() && fields.iter().any(|f| f.name() == name.name) {
                    self.error(name.pos, format!("{} redeclared", name.name));
                }
                fields.push(sym);
            }
        }
        Type::Struct(Arc::from(fields))
    }

    fn interface_type(&mut self, it: &InterfaceType) -> Type {
        let mut methods: Vec<Symbol> = Vec::new();
        for method in &it.methods {
            if let Some(name) = method.names.first() {
                let sig = self.type_expr(&method.ty);
                let sym = self
                    .new_symbol(SymbolKind::Func, name, SymbolFlags::default())
                    .with_type(sig);
                self.info.record_def(name, &sym);
                methods.push(sym);
                continue;
            }
            let embedded = self.type_expr(&method.ty);
            match self.underlying_of(&embedded) {
                Type::Interface(inner) => {
                    for m in inner.iter() {
                        if !methods.iter().any(|existing| existing.name() == m.name()) {
                            methods.push(m.clone());
                        }
                    }
                }
                Type::Invalid => {}
                other => {
                    self.error(method.span.start, format!("{other} is not an interface"));
                }
            }
        }
        Type::Interface(Arc::from(methods))
    }

    pub(super) fn signature(&mut self, ft: &FuncType) -> Arc<Signature> {
        let mut params = Vec::new();
        for field in &ft.params {
            let ty = self.type_expr(&field.ty);
            params.extend(std::iter::repeat_n(ty, field.arity()));
        }
        let mut results = Vec::new();
        for field in &ft.results {
            let ty = self.type_expr(&field.ty);
            results.extend(std::iter::repeat_n(ty, field.arity()));
        }
        let sig = Arc::new(Signature { params, results });
        self.info.record_type(ft.id, Type::Signature(sig.clone()));
        sig
    }

    /// Declare parameter and result names of a function in the current scope.
    pub(super) fn declare_params(&mut self, ft: &FuncType, sig: &Signature) {
        self.declare_fields(&ft.params, &sig.params);
        self.declare_fields(&ft.results, &sig.results);
    }

    fn declare_fields(&mut self, fields: &[Field], types: &[Type]) {
        let mut idx = 0;
        for field in fields {
            if field.names.is_empty() {
                idx += 1;
                continue;
            }
            for name in &field.names {
                let ty = types.get(idx).cloned().unwrap_or_default();
                idx += 1;
                let sym = self
                    .new_symbol(SymbolKind::Var, name, SymbolFlags::default())
                    .with_type(ty);
                self.declare_local(name, &sym);
            }
        }
    }

    pub(super) fn check_func_body(&mut self, decl: &FuncDecl, sym: &Symbol) {
        let Some(sig) = sym.ty().signature() else {
            return;
        };
        self.push_scope();
        if let Some(recv) = &decl.recv {
            let recv_ty = self.type_expr(&recv.ty);
            for name in &recv.names {
                let recv_sym = self
                    .new_symbol(SymbolKind::Var, name, SymbolFlags::default())
                    .with_type(recv_ty.clone());
                self.declare_local(name, &recv_sym);
            }
        }
        self.declare_params(&decl.ty, &sig);
        if let Some(body) = &decl.body {
            self.results.push(sig.results.clone());
            self.stmt_list(&body.stmts);
            self.results.pop();
        }
        self.pop_scope();
    }
}

/// Field name of an embedded field: the base type name.
fn embedded_name(ty: &Expr) -> Option<&Ident> {
    match ty.unparen() {
        Expr::Ident(ident) => Some(ident),
        Expr::Star(star) => embedded_name(&star.x),
        Expr::Selector(sel) => Some(&sel.sel),
        _ => None,
    }
}
