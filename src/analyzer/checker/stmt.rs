//! Statement checking inside function bodies.

use crate::analyzer::symbol::{Symbol, SymbolFlags, SymbolKind};
use crate::analyzer::types::{BasicKind, Type, assignable};
use crate::syntax::ast::*;

use super::Checker;
use super::expr::expr_string;

const LOCAL: SymbolFlags = SymbolFlags {
    field: false,
    embedded: false,
    alias: false,
    local: true,
};

impl Checker<'_, '_> {
    pub(super) fn stmt_list(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn block(&mut self, block: &Block) {
        self.push_scope();
        self.stmt_list(&block.stmts);
        self.pop_scope();
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(decl) => self.local_decl(&decl.decl),
            Stmt::Assign(assign) => match assign.op {
                AssignOp::Define => self.short_var_decl(assign),
                AssignOp::Assign => self.assignment(assign),
                AssignOp::Compound(_) => {
                    let (Some(lhs), Some(rhs)) = (assign.lhs.first(), assign.rhs.first()) else {
                        return;
                    };
                    let target = self.assign_target(lhs);
                    let value = self.rvalue(rhs);
                    self.assign_value(&value, rhs, &target, "assignment");
                }
            },
            Stmt::Expr(expr_stmt) => {
                let op = self.expr(&expr_stmt.x);
                if !matches!(expr_stmt.x.unparen(), Expr::Call(_))
                    && !matches!(op.ty, Type::Invalid)
                {
                    let message = format!("{} is not used", expr_string(&expr_stmt.x));
                    self.error(expr_stmt.span.start, message);
                }
            }
            Stmt::IncDec(inc_dec) => {
                let ty = self.assign_target(&inc_dec.x);
                if !ty.is_invalid() && !ty.basic().is_some_and(BasicKind::is_numeric) {
                    let op = if inc_dec.inc { "++" } else { "--" };
                    let message = format!(
                        "invalid operation: {}{op} (non-numeric type {ty})",
                        expr_string(&inc_dec.x)
                    );
                    self.error(inc_dec.span.start, message);
                }
            }
            Stmt::Return(ret) => self.return_stmt(ret),
            Stmt::Block(block) => self.block(block),
            Stmt::If(if_stmt) => {
                self.push_scope();
                if let Some(init) = &if_stmt.init {
                    self.stmt(init);
                }
                self.condition(&if_stmt.cond, "if");
                self.block(&if_stmt.body);
                if let Some(els) = &if_stmt.els {
                    self.stmt(els);
                }
                self.pop_scope();
            }
            Stmt::For(for_stmt) => {
                self.push_scope();
                if let Some(init) = &for_stmt.init {
                    self.stmt(init);
                }
                if let Some(cond) = &for_stmt.cond {
                    self.condition(cond, "for");
                }
                if let Some(post) = &for_stmt.post {
                    self.stmt(post);
                }
                self.block(&for_stmt.body);
                self.pop_scope();
            }
            Stmt::Switch(switch) => self.switch_stmt(switch),
            Stmt::TypeSwitch(switch) => self.type_switch(switch),
            Stmt::Deferred(deferred) => {
                if !matches!(deferred.call.unparen(), Expr::Call(_)) {
                    let keyword = if deferred.is_go { "go" } else { "defer" };
                    let message = format!("expression in {keyword} must be function call");
                    self.error(deferred.call.span().start, message);
                }
                self.expr(&deferred.call);
            }
            Stmt::Branch(_) => {}
        }
    }

    fn condition(&mut self, cond: &Expr, keyword: &str) {
        let op = self.rvalue(cond);
        if !op.ty.is_invalid() && !op.ty.basic().is_some_and(BasicKind::is_boolean) {
            let message = format!(
                "non-boolean condition in {keyword} statement: {}",
                expr_string(cond)
            );
            self.error(cond.span().start, message);
        }
    }

    // =========================================================================
    // Declarations and assignments
    // =========================================================================

    fn local_decl(&mut self, decl: &GenDecl) {
        let mut inherited: Option<(Option<&Expr>, &[Expr])> = None;
        for (iota, spec) in decl.specs.iter().enumerate() {
            match spec {
                Spec::Import(_) => {}
                Spec::Value(spec) => {
                    let is_const = decl.kind == DeclKind::Const;
                    let (ty, values) = if is_const && spec.ty.is_none() && spec.values.is_empty() {
                        inherited.unwrap_or((None, &[]))
                    } else {
                        (spec.ty.as_ref(), spec.values.as_slice())
                    };
                    let kind = if is_const {
                        inherited = Some((ty, values));
                        SymbolKind::Const
                    } else {
                        SymbolKind::Var
                    };

                    let symbols: Vec<Symbol> = spec
                        .names
                        .iter()
                        .map(|name| self.new_symbol(kind, name, LOCAL))
                        .collect();
                    let saved_iota = self.iota;
                    if is_const {
                        self.iota = Some(iota as i64);
                    }
                    self.init_symbols(&symbols, ty, values, is_const);
                    self.iota = saved_iota;

                    for (name, sym) in spec.names.iter().zip(&symbols) {
                        self.declare_local(name, sym);
                        if !is_const && !name.is_blank() {
                            self.locals.push(sym.clone());
                        }
                    }
                }
                Spec::Type(spec) => {
                    let flags = SymbolFlags {
                        alias: spec.alias,
                        ..LOCAL
                    };
                    let sym = self.new_symbol(SymbolKind::TypeName, &spec.name, flags);
                    self.declare_local(&spec.name, &sym);
                    let ty = self.type_expr(&spec.ty);
                    if spec.alias {
                        sym.set_type(ty);
                    } else {
                        let under = self.underlying_of(&ty);
                        sym.set_underlying(under);
                    }
                }
            }
        }
    }

    fn short_var_decl(&mut self, assign: &AssignStmt) {
        let pos = assign.span.start;
        let types = self.value_types(&assign.rhs, assign.lhs.len(), pos);

        let mut fresh = Vec::new();
        let mut any_new = false;
        for (lhs, ty) in assign.lhs.iter().zip(types) {
            let Expr::Ident(ident) = lhs else {
                let message = format!("non-name {} on left side of :=", expr_string(lhs));
                self.error(lhs.span().start, message);
                continue;
            };
            if ident.is_blank() {
                continue;
            }
            if let Some(existing) = self.lookup_innermost(&ident.name) {
                self.info.record_use(ident, &existing);
                if !assignable(&ty, &existing.ty()) {
                    let message = format!("cannot use {ty} value as {} value in assignment", existing.ty());
                    self.error(ident.pos, message);
                }
                continue;
            }
            if fresh.iter().any(|(other, _): &(&Ident, Symbol)| other.name == ident.name) {
                self.error(ident.pos, format!("{} repeated on left side of :=", ident.name));
                continue;
            }
            any_new = true;
            let sym = self
                .new_symbol(SymbolKind::Var, ident, LOCAL)
                .with_type(ty.default_type());
            fresh.push((ident, sym));
        }

        if !any_new {
            self.error(pos, "no new variables on left side of :=");
        }
        for (ident, sym) in fresh {
            self.declare_local(ident, &sym);
            self.locals.push(sym);
        }
    }

    fn assignment(&mut self, assign: &AssignStmt) {
        let targets: Vec<Type> = assign.lhs.iter().map(|lhs| self.assign_target(lhs)).collect();
        let types = self.value_types(&assign.rhs, assign.lhs.len(), assign.span.start);
        for ((target, ty), lhs) in targets.iter().zip(&types).zip(&assign.lhs) {
            if !assignable(ty, target) {
                let message = format!(
                    "cannot use {ty} value as {target} value in assignment to {}",
                    expr_string(lhs)
                );
                self.error(lhs.span().start, message);
            }
        }
    }

    /// Type of an assignment target. Assigning to a variable is not a use.
    fn assign_target(&mut self, lhs: &Expr) -> Type {
        let Expr::Ident(ident) = lhs.unparen() else {
            return self.rvalue(lhs).ty;
        };
        if ident.is_blank() {
            return Type::Invalid;
        }
        let Some(sym) = self.lookup(&ident.name) else {
            self.error(ident.pos, format!("undefined: {}", ident.name));
            return Type::Invalid;
        };
        self.info.record_use(ident, &sym);
        if sym.kind() != SymbolKind::Var {
            if sym.kind() == SymbolKind::PkgName {
                self.mark_used(&sym);
            }
            self.error(ident.pos, format!("cannot assign to {}", ident.name));
            return Type::Invalid;
        }
        self.ensure_resolved(&sym);
        let ty = sym.ty();
        self.info.record_type(lhs.id(), ty.clone());
        ty
    }

    fn return_stmt(&mut self, ret: &ReturnStmt) {
        let expected = self.results.last().cloned().unwrap_or_default();
        if ret.results.is_empty() {
            return;
        }
        if expected.is_empty() {
            for result in &ret.results {
                self.expr(result);
            }
            self.error(ret.results[0].span().start, "too many return values");
            return;
        }
        if ret.results.len() == expected.len() {
            for (result, target) in ret.results.iter().zip(&expected) {
                let op = self.rvalue(result);
                self.assign_value(&op, result, target, "return statement");
            }
            return;
        }
        if let [single] = ret.results.as_slice() {
            let op = self.expr(single);
            if let Type::Tuple(types) = &op.ty
                && types.len() == expected.len()
            {
                for (ty, target) in types.iter().zip(&expected) {
                    if !assignable(ty, target) {
                        let message = format!("cannot use {ty} value as {target} value in return statement");
                        self.error(single.span().start, message);
                    }
                }
                return;
            }
        } else {
            for result in &ret.results {
                self.expr(result);
            }
        }
        let message = if ret.results.len() > expected.len() {
            "too many return values"
        } else {
            "not enough return values"
        };
        self.error(ret.span.start, message);
    }

    // =========================================================================
    // Switches
    // =========================================================================

    fn switch_stmt(&mut self, switch: &SwitchStmt) {
        self.push_scope();
        if let Some(init) = &switch.init {
            self.stmt(init);
        }
        let tag = switch.tag.as_ref().map(|tag| self.rvalue(tag).ty);
        for clause in &switch.clauses {
            for case in &clause.list {
                let op = self.rvalue(case);
                match &tag {
                    Some(tag_ty) => {
                        if !assignable(&op.ty, tag_ty) && !assignable(tag_ty, &op.ty) {
                            let message = format!(
                                "invalid case {} in switch (mismatched types {} and {tag_ty})",
                                expr_string(case),
                                op.ty
                            );
                            self.error(case.span().start, message);
                        }
                    }
                    None => {
                        if !op.ty.is_invalid() && !op.ty.basic().is_some_and(BasicKind::is_boolean) {
                            let message = format!(
                                "invalid case {} in switch (mismatched types {} and bool)",
                                expr_string(case),
                                op.ty
                            );
                            self.error(case.span().start, message);
                        }
                    }
                }
            }
            self.push_scope();
            self.stmt_list(&clause.body);
            self.pop_scope();
        }
        self.pop_scope();
    }

    fn type_switch(&mut self, switch: &TypeSwitchStmt) {
        self.push_scope();
        if let Some(init) = &switch.init {
            self.stmt(init);
        }

        let guard_ty = match switch.guard.unparen() {
            Expr::TypeAssert(assert) if assert.ty.is_none() => {
                let x = self.rvalue(&assert.x);
                if !x.ty.is_invalid() && !x.ty.is_interface() {
                    let message = format!(
                        "{} (value of type {}) is not an interface",
                        expr_string(&assert.x),
                        x.ty
                    );
                    self.error(assert.x.span().start, message);
                }
                x.ty
            }
            other => {
                self.error(other.span().start, "invalid type switch guard");
                Type::Invalid
            }
        };

        let mut clause_symbols = Vec::new();
        for clause in &switch.clauses {
            let mut case_types = Vec::with_capacity(clause.list.len());
            for case in &clause.list {
                let nil = match case {
                    Expr::Ident(ident) if ident.name == "nil" => self
                        .lookup("nil")
                        .filter(|sym| sym.kind() == SymbolKind::Nil)
                        .map(|sym| (ident, sym)),
                    _ => None,
                };
                let ty = match nil {
                    Some((ident, sym)) => {
                        self.info.record_use(ident, &sym);
                        None
                    }
                    None => Some(self.type_expr(case)),
                };
                case_types.push(ty);
            }

            self.push_scope();
            if let Some(binding) = &switch.binding {
                let ty = match case_types.as_slice() {
                    [Some(single)] => single.clone(),
                    _ => guard_ty.clone(),
                };
                let sym = self.new_symbol(SymbolKind::Var, binding, LOCAL).with_type(ty);
                self.info.implicits.insert(clause.id, sym.clone());
                if !binding.is_blank()
                    && let Some(scope) = self.scopes.last_mut()
                {
                    scope.insert(binding.name.clone(), sym.clone());
                }
                clause_symbols.push(sym);
            }
            self.stmt_list(&clause.body);
            self.pop_scope();
        }

        if let Some(binding) = &switch.binding
            && !binding.is_blank()
        {
            self.switch_bindings.push((binding.clone(), clause_symbols));
        }
        self.pop_scope();
    }
}
