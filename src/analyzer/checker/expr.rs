//! Expression checking.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::analyzer::scope::PackageScope;
use crate::analyzer::symbol::{Symbol, SymbolKind};
use crate::analyzer::types::{
    BasicKind, Signature, Type, assignable, identical, lookup_field_or_method,
};
use crate::analyzer::universe::universe;
use crate::syntax::ast::*;

use super::Checker;

#[derive(Debug, Clone)]
pub(super) enum Mode {
    /// A call without results.
    NoValue,
    Value,
    Type,
    Package(Arc<PackageScope>),
    Builtin(SmolStr),
    /// Already reported, or depends on something that was.
    Invalid,
}

#[derive(Debug, Clone)]
pub(super) struct Operand {
    pub mode: Mode,
    pub ty: Type,
    /// Value of an integer constant expression.
    pub value: Option<i64>,
}

impl Operand {
    fn value(ty: Type) -> Self {
        Self {
            mode: Mode::Value,
            ty,
            value: None,
        }
    }

    fn constant(ty: Type, value: Option<i64>) -> Self {
        Self {
            mode: Mode::Value,
            ty,
            value,
        }
    }

    fn of_type(ty: Type) -> Self {
        Self {
            mode: Mode::Type,
            ty,
            value: None,
        }
    }

    fn mode(mode: Mode) -> Self {
        Self {
            mode,
            ty: Type::Invalid,
            value: None,
        }
    }

    fn invalid() -> Self {
        Self::mode(Mode::Invalid)
    }
}

fn untyped(kind: BasicKind) -> Type {
    Type::Basic(kind)
}

impl Checker<'_, '_> {
    pub(super) fn expr(&mut self, expr: &Expr) -> Operand {
        let op = self.expr_inner(expr);
        if matches!(op.mode, Mode::Value | Mode::Type) {
            self.info.record_type(expr.id(), op.ty.clone());
        }
        op
    }

    /// Check `expr` and return its single value type, reporting anything
    /// that is not a value.
    pub(super) fn single_value(&mut self, op: &Operand, expr: &Expr) -> Type {
        let pos = expr.span().start;
        let text = expr_string(expr);
        match &op.mode {
            Mode::Value => match &op.ty {
                Type::Tuple(_) => {
                    let message = format!(
                        "multiple-value {text} (value of type {}) in single-value context",
                        op.ty
                    );
                    self.error(pos, message);
                    Type::Invalid
                }
                ty => ty.clone(),
            },
            Mode::NoValue => {
                self.error(pos, format!("{text} (no value) used as value"));
                Type::Invalid
            }
            Mode::Type => {
                self.error(pos, format!("{text} (type) is not an expression"));
                Type::Invalid
            }
            Mode::Package(_) => {
                self.error(pos, format!("use of package {text} without selector"));
                Type::Invalid
            }
            Mode::Builtin(name) => {
                let message = format!("{name} (built-in function) must be called");
                self.error(pos, message);
                Type::Invalid
            }
            Mode::Invalid => Type::Invalid,
        }
    }

    /// Check `expr` as a single value.
    pub(super) fn rvalue(&mut self, expr: &Expr) -> Operand {
        let op = self.expr(expr);
        let ty = self.single_value(&op, expr);
        Operand { ty, ..op }
    }

    pub(super) fn assign_value(&mut self, op: &Operand, expr: &Expr, target: &Type, context: &str) {
        if !assignable(&op.ty, target) {
            let message = format!(
                "cannot use {} (value of type {}) as {target} value in {context}",
                expr_string(expr),
                op.ty
            );
            self.error(expr.span().start, message);
        }
    }

    fn expr_inner(&mut self, expr: &Expr) -> Operand {
        match expr {
            Expr::Ident(ident) => self.ident(ident),
            Expr::BasicLit(lit) => basic_lit(lit),
            Expr::Selector(sel) => self.selector(sel),
            Expr::Call(call) => self.call(call),
            Expr::Star(star) => {
                let x = self.expr(&star.x);
                match x.mode {
                    Mode::Type => Operand::of_type(Type::pointer(x.ty)),
                    Mode::Value => match x.ty.pointee() {
                        Some(elem) => Operand::value(elem),
                        None if x.ty.is_invalid() => Operand::value(Type::Invalid),
                        None => {
                            let message = format!(
                                "invalid operation: cannot indirect {} (value of type {})",
                                expr_string(&star.x),
                                x.ty
                            );
                            self.error(star.span.start, message);
                            Operand::invalid()
                        }
                    },
                    _ => {
                        self.single_value(&x, &star.x);
                        Operand::invalid()
                    }
                }
            }
            Expr::Unary(unary) => self.unary(unary),
            Expr::Binary(binary) => self.binary(binary),
            Expr::Paren(paren) => self.expr(&paren.x),
            Expr::TypeAssert(assert) => {
                let x = self.rvalue(&assert.x);
                let Some(ty_expr) = &assert.ty else {
                    self.error(assert.span.start, "use of .(type) outside type switch");
                    return Operand::invalid();
                };
                let ty = self.type_expr(ty_expr);
                if !x.ty.is_invalid() && !x.ty.is_interface() {
                    let message = format!(
                        "invalid operation: {} (value of type {}) is not an interface",
                        expr_string(&assert.x),
                        x.ty
                    );
                    self.error(assert.x.span().start, message);
                }
                Operand::value(ty)
            }
            Expr::Index(index) => self.index(index),
            Expr::CompositeLit(lit) => self.composite_lit(lit),
            Expr::KeyValue(kv) => {
                self.error(kv.span.start, "unexpected key:value expression");
                Operand::invalid()
            }
            Expr::FuncLit(lit) => {
                let sig = self.signature(&lit.ty);
                self.push_scope();
                self.declare_params(&lit.ty, &sig);
                self.results.push(sig.results.clone());
                self.stmt_list(&lit.body.stmts);
                self.results.pop();
                self.pop_scope();
                Operand::value(Type::Signature(sig))
            }
            Expr::ArrayType(_)
            | Expr::MapType(_)
            | Expr::StructType(_)
            | Expr::InterfaceType(_)
            | Expr::FuncType(_) => Operand::of_type(self.type_expr(expr)),
        }
    }

    fn ident(&mut self, ident: &Ident) -> Operand {
        if ident.is_blank() {
            self.error(ident.pos, "cannot use _ as value");
            return Operand::invalid();
        }
        let Some(sym) = self.lookup(&ident.name) else {
            self.error(ident.pos, format!("undefined: {}", ident.name));
            return Operand::invalid();
        };
        self.info.record_use(ident, &sym);
        self.mark_used(&sym);
        self.symbol_operand(&sym, ident)
    }

    fn symbol_operand(&mut self, sym: &Symbol, ident: &Ident) -> Operand {
        match sym.kind() {
            SymbolKind::Var | SymbolKind::Func => {
                self.ensure_resolved(sym);
                Operand::value(sym.ty())
            }
            SymbolKind::Const if universe().is_iota(sym) => match self.iota {
                Some(iota) => Operand::constant(untyped(BasicKind::UntypedInt), Some(iota)),
                None => {
                    self.error(ident.pos, "cannot use iota outside constant declaration");
                    Operand::invalid()
                }
            },
            SymbolKind::Const => {
                self.ensure_resolved(sym);
                Operand::constant(sym.ty(), sym.const_value())
            }
            SymbolKind::TypeName => {
                self.ensure_resolved(sym);
                Operand::of_type(sym.ty())
            }
            SymbolKind::PkgName => match sym.imported() {
                Some(scope) => Operand::mode(Mode::Package(scope.clone())),
                None => Operand::invalid(),
            },
            SymbolKind::Builtin => Operand::mode(Mode::Builtin(SmolStr::new(sym.name()))),
            SymbolKind::Nil => Operand::value(untyped(BasicKind::UntypedNil)),
        }
    }

    fn selector(&mut self, sel: &SelectorExpr) -> Operand {
        let x = self.expr(&sel.x);
        let name = &sel.sel;
        match x.mode {
            Mode::Package(scope) => {
                if scope.is_fake() {
                    let sym = self.foreign_member(name);
                    self.info.record_use(name, &sym);
                    return Operand::value(Type::Invalid);
                }
                let pkg = expr_string(&sel.x);
                match scope.lookup(&name.name).cloned() {
                    Some(sym) if sym.is_exported() => {
                        self.info.record_use(name, &sym);
                        self.symbol_operand(&sym, name)
                    }
                    Some(_) => {
                        let message = format!("name {} not exported by package {pkg}", name.name);
                        self.error(name.pos, message);
                        Operand::invalid()
                    }
                    None => {
                        self.error(name.pos, format!("undefined: {pkg}.{}", name.name));
                        Operand::invalid()
                    }
                }
            }
            Mode::Type => {
                let Some(method) =
                    lookup_field_or_method(&x.ty, &name.name).filter(Symbol::is_func)
                else {
                    if !x.ty.is_invalid() {
                        let message = format!("{} has no method {}", x.ty, name.name);
                        self.error(name.pos, message);
                    }
                    return Operand::invalid();
                };
                self.info.record_use(name, &method);
                self.ensure_resolved(&method);
                // Method expression: the receiver becomes the first parameter.
                let ty = match method.ty().signature() {
                    Some(sig) => {
                        let mut params = vec![x.ty.clone()];
                        params.extend(sig.params.iter().cloned());
                        Type::Signature(Arc::new(Signature {
                            params,
                            results: sig.results.clone(),
                        }))
                    }
                    None => Type::Invalid,
                };
                Operand::value(ty)
            }
            Mode::Value => {
                let ty = self.single_value(&x, &sel.x);
                if ty.is_invalid() {
                    return Operand::value(Type::Invalid);
                }
                match lookup_field_or_method(&ty, &name.name) {
                    Some(member) => {
                        self.info.record_use(name, &member);
                        if member.is_func() {
                            self.ensure_resolved(&member);
                        }
                        Operand::value(member.ty())
                    }
                    None => {
                        let message = format!(
                            "{}.{} undefined (type {ty} has no field or method {})",
                            expr_string(&sel.x),
                            name.name,
                            name.name
                        );
                        self.error(name.pos, message);
                        Operand::invalid()
                    }
                }
            }
            _ => {
                self.single_value(&x, &sel.x);
                Operand::invalid()
            }
        }
    }

    // =========================================================================
    // Calls
    // =========================================================================

    fn call(&mut self, call: &CallExpr) -> Operand {
        let fun = self.expr(&call.fun);
        match fun.mode {
            Mode::Type => {
                let target = fun.ty;
                if call.args.len() != 1 {
                    let message = if call.args.is_empty() {
                        format!("missing argument in conversion to {target}")
                    } else {
                        format!("too many arguments in conversion to {target}")
                    };
                    self.error(call.span.start, message);
                    for arg in &call.args {
                        self.expr(arg);
                    }
                    return Operand::value(target);
                }
                let arg = self.rvalue(&call.args[0]);
                Operand::constant(target, arg.value)
            }
            Mode::Builtin(name) => self.builtin(call, &name),
            Mode::Value => {
                let Some(sig) = fun.ty.signature() else {
                    if !fun.ty.is_invalid() {
                        let message = format!(
                            "invalid operation: cannot call non-function {} (value of type {})",
                            expr_string(&call.fun),
                            fun.ty
                        );
                        self.error(call.span.start, message);
                    }
                    for arg in &call.args {
                        self.expr(arg);
                    }
                    return Operand::value(Type::Invalid);
                };
                self.check_args(call, &sig);
                match sig.results.as_slice() {
                    [] => Operand::mode(Mode::NoValue),
                    [single] => Operand::value(single.clone()),
                    many => Operand::value(Type::Tuple(Arc::from(many.to_vec()))),
                }
            }
            _ => {
                self.single_value(&fun, &call.fun);
                for arg in &call.args {
                    self.expr(arg);
                }
                Operand::invalid()
            }
        }
    }

    fn check_args(&mut self, call: &CallExpr, sig: &Signature) {
        let callee = expr_string(&call.fun);
        let context = format!("argument to {callee}");

        // f(g()) where g returns several values.
        if let [arg] = call.args.as_slice()
            && sig.params.len() > 1
        {
            let op = self.expr(arg);
            if let Type::Tuple(types) = &op.ty {
                if types.len() != sig.params.len() {
                    self.arg_count_error(call, &callee, types.len() < sig.params.len());
                    return;
                }
                for (ty, param) in types.iter().zip(&sig.params) {
                    if !assignable(ty, param) {
                        let message = format!("cannot use {ty} value as {param} value in {context}");
                        self.error(arg.span().start, message);
                    }
                }
                return;
            }
            let ty = self.single_value(&op, arg);
            self.assign_value(&Operand { ty, ..op }, arg, &sig.params[0], &context);
            self.arg_count_error(call, &callee, true);
            return;
        }

        for (idx, arg) in call.args.iter().enumerate() {
            let op = self.rvalue(arg);
            if let Some(param) = sig.params.get(idx) {
                self.assign_value(&op, arg, param, &context);
            }
        }
        if call.args.len() != sig.params.len() {
            self.arg_count_error(call, &callee, call.args.len() < sig.params.len());
        }
    }

    fn arg_count_error(&mut self, call: &CallExpr, callee: &str, not_enough: bool) {
        let message = if not_enough {
            format!("not enough arguments in call to {callee}")
        } else {
            format!("too many arguments in call to {callee}")
        };
        self.error(call.span.end, message);
    }

    fn builtin(&mut self, call: &CallExpr, name: &str) -> Operand {
        let int = Type::Basic(BasicKind::Int);
        let arity_error = |checker: &mut Self, expected: &str| {
            let message = format!("wrong number of arguments to {name}: expected {expected}");
            checker.error(call.span.start, message);
        };
        match name {
            "len" | "cap" => {
                if call.args.len() != 1 {
                    arity_error(self, "1");
                }
                for arg in &call.args {
                    self.rvalue(arg);
                }
                Operand::value(int)
            }
            "copy" => {
                if call.args.len() != 2 {
                    arity_error(self, "2");
                }
                for arg in &call.args {
                    self.rvalue(arg);
                }
                Operand::value(int)
            }
            "append" => {
                let Some((first, rest)) = call.args.split_first() else {
                    arity_error(self, "at least 1");
                    return Operand::invalid();
                };
                let slice = self.rvalue(first);
                let elem = match slice.ty.underlying() {
                    Type::Slice(elem) => Some((*elem).clone()),
                    _ => None,
                };
                for arg in rest {
                    let op = self.rvalue(arg);
                    if let Some(elem) = &elem {
                        self.assign_value(&op, arg, elem, "argument to append");
                    }
                }
                Operand::value(slice.ty.default_type())
            }
            "delete" => {
                if call.args.len() != 2 {
                    arity_error(self, "2");
                }
                for arg in &call.args {
                    self.rvalue(arg);
                }
                Operand::mode(Mode::NoValue)
            }
            "make" | "new" => {
                let Some((first, rest)) = call.args.split_first() else {
                    arity_error(self, "at least 1");
                    return Operand::invalid();
                };
                let ty = self.type_expr(first);
                for arg in rest {
                    self.rvalue(arg);
                }
                if name == "new" {
                    Operand::value(Type::pointer(ty))
                } else {
                    Operand::value(ty)
                }
            }
            _ => {
                for arg in &call.args {
                    self.rvalue(arg);
                }
                Operand::mode(Mode::NoValue)
            }
        }
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn unary(&mut self, unary: &UnaryExpr) -> Operand {
        let x = self.rvalue(&unary.x);
        if x.ty.is_invalid() {
            return Operand::value(Type::Invalid);
        }
        match unary.op {
            UnaryOp::Addr => Operand::value(Type::pointer(x.ty)),
            UnaryOp::Not => {
                if !x.ty.basic().is_some_and(BasicKind::is_boolean) {
                    self.bad_operand(unary.span.start, "!", &unary.x, &x.ty);
                    return Operand::invalid();
                }
                Operand::value(x.ty)
            }
            UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot => {
                if !x.ty.basic().is_some_and(BasicKind::is_numeric) {
                    let op = match unary.op {
                        UnaryOp::Neg => "-",
                        UnaryOp::Plus => "+",
                        _ => "^",
                    };
                    self.bad_operand(unary.span.start, op, &unary.x, &x.ty);
                    return Operand::invalid();
                }
                let value = x.value.and_then(|v| match unary.op {
                    UnaryOp::Neg => v.checked_neg(),
                    UnaryOp::BitNot => Some(!v),
                    _ => Some(v),
                });
                Operand::constant(x.ty, value)
            }
        }
    }

    fn bad_operand(&mut self, pos: crate::base::Pos, op: &str, expr: &Expr, ty: &Type) {
        let message = format!(
            "invalid operation: operator {op} not defined on {} (value of type {ty})",
            expr_string(expr)
        );
        self.error(pos, message);
    }

    fn binary(&mut self, binary: &BinaryExpr) -> Operand {
        let x = self.rvalue(&binary.x);
        let y = self.rvalue(&binary.y);
        if x.ty.is_invalid() || y.ty.is_invalid() {
            return Operand::value(Type::Invalid);
        }

        if binary.op.is_comparison() {
            if !assignable(&x.ty, &y.ty) && !assignable(&y.ty, &x.ty) {
                self.mismatched(binary, &x.ty, &y.ty);
                return Operand::invalid();
            }
            return Operand::value(untyped(BasicKind::UntypedBool));
        }

        if matches!(binary.op, BinaryOp::LogAnd | BinaryOp::LogOr) {
            for (op, expr) in [(&x, &binary.x), (&y, &binary.y)] {
                if !op.ty.basic().is_some_and(BasicKind::is_boolean) {
                    let sym = if binary.op == BinaryOp::LogAnd { "&&" } else { "||" };
                    self.bad_operand(expr.span().start, sym, expr, &op.ty);
                    return Operand::invalid();
                }
            }
            let ty = if x.ty.is_untyped() { y.ty } else { x.ty };
            return Operand::value(ty);
        }

        if binary.op.is_shift() {
            let value = match (x.value, y.value) {
                (Some(a), Some(b)) if (0..64).contains(&b) => match binary.op {
                    BinaryOp::Shl => a.checked_shl(b as u32),
                    _ => a.checked_shr(b as u32),
                },
                _ => None,
            };
            return Operand::constant(x.ty, value);
        }

        let ty = match (x.ty.is_untyped(), y.ty.is_untyped()) {
            (true, true) => Type::wider_untyped(&x.ty, &y.ty),
            (true, false) if assignable(&x.ty, &y.ty) => y.ty.clone(),
            (false, true) if assignable(&y.ty, &x.ty) => x.ty.clone(),
            (false, false) if identical(&x.ty, &y.ty) => x.ty.clone(),
            _ => {
                self.mismatched(binary, &x.ty, &y.ty);
                return Operand::invalid();
            }
        };

        let string_concat = binary.op == BinaryOp::Add && ty.basic().is_some_and(BasicKind::is_string);
        if !string_concat && !ty.basic().is_some_and(BasicKind::is_numeric) {
            self.bad_operand(binary.span.start, binary_op_str(binary.op), &binary.x, &ty);
            return Operand::invalid();
        }

        let value = match (x.value, y.value) {
            (Some(a), Some(b)) => {
                if matches!(binary.op, BinaryOp::Div | BinaryOp::Rem) && b == 0 {
                    self.error(binary.y.span().start, "invalid operation: division by zero");
                    return Operand::invalid();
                }
                fold(binary.op, a, b)
            }
            _ => None,
        };
        Operand::constant(ty, value)
    }

    fn mismatched(&mut self, binary: &BinaryExpr, x: &Type, y: &Type) {
        let message = format!(
            "invalid operation: {} {} {} (mismatched types {x} and {y})",
            expr_string(&binary.x),
            binary_op_str(binary.op),
            expr_string(&binary.y)
        );
        self.error(binary.span.start, message);
    }

    // =========================================================================
    // Indexing and literals
    // =========================================================================

    fn index(&mut self, index: &IndexExpr) -> Operand {
        let x = self.rvalue(&index.x);
        let key = self.rvalue(&index.index);
        if x.ty.is_invalid() {
            return Operand::value(Type::Invalid);
        }
        let under = match x.ty.underlying() {
            Type::Pointer(elem) => match elem.underlying() {
                array @ Type::Array(..) => array,
                _ => Type::Pointer(elem),
            },
            other => other,
        };
        match under {
            Type::Slice(elem) | Type::Array(_, elem) => Operand::value((*elem).clone()),
            Type::Map(k, v) => {
                self.assign_value(&key, &index.index, &k, "map index");
                Operand::value((*v).clone())
            }
            Type::Basic(kind) if kind.is_string() => Operand::value(Type::Basic(BasicKind::Uint8)),
            _ => {
                let message = format!(
                    "invalid operation: cannot index {} (value of type {})",
                    expr_string(&index.x),
                    x.ty
                );
                self.error(index.span.start, message);
                Operand::invalid()
            }
        }
    }

    fn composite_lit(&mut self, lit: &CompositeLit) -> Operand {
        let ty = self.type_expr(&lit.ty);
        let under = self.underlying_of(&ty);
        match &under {
            Type::Struct(fields) => {
                for (idx, elt) in lit.elts.iter().enumerate() {
                    if let Expr::KeyValue(kv) = elt {
                        let Some(key) = kv.key.as_ident() else {
                            self.error(kv.key.span().start, "invalid field name in struct literal");
                            self.rvalue(&kv.value);
                            continue;
                        };
                        let value = self.rvalue(&kv.value);
                        match fields.iter().find(|f| f.name() == key.name) {
                            Some(field) => {
                                self.info.record_use(key, field);
                                let context = "struct literal";
                                self.assign_value(&value, &kv.value, &field.ty(), context);
                            }
                            None => {
                                let message =
                                    format!("unknown field {} in struct literal of type {ty}", key.name);
                                self.error(key.pos, message);
                            }
                        }
                    } else {
                        let value = self.rvalue(elt);
                        match fields.get(idx) {
                            Some(field) => {
                                self.assign_value(&value, elt, &field.ty(), "struct literal")
                            }
                            None => {
                                let message = format!("too many values in struct literal of type {ty}");
                                self.error(elt.span().start, message);
                            }
                        }
                    }
                }
            }
            Type::Slice(elem) | Type::Array(_, elem) => {
                for elt in &lit.elts {
                    let (value_expr, index) = match elt {
                        Expr::KeyValue(kv) => (&kv.value, Some(&kv.key)),
                        other => (other, None),
                    };
                    if let Some(index) = index {
                        self.rvalue(index);
                    }
                    let value = self.rvalue(value_expr);
                    self.assign_value(&value, value_expr, elem, "slice literal");
                }
            }
            Type::Map(k, v) => {
                for elt in &lit.elts {
                    let Expr::KeyValue(kv) = elt else {
                        self.error(elt.span().start, "missing key in map literal");
                        self.rvalue(elt);
                        continue;
                    };
                    let key = self.rvalue(&kv.key);
                    self.assign_value(&key, &kv.key, k, "map literal");
                    let value = self.rvalue(&kv.value);
                    self.assign_value(&value, &kv.value, v, "map literal");
                }
            }
            Type::Invalid => {
                for elt in &lit.elts {
                    match elt {
                        Expr::KeyValue(kv) => self.expr(&kv.value),
                        other => self.expr(other),
                    };
                }
            }
            _ => {
                self.error(lit.ty.span().start, format!("invalid composite literal type {ty}"));
            }
        }
        Operand::value(ty)
    }
}

fn basic_lit(lit: &BasicLit) -> Operand {
    match lit.kind {
        LitKind::Int => Operand::constant(untyped(BasicKind::UntypedInt), lit.int_value()),
        LitKind::Float => Operand::value(untyped(BasicKind::UntypedFloat)),
        LitKind::Char => Operand::constant(untyped(BasicKind::UntypedRune), char_value(&lit.value)),
        LitKind::String => Operand::value(untyped(BasicKind::UntypedString)),
    }
}

fn char_value(text: &str) -> Option<i64> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    let c = match chars.next()? {
        '\\' => match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            other => other,
        },
        c => c,
    };
    Some(c as i64)
}

fn fold(op: BinaryOp, a: i64, b: i64) -> Option<i64> {
    match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Rem => a.checked_rem(b),
        BinaryOp::Or => Some(a | b),
        BinaryOp::Xor => Some(a ^ b),
        BinaryOp::And => Some(a & b),
        BinaryOp::AndNot => Some(a & !b),
        _ => None,
    }
}

fn binary_op_str(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::LogOr => "||",
        BinaryOp::LogAnd => "&&",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Or => "|",
        BinaryOp::Xor => "^",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
        BinaryOp::And => "&",
        BinaryOp::AndNot => "&^",
    }
}

/// Short source-like rendering of an expression for diagnostics.
pub(super) fn expr_string(expr: &Expr) -> String {
    match expr {
        Expr::Ident(ident) => ident.name.to_string(),
        Expr::BasicLit(lit) => lit.value.to_string(),
        Expr::Selector(sel) => format!("{}.{}", expr_string(&sel.x), sel.sel.name),
        Expr::Call(call) => {
            let args: Vec<String> = call.args.iter().map(expr_string).collect();
            format!("{}({})", expr_string(&call.fun), args.join(", "))
        }
        Expr::Star(star) => format!("*{}", expr_string(&star.x)),
        Expr::Unary(unary) => {
            let op = match unary.op {
                UnaryOp::Neg => "-",
                UnaryOp::Plus => "+",
                UnaryOp::Not => "!",
                UnaryOp::BitNot => "^",
                UnaryOp::Addr => "&",
            };
            format!("{op}{}", expr_string(&unary.x))
        }
        Expr::Binary(binary) => format!(
            "{} {} {}",
            expr_string(&binary.x),
            binary_op_str(binary.op),
            expr_string(&binary.y)
        ),
        Expr::Paren(paren) => format!("({})", expr_string(&paren.x)),
        Expr::TypeAssert(assert) => match &assert.ty {
            Some(ty) => format!("{}.({})", expr_string(&assert.x), expr_string(ty)),
            None => format!("{}.(type)", expr_string(&assert.x)),
        },
        Expr::Index(index) => format!("{}[{}]", expr_string(&index.x), expr_string(&index.index)),
        Expr::CompositeLit(lit) => format!("{}{{...}}", expr_string(&lit.ty)),
        Expr::KeyValue(kv) => format!("{}: {}", expr_string(&kv.key), expr_string(&kv.value)),
        Expr::FuncLit(_) => "func literal".to_string(),
        Expr::ArrayType(array) => match &array.len {
            Some(len) => format!("[{}]{}", expr_string(len), expr_string(&array.elem)),
            None => format!("[]{}", expr_string(&array.elem)),
        },
        Expr::MapType(map) => format!("map[{}]{}", expr_string(&map.key), expr_string(&map.value)),
        Expr::StructType(_) => "struct{...}".to_string(),
        Expr::InterfaceType(_) => "interface{...}".to_string(),
        Expr::FuncType(_) => "func(...)".to_string(),
    }
}
