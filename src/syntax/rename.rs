//! In-place renaming of identifiers.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::ast::{
    Block, CaseClause, Decl, Expr, Field, FuncType, GenDecl, Ident, SourceFile, Spec, Stmt,
};

/// Rename every identifier of `file` that can denote a top-level name.
///
/// Member names are left alone: selectors (`x.name`), struct and interface
/// fields, composite literal keys and method declaration names. Returns the
/// number of identifiers renamed.
pub fn rename_idents(file: &mut SourceFile, renames: &FxHashMap<SmolStr, SmolStr>) -> usize {
    if renames.is_empty() {
        return 0;
    }
    let mut renamer = Renamer { renames, count: 0 };
    for decl in &mut file.decls {
        match decl {
            Decl::Gen(gen_decl) => renamer.gen_decl(gen_decl),
            Decl::Func(func) => {
                if let Some(recv) = &mut func.recv {
                    renamer.field(recv);
                }
                if func.recv.is_none() {
                    renamer.ident(&mut func.name);
                }
                renamer.func_type(&mut func.ty);
                if let Some(body) = &mut func.body {
                    renamer.block(body);
                }
            }
        }
    }
    renamer.count
}

struct Renamer<'r> {
    renames: &'r FxHashMap<SmolStr, SmolStr>,
    count: usize,
}

impl Renamer<'_> {
    fn ident(&mut self, ident: &mut Ident) {
        if let Some(new) = self.renames.get(&ident.name) {
            ident.name = new.clone();
            self.count += 1;
        }
    }

    fn gen_decl(&mut self, decl: &mut GenDecl) {
        for spec in &mut decl.specs {
            match spec {
                Spec::Import(_) => {}
                Spec::Value(spec) => {
                    spec.names.iter_mut().for_each(|n| self.ident(n));
                    if let Some(ty) = &mut spec.ty {
                        self.expr(ty);
                    }
                    spec.values.iter_mut().for_each(|v| self.expr(v));
                }
                Spec::Type(spec) => {
                    self.ident(&mut spec.name);
                    self.expr(&mut spec.ty);
                }
            }
        }
    }

    fn field(&mut self, field: &mut Field) {
        field.names.iter_mut().for_each(|n| self.ident(n));
        self.expr(&mut field.ty);
    }

    /// Struct fields and interface methods: only the types.
    fn member(&mut self, field: &mut Field) {
        self.expr(&mut field.ty);
    }

    fn func_type(&mut self, ty: &mut FuncType) {
        ty.params.iter_mut().for_each(|f| self.field(f));
        ty.results.iter_mut().for_each(|f| self.field(f));
    }

    fn block(&mut self, block: &mut Block) {
        block.stmts.iter_mut().for_each(|s| self.stmt(s));
    }

    fn clause(&mut self, clause: &mut CaseClause) {
        clause.list.iter_mut().for_each(|e| self.expr(e));
        clause.body.iter_mut().for_each(|s| self.stmt(s));
    }

    fn stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Decl(s) => self.gen_decl(&mut s.decl),
            Stmt::Assign(s) => {
                s.lhs.iter_mut().for_each(|e| self.expr(e));
                s.rhs.iter_mut().for_each(|e| self.expr(e));
            }
            Stmt::Expr(s) => self.expr(&mut s.x),
            Stmt::IncDec(s) => self.expr(&mut s.x),
            Stmt::Return(s) => s.results.iter_mut().for_each(|e| self.expr(e)),
            Stmt::Block(b) => self.block(b),
            Stmt::If(s) => {
                if let Some(init) = &mut s.init {
                    self.stmt(init);
                }
                self.expr(&mut s.cond);
                self.block(&mut s.body);
                if let Some(els) = &mut s.els {
                    self.stmt(els);
                }
            }
            Stmt::For(s) => {
                if let Some(init) = &mut s.init {
                    self.stmt(init);
                }
                if let Some(cond) = &mut s.cond {
                    self.expr(cond);
                }
                if let Some(post) = &mut s.post {
                    self.stmt(post);
                }
                self.block(&mut s.body);
            }
            Stmt::Switch(s) => {
                if let Some(init) = &mut s.init {
                    self.stmt(init);
                }
                if let Some(tag) = &mut s.tag {
                    self.expr(tag);
                }
                s.clauses.iter_mut().for_each(|c| self.clause(c));
            }
            Stmt::TypeSwitch(s) => {
                if let Some(init) = &mut s.init {
                    self.stmt(init);
                }
                if let Some(binding) = &mut s.binding {
                    self.ident(binding);
                }
                self.expr(&mut s.guard);
                s.clauses.iter_mut().for_each(|c| self.clause(c));
            }
            Stmt::Deferred(s) => self.expr(&mut s.call),
            Stmt::Branch(_) => {}
        }
    }

    fn expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::Ident(ident) => self.ident(ident),
            Expr::BasicLit(_) => {}
            Expr::Selector(e) => self.expr(&mut e.x),
            Expr::Call(e) => {
                self.expr(&mut e.fun);
                e.args.iter_mut().for_each(|a| self.expr(a));
            }
            Expr::Star(e) => self.expr(&mut e.x),
            Expr::Unary(e) => self.expr(&mut e.x),
            Expr::Binary(e) => {
                self.expr(&mut e.x);
                self.expr(&mut e.y);
            }
            Expr::Paren(e) => self.expr(&mut e.x),
            Expr::TypeAssert(e) => {
                self.expr(&mut e.x);
                if let Some(ty) = &mut e.ty {
                    self.expr(ty);
                }
            }
            Expr::Index(e) => {
                self.expr(&mut e.x);
                self.expr(&mut e.index);
            }
            Expr::CompositeLit(e) => {
                self.expr(&mut e.ty);
                // Map keys and array indexes are expressions; other keys
                // name struct fields.
                let keys_are_values = matches!(e.ty, Expr::MapType(_) | Expr::ArrayType(_));
                for elt in &mut e.elts {
                    match elt {
                        Expr::KeyValue(kv) if !keys_are_values && matches!(kv.key, Expr::Ident(_)) => {
                            self.expr(&mut kv.value)
                        }
                        other => self.expr(other),
                    }
                }
            }
            Expr::KeyValue(e) => {
                self.expr(&mut e.key);
                self.expr(&mut e.value);
            }
            Expr::FuncLit(e) => {
                self.func_type(&mut e.ty);
                self.block(&mut e.body);
            }
            Expr::ArrayType(e) => {
                if let Some(len) = &mut e.len {
                    self.expr(len);
                }
                self.expr(&mut e.elem);
            }
            Expr::MapType(e) => {
                self.expr(&mut e.key);
                self.expr(&mut e.value);
            }
            Expr::StructType(e) => e.fields.iter_mut().for_each(|f| self.member(f)),
            Expr::InterfaceType(e) => e.methods.iter_mut().for_each(|f| self.member(f)),
            Expr::FuncType(e) => self.func_type(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileSet;
    use crate::parser::parse_file;
    use crate::syntax::{Node, walk_all};

    fn names(file: &SourceFile) -> Vec<String> {
        let pkg = crate::syntax::PackageSyntax::new("p", vec![file.clone()]);
        let mut out = Vec::new();
        walk_all(Node::Package(&pkg), |node, _| {
            if let Some(ident) = node.as_ident() {
                out.push(ident.name.to_string());
            }
        });
        out
    }

    #[test]
    fn test_members_are_kept() {
        let fset = FileSet::new();
        let mut file = parse_file(
            &fset,
            "p.go",
            "package p\n\ntype shared struct{ shared int }\n\nfunc (s shared) shared() shared {\n\treturn shared{shared: s.shared}\n}\n",
        )
        .unwrap();
        let renames = FxHashMap::from_iter([(SmolStr::new("shared"), SmolStr::new("shared_nobuild1"))]);
        let count = rename_idents(&mut file, &renames);
        assert_eq!(count, 4);
        let all = names(&file);
        assert_eq!(all.iter().filter(|n| *n == "shared_nobuild1").count(), 4);
        // field decl, method name, literal key, selector
        assert_eq!(all.iter().filter(|n| *n == "shared").count(), 4);
    }

    #[test]
    fn test_map_keys_and_array_indexes_are_renamed() {
        let fset = FileSet::new();
        let mut file = parse_file(
            &fset,
            "p.go",
            "package p\n\nconst shared = 1\n\nvar m = map[int]string{shared: \"a\"}\n\nvar a = [2]int{shared: 5}\n",
        )
        .unwrap();
        let renames = FxHashMap::from_iter([(SmolStr::new("shared"), SmolStr::new("shared_nobuild1"))]);
        assert_eq!(rename_idents(&mut file, &renames), 3);
        assert!(!names(&file).iter().any(|n| n == "shared"));
    }
}
