//! Predeclared identifiers.

use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;

use super::symbol::{Symbol, SymbolFlags, SymbolKind};
use super::types::{BasicKind, Signature, Type};

/// The outermost scope: predeclared types, constants and builtins.
pub struct Universe {
    scope: IndexMap<&'static str, Symbol>,
    error: Symbol,
}

static UNIVERSE: LazyLock<Universe> = LazyLock::new(Universe::build);

pub fn universe() -> &'static Universe {
    &UNIVERSE
}

const BASIC_TYPES: &[(&str, BasicKind)] = &[
    ("bool", BasicKind::Bool),
    ("int", BasicKind::Int),
    ("int8", BasicKind::Int8),
    ("int16", BasicKind::Int16),
    ("int32", BasicKind::Int32),
    ("int64", BasicKind::Int64),
    ("uint", BasicKind::Uint),
    ("uint8", BasicKind::Uint8),
    ("uint16", BasicKind::Uint16),
    ("uint32", BasicKind::Uint32),
    ("uint64", BasicKind::Uint64),
    ("uintptr", BasicKind::Uintptr),
    ("float32", BasicKind::Float32),
    ("float64", BasicKind::Float64),
    ("string", BasicKind::String),
];

const BUILTINS: &[&str] = &[
    "append", "cap", "copy", "delete", "len", "make", "new", "panic", "print", "println",
];

fn predeclared(kind: SymbolKind, name: &str, flags: SymbolFlags) -> Symbol {
    Symbol::new(kind, name, None, None, flags)
}

impl Universe {
    fn build() -> Self {
        let mut scope = IndexMap::new();
        let alias = SymbolFlags {
            alias: true,
            ..SymbolFlags::default()
        };

        for &(name, kind) in BASIC_TYPES {
            let sym = predeclared(SymbolKind::TypeName, name, alias).with_type(Type::Basic(kind));
            scope.insert(name, sym);
        }
        scope.insert(
            "byte",
            predeclared(SymbolKind::TypeName, "byte", alias).with_type(Type::Basic(BasicKind::Uint8)),
        );
        scope.insert(
            "rune",
            predeclared(SymbolKind::TypeName, "rune", alias).with_type(Type::Basic(BasicKind::Int32)),
        );
        scope.insert(
            "any",
            predeclared(SymbolKind::TypeName, "any", alias)
                .with_type(Type::Interface(Arc::from(Vec::new()))),
        );

        let error = predeclared(SymbolKind::TypeName, "error", SymbolFlags::default());
        let error_method = predeclared(SymbolKind::Func, "Error", SymbolFlags::default()).with_type(
            Type::Signature(Arc::new(Signature {
                params: Vec::new(),
                results: vec![Type::Basic(BasicKind::String)],
            })),
        );
        error.set_underlying(Type::Interface(Arc::from(vec![error_method])));
        scope.insert("error", error.clone());

        for name in ["true", "false"] {
            let sym = predeclared(SymbolKind::Const, name, SymbolFlags::default())
                .with_type(Type::Basic(BasicKind::UntypedBool));
            scope.insert(name, sym);
        }
        let iota = predeclared(SymbolKind::Const, "iota", SymbolFlags::default())
            .with_type(Type::Basic(BasicKind::UntypedInt));
        scope.insert("iota", iota);
        scope.insert(
            "nil",
            predeclared(SymbolKind::Nil, "nil", SymbolFlags::default())
                .with_type(Type::Basic(BasicKind::UntypedNil)),
        );

        for &name in BUILTINS {
            scope.insert(
                name,
                predeclared(SymbolKind::Builtin, name, SymbolFlags::default()),
            );
        }

        Self { scope, error }
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scope.get(name)
    }

    pub fn error_type(&self) -> Type {
        self.error.ty()
    }

    pub fn is_iota(&self, sym: &Symbol) -> bool {
        self.scope.get("iota") == Some(sym)
    }
}
