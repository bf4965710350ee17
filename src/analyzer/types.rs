//! Type model used by the analyzer.

use std::fmt;
use std::sync::Arc;

use super::symbol::{Symbol, SymbolKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    String,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::String => "string",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
                | BasicKind::UntypedFloat
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    }

    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            BasicKind::Bool
                | BasicKind::String
                | BasicKind::UntypedBool
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, BasicKind::Bool | BasicKind::UntypedBool)
    }

    pub fn is_string(self) -> bool {
        matches!(self, BasicKind::String | BasicKind::UntypedString)
    }

    fn untyped_rank(self) -> u8 {
        match self {
            BasicKind::UntypedInt => 1,
            BasicKind::UntypedRune => 2,
            BasicKind::UntypedFloat => 3,
            _ => 0,
        }
    }
}

/// A function signature with flattened parameter and result lists.
#[derive(Debug, Clone)]
pub struct Signature {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
}

#[derive(Debug, Clone, Default)]
pub enum Type {
    /// The type of anything that failed to resolve.
    #[default]
    Invalid,
    Basic(BasicKind),
    /// A defined type; the symbol is its type name.
    Named(Symbol),
    Pointer(Arc<Type>),
    Slice(Arc<Type>),
    Array(u64, Arc<Type>),
    Map(Arc<Type>, Arc<Type>),
    /// Fields, as field symbols.
    Struct(Arc<[Symbol]>),
    /// Method set, embedded interfaces already flattened.
    Interface(Arc<[Symbol]>),
    Signature(Arc<Signature>),
    /// Multiple results of a call.
    Tuple(Arc<[Type]>),
}

impl Type {
    pub fn pointer(elem: Type) -> Type {
        Type::Pointer(Arc::new(elem))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Invalid)
    }

    pub fn underlying(&self) -> Type {
        match self {
            Type::Named(sym) => sym.underlying(),
            other => other.clone(),
        }
    }

    pub fn as_named(&self) -> Option<&Symbol> {
        match self {
            Type::Named(sym) => Some(sym),
            _ => None,
        }
    }

    /// The pointed-to type, when this is a pointer.
    pub fn pointee(&self) -> Option<Type> {
        match self.underlying() {
            Type::Pointer(elem) => Some((*elem).clone()),
            _ => None,
        }
    }

    pub fn basic(&self) -> Option<BasicKind> {
        match self.underlying() {
            Type::Basic(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, Type::Basic(kind) if kind.is_untyped())
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.underlying(), Type::Interface(_))
    }

    pub fn signature(&self) -> Option<Arc<Signature>> {
        match self.underlying() {
            Type::Signature(sig) => Some(sig),
            _ => None,
        }
    }

    /// The typed default of an untyped constant type.
    pub fn default_type(&self) -> Type {
        match self {
            Type::Basic(BasicKind::UntypedBool) => Type::Basic(BasicKind::Bool),
            Type::Basic(BasicKind::UntypedInt) => Type::Basic(BasicKind::Int),
            Type::Basic(BasicKind::UntypedRune) => Type::Basic(BasicKind::Int32),
            Type::Basic(BasicKind::UntypedFloat) => Type::Basic(BasicKind::Float64),
            Type::Basic(BasicKind::UntypedString) => Type::Basic(BasicKind::String),
            other => other.clone(),
        }
    }

    /// The larger of two untyped numeric kinds.
    pub(crate) fn wider_untyped(a: &Type, b: &Type) -> Type {
        match (a, b) {
            (Type::Basic(x), Type::Basic(y)) if x.untyped_rank() >= y.untyped_rank() => a.clone(),
            _ => b.clone(),
        }
    }
}

/// Structural type identity; named types are identical only to themselves.
pub fn identical(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::Invalid, Type::Invalid) => true,
        (Type::Basic(x), Type::Basic(y)) => x == y,
        (Type::Named(x), Type::Named(y)) => x == y,
        (Type::Pointer(x), Type::Pointer(y)) | (Type::Slice(x), Type::Slice(y)) => identical(x, y),
        (Type::Array(n, x), Type::Array(m, y)) => n == m && identical(x, y),
        (Type::Map(k1, v1), Type::Map(k2, v2)) => identical(k1, k2) && identical(v1, v2),
        (Type::Struct(f1), Type::Struct(f2)) => {
            f1.len() == f2.len()
                && f1.iter().zip(f2.iter()).all(|(x, y)| {
                    x.name() == y.name()
                        && x.is_embedded() == y.is_embedded()
                        && identical(&x.ty(), &y.ty())
                })
        }
        (Type::Interface(m1), Type::Interface(m2)) => {
            m1.len() == m2.len()
                && m1.iter().all(|x| {
                    m2.iter()
                        .any(|y| x.name() == y.name() && identical(&x.ty(), &y.ty()))
                })
        }
        (Type::Signature(s1), Type::Signature(s2)) => {
            s1.params.len() == s2.params.len()
                && s1.results.len() == s2.results.len()
                && s1.params.iter().zip(&s2.params).all(|(x, y)| identical(x, y))
                && s1.results.iter().zip(&s2.results).all(|(x, y)| identical(x, y))
        }
        (Type::Tuple(t1), Type::Tuple(t2)) => {
            t1.len() == t2.len() && t1.iter().zip(t2.iter()).all(|(x, y)| identical(x, y))
        }
        _ => false,
    }
}

/// Whether a value of type `value` may be assigned to `target`.
///
/// Invalid types are assignable both ways so one resolution failure does not
/// cascade into more diagnostics.
pub fn assignable(value: &Type, target: &Type) -> bool {
    if value.is_invalid() || target.is_invalid() || identical(value, target) {
        return true;
    }
    let target_under = target.underlying();
    if let Type::Basic(kind) = value
        && kind.is_untyped()
    {
        return match (kind, &target_under) {
            (BasicKind::UntypedNil, under) => matches!(
                under,
                Type::Pointer(_)
                    | Type::Slice(_)
                    | Type::Map(..)
                    | Type::Interface(_)
                    | Type::Signature(_)
            ),
            (_, Type::Interface(methods)) => methods.is_empty(),
            (BasicKind::UntypedBool, Type::Basic(t)) => t.is_boolean(),
            (BasicKind::UntypedString, Type::Basic(t)) => t.is_string(),
            (_, Type::Basic(t)) => t.is_numeric(),
            _ => false,
        };
    }
    if let Type::Interface(methods) = &target_under {
        return implements(value, methods);
    }
    // Identical underlying types where at least one side is unnamed.
    let value_named = matches!(value, Type::Named(_));
    let target_named = matches!(target, Type::Named(_));
    (!value_named || !target_named) && identical(&value.underlying(), &target_under)
}

/// Whether `ty` has every method in `methods` (matched by name).
pub fn implements(ty: &Type, methods: &[Symbol]) -> bool {
    methods
        .iter()
        .all(|m| lookup_field_or_method(ty, m.name()).is_some_and(|found| found.is_func()))
}

/// Field or method `name` of `ty`, following pointers and embedded fields.
pub fn lookup_field_or_method(ty: &Type, name: &str) -> Option<Symbol> {
    lookup_in(ty, name, 0)
}

const MAX_EMBEDDING_DEPTH: usize = 8;

fn lookup_in(ty: &Type, name: &str, depth: usize) -> Option<Symbol> {
    if depth > MAX_EMBEDDING_DEPTH {
        return None;
    }
    let base = match ty {
        Type::Pointer(elem) => (**elem).clone(),
        other => other.clone(),
    };
    if let Type::Named(sym) = &base {
        if let Some(method) = sym.method(name) {
            return Some(method);
        }
        if let Some(target) = sym.is_alias().then(|| sym.ty()) {
            return lookup_in(&target, name, depth + 1);
        }
    }
    match base.underlying() {
        Type::Struct(fields) => {
            if let Some(field) = fields.iter().find(|f| f.name() == name) {
                return Some(field.clone());
            }
            fields
                .iter()
                .filter(|f| f.is_embedded())
                .find_map(|f| lookup_in(&f.ty(), name, depth + 1))
        }
        Type::Interface(methods) => methods.iter().find(|m| m.name() == name).cloned(),
        _ => None,
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        identical(self, other)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (idx, ty) in types.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

fn write_signature(f: &mut fmt::Formatter<'_>, sig: &Signature) -> fmt::Result {
    write!(f, "(")?;
    write_list(f, &sig.params)?;
    write!(f, ")")?;
    match sig.results.as_slice() {
        [] => Ok(()),
        [single] => write!(f, " {single}"),
        many => {
            write!(f, " (")?;
            write_list(f, many)?;
            write!(f, ")")
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Invalid => write!(f, "invalid type"),
            Type::Basic(kind) => write!(f, "{}", kind.name()),
            Type::Named(sym) => match sym.package() {
                Some(package) if sym.kind() == SymbolKind::TypeName => {
                    write!(f, "{package}.{}", sym.name())
                }
                _ => write!(f, "{}", sym.name()),
            },
            Type::Pointer(elem) => write!(f, "*{elem}"),
            Type::Slice(elem) => write!(f, "[]{elem}"),
            Type::Array(len, elem) => write!(f, "[{len}]{elem}"),
            Type::Map(key, value) => write!(f, "map[{key}]{value}"),
            Type::Struct(fields) => {
                write!(f, "struct{{")?;
                for (idx, field) in fields.iter().enumerate() {
                    if idx > 0 {
                        write!(f, "; ")?;
                    }
                    if field.is_embedded() {
                        write!(f, "{}", field.ty())?;
                    } else {
                        write!(f, "{} {}", field.name(), field.ty())?;
                    }
                }
                write!(f, "}}")
            }
            Type::Interface(methods) => {
                write!(f, "interface{{")?;
                for (idx, method) in methods.iter().enumerate() {
                    if idx > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", method.name())?;
                    if let Type::Signature(sig) = method.ty() {
                        write_signature(f, &sig)?;
                    }
                }
                write!(f, "}}")
            }
            Type::Signature(sig) => {
                write!(f, "func")?;
                write_signature(f, sig)
            }
            Type::Tuple(types) => {
                write!(f, "(")?;
                write_list(f, types)?;
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::universe::universe;

    fn int() -> Type {
        Type::Basic(BasicKind::Int)
    }

    #[test]
    fn test_display() {
        let ty = Type::Map(
            Arc::new(Type::Basic(BasicKind::String)),
            Arc::new(Type::Slice(Arc::new(Type::pointer(int())))),
        );
        assert_eq!(ty.to_string(), "map[string][]*int");
        let sig = Type::Signature(Arc::new(Signature {
            params: vec![int(), int()],
            results: vec![int(), universe().error_type()],
        }));
        assert_eq!(sig.to_string(), "func(int, int) (int, error)");
    }

    #[test]
    fn test_untyped_assignability() {
        let untyped_int = Type::Basic(BasicKind::UntypedInt);
        assert!(assignable(&untyped_int, &int()));
        assert!(assignable(&untyped_int, &Type::Basic(BasicKind::Float64)));
        assert!(!assignable(&untyped_int, &Type::Basic(BasicKind::String)));
        let nil = Type::Basic(BasicKind::UntypedNil);
        assert!(assignable(&nil, &Type::pointer(int())));
        assert!(!assignable(&nil, &int()));
    }

    #[test]
    fn test_error_interface_lookup() {
        let error = universe().error_type();
        let method = lookup_field_or_method(&error, "Error").unwrap();
        assert!(method.is_func());
        assert_eq!(method.ty().to_string(), "func() string");
        assert!(lookup_field_or_method(&error, "Missing").is_none());
    }

    #[test]
    fn test_default_types() {
        assert_eq!(Type::Basic(BasicKind::UntypedRune).default_type().to_string(), "int32");
        assert_eq!(Type::Basic(BasicKind::UntypedFloat).default_type().to_string(), "float64");
    }
}
