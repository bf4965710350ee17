//! # pkgscope
//!
//! Package discovery, tag-aware type checking and symbol lifetime queries
//! for writing custom static-analysis checks.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide       → lookups, invocations, declaration jumps, snippet checks
//!   ↓
//! hir       → load scheduling, checked packages, lifetime index, cache
//!   ↓
//! project   → patterns, discovery, preprocessing, source imports
//!   ↓
//! analyzer  → symbols, types, the bundled checker
//!   ↓
//! syntax    → syntax tree, traversal, renaming
//!   ↓
//! parser    → logos lexer, recursive-descent parser, build constraints
//!   ↓
//! base      → positions and file sets
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → syntax → analyzer → project → hir → ide)
// ============================================================================

/// Foundation types: Pos, Span, FileSet, Position
pub mod base;

/// Parser: logos lexer, recursive-descent parser, build constraints
pub mod parser;

/// Syntax: AST types, traversal with ancestors, renaming
pub mod syntax;

/// Semantic analysis of one package behind the analyzer and importer seams
pub mod analyzer;

/// Locating, parsing and preprocessing packages on disk
pub mod project;

/// Checked packages, import-ordered scheduling and the package cache
pub mod hir;

/// Queries over checked packages
pub mod ide;

mod error;

pub use error::{LoadError, LookupError, QueryError};

pub use analyzer::{HostChecker, ImportResolver, SemanticAnalyzer, Symbol, SymbolKind, Type};
pub use base::{FileSet, Pos, Position, Span};
pub use hir::{Lifetime, Loader, PackageCache, Packages, ResolvedPackage};
pub use ide::{CheckFinding, Declaration, Invocation, StaticCheck};
pub use parser::BuildContext;
pub use project::{LoadConfig, Preprocessor};
pub use syntax::{Ancestors, Node};
