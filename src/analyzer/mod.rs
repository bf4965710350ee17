//! Semantic analysis of one package.
//!
//! The loader drives analysis through two seams:
//!
//! - [`SemanticAnalyzer`] checks a set of files and reports diagnostics to a
//!   sink, marking the ones it can recover from as *soft*
//! - [`ImportResolver`] hands out the scopes of already checked packages
//!
//! [`HostChecker`] is the bundled analyzer for the host language.

mod checker;
mod scope;
mod symbol;
mod types;
mod universe;

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::base::{FileSet, Pos};
use crate::syntax::SourceFile;

pub use checker::HostChecker;
pub use scope::{IdentRef, PackageScope, TypeInfo};
pub use symbol::{Origin, Symbol, SymbolKind};
pub use types::{
    BasicKind, Signature, Type, assignable, identical, implements, lookup_field_or_method,
};
pub use universe::{Universe, universe};

/// One message from the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Diagnostic {
    pub pos: Pos,
    pub message: String,
    /// The analyzer recovered and the result is still complete.
    pub soft: bool,
}

impl Diagnostic {
    pub fn hard(pos: Pos, message: impl Into<String>) -> Self {
        Self {
            pos,
            message: message.into(),
            soft: false,
        }
    }

    pub fn soft(pos: Pos, message: impl Into<String>) -> Self {
        Self {
            pos,
            message: message.into(),
            soft: true,
        }
    }
}

/// Why an import could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("cannot find package \"{0}\"")]
    NotFound(String),

    #[error("import cycle through \"{0}\"")]
    Cycle(String),

    #[error("package \"{path}\" has errors: {message}")]
    Broken { path: String, message: String },
}

impl ImportError {
    pub fn broken(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Broken {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Resolves import paths to checked package scopes. Shared between worker
/// threads.
pub trait ImportResolver: Send + Sync {
    /// Scope of the package imported as `path` from a file in `src_dir`.
    fn import(&self, path: &str, src_dir: Option<&Path>) -> Result<Arc<PackageScope>, ImportError>;
}

/// Input of one analysis run.
pub struct CheckRequest<'r> {
    /// Import path the package is checked as.
    pub path: &'r str,
    /// Directory holding the files, for relative import resolution.
    pub dir: Option<&'r Path>,
    /// Files in checking order.
    pub files: Vec<&'r SourceFile>,
    pub fset: &'r Arc<FileSet>,
    pub importer: &'r dyn ImportResolver,
    /// Resolve the foreign-interop package to a stand-in accepting any name.
    pub fake_foreign_imports: bool,
}

/// Output of one analysis run.
#[derive(Debug)]
pub struct Analysis {
    pub scope: Arc<PackageScope>,
    pub info: TypeInfo,
}

pub trait SemanticAnalyzer: Send + Sync {
    /// Check the requested files. Every problem goes to `sink`; the result
    /// is returned even when hard diagnostics were reported.
    fn check(&self, request: CheckRequest<'_>, sink: &mut dyn FnMut(Diagnostic)) -> Analysis;

    /// Evaluate a standalone type expression such as `[10]int`.
    fn eval_type(&self, src: &str, importer: &dyn ImportResolver) -> Result<Type, Diagnostic>;
}
