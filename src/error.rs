//! Error types for loading and querying packages.

use std::path::PathBuf;

use thiserror::Error;

use crate::base::Position;
use crate::parser::ParseError;
use crate::project::PreprocessError;

/// Errors that abort a load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Two distinct non-test package names with buildable files in one
    /// directory.
    #[error("more than one package declared in {} ({first} and {second})", dir.display())]
    AmbiguousPackage {
        dir: PathBuf,
        first: String,
        second: String,
    },

    #[error("more than one _test package in {}", dir.display())]
    MultipleTestPackages { dir: PathBuf },

    #[error("no packages found for {0}")]
    NoMatch(String),

    #[error("could not find package {0}")]
    PackageNotFound(String),

    /// A package imports the foreign-interop package but no preprocessor is
    /// configured.
    #[error("package {0} needs a preprocessor but none is configured")]
    MissingPreprocessor(String),

    #[error("preprocessing {identity} failed: {source}")]
    Preprocessor {
        identity: String,
        #[source]
        source: PreprocessError,
    },

    #[error("error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing {0}")]
    Parse(#[from] ParseError),

    /// A hard diagnostic in a buildable file.
    #[error("type checker error in {identity}: {position}: {message}")]
    Analysis {
        identity: String,
        position: Position,
        message: String,
    },
}

impl LoadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn preprocessor(identity: impl Into<String>, source: PreprocessError) -> Self {
        Self::Preprocessor {
            identity: identity.into(),
            source,
        }
    }
}

/// A type or object specifier that does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("invalid specifier {0}")]
    InvalidSpecifier(String),

    #[error("error importing {path}: {message}")]
    Import { path: String, message: String },

    #[error("no such {kind} {spec}")]
    NotFound { kind: &'static str, spec: String },

    #[error("{0} is not a type name")]
    NotAType(String),

    #[error("could not find {member:?} on {owner}")]
    NoMember { member: String, owner: String },

    #[error("error evaluating type expression {spec:?}: {message}")]
    Eval { spec: String, message: String },
}

impl LookupError {
    pub fn not_found(kind: &'static str, spec: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            spec: spec.into(),
        }
    }
}

/// Misuse of the navigation API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("node not found in package {0}")]
    NodeNotFound(String),

    #[error("{0} is not a function")]
    NotAFunction(String),

    #[error("couldn't find exact node for {0}")]
    NoExactNode(String),

    #[error("no declaration recorded for {0}")]
    NoDeclaration(String),

    #[error("package {path} for {symbol} could not be loaded: {message}")]
    OwnerNotLoaded {
        path: String,
        symbol: String,
        message: String,
    },
}
