//! Locating and parsing packages on disk.
//!
//! - [`LoadConfig`] - source roots, working directory and build context
//! - [`discover`] - pattern matching and directory parsing into
//!   [`RawPackage`]s
//! - [`Preprocessor`] - the foreign-interop rewriting step
//! - [`SourceImporter`] - checks imported packages straight from source

mod config;
mod discover;
mod importer;
pub mod pattern;
mod preprocess;

pub use config::{DEFAULT_RESERVED_DIRS, LoadConfig};
pub use discover::{Discovery, RawPackage, discover, parse_dir};
pub use importer::{DirOverrideImporter, SourceImporter, import_candidates};
pub use pattern::{Pattern, PatternMatcher, Variant, is_local};
pub use preprocess::{
    CommandPreprocessor, FOREIGN_TYPES_DISPLAY, PreprocessError, PreprocessRequest,
    PreprocessedFile, Preprocessor, rewritten_name,
};
