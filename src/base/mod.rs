//! Foundation types for pkgscope.
//!
//! - [`Pos`], [`Span`] - compact positions inside one file set
//! - [`FileSet`], [`FileEntry`] - coordinate spaces and their files
//! - [`Position`] - file/line/column for display
//!
//! This module has NO dependencies on other pkgscope modules.

mod position;

pub use position::{FileEntry, FileSet, Pos, Position, SpaceId, Span};
