//! Host-language syntax tree.
//!
//! - [`ast`] - the closed set of node structs, each with a [`NodeId`]
//! - [`Node`] - borrowed view used by every traversal
//! - [`walk`], [`find_ancestors`], [`path_enclosing_interval`], [`next_stmt`]
//! - [`rename_idents`] - in-place renaming of top-level names

pub mod ast;
mod node;
mod rename;
mod walk;

pub use ast::{NodeId, PackageSyntax, SourceFile};
pub use node::Node;
pub use rename::rename_idents;
pub use walk::{
    Ancestors, EnclosingPath, Visit, find_ancestors, next_stmt, path_enclosing_interval, walk,
    walk_all,
};
