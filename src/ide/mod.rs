//! Queries over checked packages.
//!
//! Everything here is an inherent method on [`ResolvedPackage`] or
//! [`Loader`]:
//!
//! - `lookup_type` / `lookup_object` - resolve `path.Name` specifiers
//! - `ancestors_of` / `invocations_of` - walk the syntax tree
//! - `decl_of` - jump to a declaration, loading its package if needed
//! - `eval_package` / `eval_test` - check a code snippet
//!
//! ## Usage
//!
//! ```ignore
//! let loader = Loader::new(LoadConfig::from_env());
//! let pkgs = loader.load(&["example.com/app/..."])?;
//! let close = pkgs[0].lookup_object("io.Closer.Close")?;
//! for call in pkgs[0].invocations_of(&close)? {
//!     println!("{} args", call.args.len());
//! }
//! ```
//!
//! [`ResolvedPackage`]: crate::hir::ResolvedPackage
//! [`Loader`]: crate::hir::Loader

mod decl;
mod eval;
mod lookup;
mod navigate;

pub use crate::syntax::next_stmt;
pub use decl::Declaration;
pub use eval::{CheckFinding, FAKE_FILE_NAME, StaticCheck};
pub use navigate::Invocation;
