//! Checked packages and the machinery producing them.
//!
//! ## Key Types
//!
//! - [`Loader`] - the load entry point
//! - [`ResolvedPackage`] - one checked package with its lifetime index
//! - [`PackageCache`] - checked packages by identity, never evicted
//! - [`LifetimeIndex`] - definition and use sites per symbol
//!
//! ## Load Pipeline
//!
//! ```text
//! patterns
//!     │
//!     ▼
//! discover              ← project: match directories, parse, group
//!     │
//!     ▼
//! ImportGraph           ← leaves first; unordered on a cycle
//!     │
//!     ▼
//! check_package         ← dedupe, analyze, index lifetimes (parallel)
//!     │
//!     ▼
//! PackageCache          ← visible to the next pass's imports
//! ```

mod cache;
mod check;
mod graph;
mod lifetime;
mod loader;
mod package;

pub use cache::{CacheImporter, PackageCache};
pub use check::{check_package, dedupe_declarations};
pub use graph::ImportGraph;
pub use lifetime::{Lifetime, LifetimeIndex};
pub use loader::Loader;
pub use package::{Packages, ResolvedPackage};
