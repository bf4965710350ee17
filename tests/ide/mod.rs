//! Query API tests
//!
//! - Type and object specifiers
//! - Ancestors, invocations and next statements
//! - Declaration jumps within and across file sets

pub mod tests_decl;
pub mod tests_lookup;
pub mod tests_navigate;
