//! Discovery tests
//!
//! - Directory grouping into primary, external test and excluded packages
//! - Wildcard walks over roots and the working directory
//! - Foreign-interop preprocessing

pub mod tests_discover;
pub mod tests_preprocess;
