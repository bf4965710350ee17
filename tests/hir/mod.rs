//! Loading and checking tests
//!
//! - Pattern groups, ordering and cache identity
//! - Import-ordered scheduling and the cycle fallback
//! - Collision dedupe across build-excluded files
//! - Lifetime records

pub mod tests_dedupe;
pub mod tests_lifetimes;
pub mod tests_load;
pub mod tests_scheduling;
