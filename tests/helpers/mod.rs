//! Shared fixtures for integration tests.

#![allow(dead_code)]

pub mod preprocessor;
pub mod workspace;
