//! Common test utilities for API integration tests
//!
//! This module provides shared test infrastructure for integration tests,
//! including an in-process provider fake and request helpers.

#![allow(unused_imports)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
