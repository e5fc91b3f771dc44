//! Common test utilities and helpers.
//!
//! This module provides shared functionality for all tests, including:
//! - An in-memory document backend
//! - PDF fixtures built with printpdf
//! - Assertions over produced PDFs

#![allow(dead_code, unused_imports)]

pub mod assertions;
pub mod fixtures;
pub mod memory;

pub use assertions::*;
pub use fixtures::*;
pub use memory::*;
