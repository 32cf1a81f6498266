//! Version comparison for discovered versions
//!
//! # Modules
//!
//! - [`semver`]: Semver parsing and comparison of current vs. discovered versions

pub mod semver;

pub use semver::{CompareResult, compare_versions};
