//! Shared utilities.
//!
//! Serde helpers for loosely typed YAML scalars and atomic file writes.

pub mod fs;
pub mod scalar;
