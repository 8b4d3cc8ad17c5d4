//! Unified error types for litchi-stream.
//!
//! This module provides a single error type shared by the streaming reader
//! and the relationship writer.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
