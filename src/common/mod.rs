//! Common types and utilities shared across the reader and writer.

pub mod error;
pub mod xml;

pub use error::{Error, Result};
