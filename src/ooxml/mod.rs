//! Office Open XML (OOXML) format implementation.
//!
//! # Architecture
//!
//! 1. **OPC Layer** (`opc`): part names, relationship records and constants
//! 2. **Format-Specific Modules**:
//!    - `xlsx`: streaming Excel reader and relationship writer
pub mod opc;
pub mod xlsx;
