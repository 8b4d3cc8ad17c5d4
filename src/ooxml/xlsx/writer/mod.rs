//! Incremental writers for XLSX parts.

pub mod sheet_rels;

// Re-export main types
pub use sheet_rels::{Hyperlink, HyperlinkRecord, HyperlinkSink, HyperlinksProxy, PartOpener, SheetRelsWriter};
