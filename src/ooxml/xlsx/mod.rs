//! Excel (.xlsx) spreadsheet support.
//!
//! - `stream`: forward-only workbook reader
//! - `styles`: style table consulted by the reader
//! - `writer`: incremental worksheet relationship writer
//!
//! # Example
//!
//! ```rust,no_run
//! use litchi_stream::ooxml::xlsx::stream::{PartMode, ReadEvent, ReadOptions, WorkbookReader};
//!
//! let options = ReadOptions::default().with_hyperlinks(PartMode::Cache);
//! let mut reader = WorkbookReader::new(options);
//! let mut events: Vec<ReadEvent> = Vec::new();
//! reader.read("workbook.xlsx", &mut events)?;
//! println!("{} shared strings", reader.shared_strings().map_or(0, |s| s.len()));
//! # Ok::<(), litchi_stream::Error>(())
//! ```
pub mod stream;
pub mod styles;
pub mod writer;

pub use styles::{CellStyle, StyleTable, Styles};
