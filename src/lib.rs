//! Litchi Stream - streaming reader for Excel (.xlsx) packages
//!
//! This library reads `.xlsx` workbooks without materializing the package in
//! memory: the ZIP container is decompressed entry by entry, each part is
//! routed to an incremental parser and the results are reported as events.
//! A companion writer serializes worksheet relationship parts incrementally.
//!
//! # Features
//!
//! - **Forward-only input**: reads from a path or any `Read`, no seeking
//! - **Cache or emit**: shared strings and hyperlinks can be retained or streamed
//! - **Exactly-once completion**: `Finished` is raised once per session
//! - **Async surface**: sessions can run on tokio's blocking pool
//!
//! # Example - Reading a workbook
//!
//! ```no_run
//! use litchi_stream::ooxml::xlsx::stream::{FnSink, ReadEvent, ReadOptions, WorkbookReader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = WorkbookReader::new(ReadOptions::default());
//! reader.read(
//!     "report.xlsx",
//!     &mut FnSink(|event| {
//!         if let ReadEvent::Row { sheet, row } = event {
//!             println!("sheet {} row {}", sheet, row.number);
//!         }
//!     }),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Writing sheet relationships
//!
//! ```no_run
//! use std::fs::File;
//! use litchi_stream::ooxml::xlsx::writer::{Hyperlink, SheetRelsWriter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut writer = SheetRelsWriter::new(1, |_: &str| File::create("sheet1.xml.rels"));
//! writer.add_hyperlink(Hyperlink::new("https://example.com", "A1"))?;
//! writer.commit()?;
//! # Ok(())
//! # }
//! ```

/// Error handling and XML helpers shared by readers and writers
pub mod common;

/// OOXML (Office Open XML) package handling
///
/// This module provides the part-name and relationship layer and the
/// streaming `.xlsx` reader and writer built on it.
pub mod ooxml;

pub use common::error::{Error, Result};
