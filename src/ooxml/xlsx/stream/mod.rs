//! Streaming `.xlsx` reader.
//!
//! A read session decompresses the package entry by entry, routes each part
//! to an incremental parser and reports what it finds as [`ReadEvent`]s. The
//! package is never held in memory: only the shared-string store and the
//! style table are retained, and only when configured to be cached.
//!
//! ```text
//! input ─▶ PackageEntries ─▶ route::classify ─┬─▶ shared strings (cache | emit)
//!                                              ├─▶ styles (cache)
//!                                              ├─▶ ReaderRegistry ─▶ WorksheetReader / HyperlinkReader
//!                                              └─▶ drain
//! ```
//!
//! Completion is tracked by [`Lifecycle`]: the session finishes once the
//! container is exhausted and every sub-reader has signalled, in whichever
//! order those happen.

pub mod entry;
pub mod event;
pub mod hyperlink_reader;
pub mod lifecycle;
pub mod options;
pub mod reader;
pub mod registry;
pub mod route;
pub mod shared_strings;
pub mod task;
pub mod workbook_reader;
pub mod worksheet_reader;

pub use entry::{ArchiveEntrySource, ContainerEntry, EntrySource, PackageEntries, ReadInput, ZipEntrySource, open_input};
pub use event::{CellHyperlink, EntryKind, EntryNotice, EventSink, FnSink, ReadEvent};
pub use hyperlink_reader::HyperlinkReader;
pub use lifecycle::{Completion, Lifecycle, ReaderKey, ReaderKind};
pub use options::{PartMode, ReadOptions, SharedStringMode};
pub use reader::{ReadContext, SubReader};
pub use registry::ReaderRegistry;
pub use route::classify;
pub use shared_strings::{SharedStringExtractor, SharedStringTable, StringEgress, TextToken, extract_shared_strings};
pub use task::ReadTask;
pub use workbook_reader::WorkbookReader;
pub use worksheet_reader::{Cell, CellValue, Row, WorksheetReader};
