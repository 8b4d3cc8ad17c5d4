//! Events raised by a read session and the sinks that receive them.

use std::fmt;
use std::sync::mpsc;

use crate::common::error::{Error, Result};
use crate::ooxml::opc::rel::Relationship;

use super::lifecycle::ReaderKey;
use super::worksheet_reader::Row;

/// Classification of one container entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// `_rels/.rels`, drained
    PackageRelationships,
    /// `xl/workbook.xml`, drained
    Workbook,
    /// `xl/_rels/workbook.xml.rels`, drained
    WorkbookRelationships,
    /// `xl/sharedStrings.xml`
    SharedStrings,
    /// `xl/styles.xml`
    Styles,
    /// `xl/worksheets/sheet<N>.xml`
    Worksheet(u32),
    /// `xl/worksheets/_rels/sheet<N>.xml.rels`
    Hyperlinks(u32),
    /// Anything else, drained
    Unrecognized,
}

impl EntryKind {
    /// Sheet number for per-sheet parts.
    #[inline]
    pub fn sheet(&self) -> Option<u32> {
        match *self {
            EntryKind::Worksheet(sheet) | EntryKind::Hyperlinks(sheet) => Some(sheet),
            _ => None,
        }
    }

    /// Whether the payload is discarded without parsing regardless of
    /// configuration.
    #[inline]
    pub fn is_drained(&self) -> bool {
        matches!(
            self,
            EntryKind::PackageRelationships
                | EntryKind::Workbook
                | EntryKind::WorkbookRelationships
                | EntryKind::Unrecognized
        )
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::PackageRelationships => f.write_str("package-relationships"),
            EntryKind::Workbook => f.write_str("workbook"),
            EntryKind::WorkbookRelationships => f.write_str("workbook-relationships"),
            EntryKind::SharedStrings => f.write_str("shared-strings"),
            EntryKind::Styles => f.write_str("styles"),
            EntryKind::Worksheet(sheet) => write!(f, "worksheet {}", sheet),
            EntryKind::Hyperlinks(sheet) => write!(f, "hyperlinks {}", sheet),
            EntryKind::Unrecognized => f.write_str("unrecognized"),
        }
    }
}

/// Classification notice raised before an entry's payload is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryNotice {
    /// Canonical entry path
    pub path: String,
    /// Classification
    pub kind: EntryKind,
}

/// A `<hyperlink>` element of a worksheet, joined with its relationship
/// target when the relationships part was already read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellHyperlink {
    /// Cell address (e.g., "B2")
    pub address: String,
    /// Relationship id referenced by `r:id`, absent for in-document links
    pub rel_id: Option<String>,
    /// Target URI, when resolved
    pub target: Option<String>,
    /// In-document location (`location` attribute)
    pub location: Option<String>,
}

/// Everything a read session reports.
#[derive(Debug)]
pub enum ReadEvent {
    /// An entry was classified (entries=emit only)
    Entry(EntryNotice),
    /// A shared string was completed (sharedStrings=emit only)
    SharedString { index: usize, text: String },
    /// A worksheet part is about to be read (worksheets=emit only)
    Worksheet { sheet: u32 },
    /// A worksheet row was completed (worksheets=emit only)
    Row { sheet: u32, row: Row },
    /// A worksheet `<hyperlink>` element (hyperlinks=emit only)
    CellHyperlink { sheet: u32, hyperlink: CellHyperlink },
    /// A relationships part is about to be read (hyperlinks=emit only)
    Hyperlinks { sheet: u32 },
    /// A hyperlink relationship was read (hyperlinks=emit only)
    Hyperlink { sheet: u32, relationship: Relationship },
    /// A sub-reader raised its one-shot completion signal
    ReaderFinished(ReaderKey),
    /// A part failed; the session continues with the next entry
    Error(Error),
    /// The container has no more entries; sub-readers may still be open
    End,
    /// Terminal: container consumed and every sub-reader finished
    Finished,
}

/// Receiver of session events.
///
/// Returning an error stops the session. [`Error::Cancelled`] is the
/// conventional answer of a sink whose consumer went away.
pub trait EventSink {
    fn emit(&mut self, event: ReadEvent) -> Result<()>;
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    #[inline]
    fn emit(&mut self, event: ReadEvent) -> Result<()> {
        (**self).emit(event)
    }
}

impl EventSink for Vec<ReadEvent> {
    #[inline]
    fn emit(&mut self, event: ReadEvent) -> Result<()> {
        self.push(event);
        Ok(())
    }
}

impl EventSink for mpsc::Sender<ReadEvent> {
    fn emit(&mut self, event: ReadEvent) -> Result<()> {
        self.send(event).map_err(|_| Error::Cancelled)
    }
}

/// Bounded tokio channel sink.
///
/// Sending blocks while the channel is full, so this sink must be driven
/// from outside the async runtime (see [`WorkbookReader::spawn`](super::WorkbookReader::spawn)).
impl EventSink for tokio::sync::mpsc::Sender<ReadEvent> {
    fn emit(&mut self, event: ReadEvent) -> Result<()> {
        self.blocking_send(event).map_err(|_| Error::Cancelled)
    }
}

/// Adapts a closure into an [`EventSink`].
pub struct FnSink<F>(pub F);

impl<F: FnMut(ReadEvent)> EventSink for FnSink<F> {
    #[inline]
    fn emit(&mut self, event: ReadEvent) -> Result<()> {
        (self.0)(event);
        Ok(())
    }
}
