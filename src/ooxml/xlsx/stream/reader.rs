//! Contract shared by the per-sheet sub-readers.

use std::io::{self, BufRead};

use crate::common::error::Result;
use crate::ooxml::xlsx::styles::StyleTable;

use super::event::EventSink;
use super::hyperlink_reader::HyperlinkReader;
use super::options::ReadOptions;
use super::shared_strings::SharedStringTable;

/// Session state a sub-reader may consult while reading its part.
#[derive(Clone, Copy)]
pub struct ReadContext<'a> {
    pub options: &'a ReadOptions,
    /// Cached shared strings, when sharedStrings=cache
    pub shared_strings: Option<&'a SharedStringTable>,
    pub styles: &'a StyleTable,
    /// Hyperlink reader of the same sheet, if its part was already seen
    pub hyperlinks: Option<&'a HyperlinkReader>,
}

impl<'a> ReadContext<'a> {
    pub fn new(options: &'a ReadOptions, shared_strings: Option<&'a SharedStringTable>, styles: &'a StyleTable) -> Self {
        Self {
            options,
            shared_strings,
            styles,
            hyperlinks: None,
        }
    }

    pub fn with_hyperlinks(mut self, hyperlinks: Option<&'a HyperlinkReader>) -> Self {
        self.hyperlinks = hyperlinks;
        self
    }
}

/// A per-sheet incremental parser.
///
/// A sub-reader owns a one-shot completion handle and raises it exactly
/// once, whether its part parsed cleanly, failed, or was drained. A reader
/// that has already finished drains any further payload it is handed.
pub trait SubReader {
    /// Read one part payload.
    fn read(&mut self, input: &mut dyn BufRead, ctx: &ReadContext<'_>, sink: &mut dyn EventSink) -> Result<()>;

    /// Whether the completion signal has been raised.
    fn is_finished(&self) -> bool;
}

/// Consume and discard the rest of a payload.
pub fn drain<R: io::Read + ?Sized>(input: &mut R) -> Result<()> {
    io::copy(input, &mut io::sink())?;
    Ok(())
}
