//! Per-sheet sub-reader registry and completion bookkeeping.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::common::error::Result;

use super::event::{EventSink, ReadEvent};
use super::hyperlink_reader::HyperlinkReader;
use super::lifecycle::{Completion, Lifecycle, ReaderKey, pending};
use super::reader::{ReadContext, SubReader};
use super::worksheet_reader::WorksheetReader;

/// Get the reader for `key`, creating it (and counting it open) on first
/// use.
fn acquire<'m, T>(
    readers: &'m mut BTreeMap<u32, T>,
    lifecycle: &mut Lifecycle,
    completion_tx: &Sender<ReaderKey>,
    key: ReaderKey,
    make: impl FnOnce(Completion) -> T,
) -> &'m mut T {
    match readers.entry(key.sheet) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => {
            log::trace!("opening {} reader", key);
            lifecycle.reader_opened();
            entry.insert(make(Completion::new(key, completion_tx.clone())))
        },
    }
}

/// Keeps at most one worksheet reader and one hyperlink reader per sheet
/// number, and turns their completion signals into lifecycle transitions.
#[derive(Debug)]
pub struct ReaderRegistry {
    worksheets: BTreeMap<u32, WorksheetReader>,
    hyperlinks: BTreeMap<u32, HyperlinkReader>,
    lifecycle: Lifecycle,
    completion_tx: Sender<ReaderKey>,
    completion_rx: Receiver<ReaderKey>,
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderRegistry {
    pub fn new() -> Self {
        let (completion_tx, completion_rx) = mpsc::channel();
        Self {
            worksheets: BTreeMap::new(),
            hyperlinks: BTreeMap::new(),
            lifecycle: Lifecycle::new(),
            completion_tx,
            completion_rx,
        }
    }

    /// Worksheet reader for `sheet`, created on first request.
    pub fn worksheet(&mut self, sheet: u32) -> &mut WorksheetReader {
        acquire(
            &mut self.worksheets,
            &mut self.lifecycle,
            &self.completion_tx,
            ReaderKey::worksheet(sheet),
            |completion| WorksheetReader::new(sheet, completion),
        )
    }

    /// Hyperlink reader for `sheet`, created on first request.
    pub fn hyperlinks(&mut self, sheet: u32) -> &mut HyperlinkReader {
        acquire(
            &mut self.hyperlinks,
            &mut self.lifecycle,
            &self.completion_tx,
            ReaderKey::hyperlinks(sheet),
            |completion| HyperlinkReader::new(sheet, completion),
        )
    }

    /// Route a worksheet payload to its reader.
    ///
    /// The hyperlink reader of the same sheet, if already read, is handed
    /// along so cell hyperlinks can be resolved.
    pub fn read_worksheet(
        &mut self,
        sheet: u32,
        input: &mut dyn BufRead,
        ctx: ReadContext<'_>,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        let reader = acquire(
            &mut self.worksheets,
            &mut self.lifecycle,
            &self.completion_tx,
            ReaderKey::worksheet(sheet),
            |completion| WorksheetReader::new(sheet, completion),
        );
        let ctx = ctx.with_hyperlinks(self.hyperlinks.get(&sheet));
        reader.read(input, &ctx, sink)
    }

    /// Route a worksheet relationships payload to its reader.
    pub fn read_hyperlinks(
        &mut self,
        sheet: u32,
        input: &mut dyn BufRead,
        ctx: ReadContext<'_>,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        self.hyperlinks(sheet).read(input, &ctx, sink)
    }

    /// Consume pending completion signals.
    ///
    /// Raises [`ReadEvent::ReaderFinished`] for each, followed by
    /// [`ReadEvent::Finished`] if one of them completed the session.
    pub fn settle(&mut self, sink: &mut dyn EventSink) -> Result<()> {
        for key in pending(&self.completion_rx) {
            log::trace!("{} reader finished", key);
            sink.emit(ReadEvent::ReaderFinished(key))?;
            if self.lifecycle.reader_finished() {
                sink.emit(ReadEvent::Finished)?;
            }
        }
        Ok(())
    }

    /// Record that the container has no more entries.
    ///
    /// Returns `true` if the session finished with this transition.
    #[must_use]
    pub fn container_exhausted(&mut self) -> bool {
        self.lifecycle.container_exhausted()
    }

    #[inline]
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn worksheet_reader(&self, sheet: u32) -> Option<&WorksheetReader> {
        self.worksheets.get(&sheet)
    }

    pub fn hyperlink_reader(&self, sheet: u32) -> Option<&HyperlinkReader> {
        self.hyperlinks.get(&sheet)
    }

    /// Sheet numbers that have a worksheet reader, ascending.
    pub fn worksheet_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.worksheets.keys().copied()
    }

    /// Sheet numbers that have a hyperlink reader, ascending.
    pub fn hyperlink_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.hyperlinks.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::stream::options::ReadOptions;
    use crate::ooxml::xlsx::styles::StyleTable;

    #[test]
    fn test_acquire_is_idempotent() {
        let mut registry = ReaderRegistry::new();
        registry.worksheet(1);
        registry.worksheet(1);
        assert_eq!(registry.lifecycle().open_readers(), 1);
        registry.hyperlinks(1);
        assert_eq!(registry.lifecycle().open_readers(), 2);
        assert_eq!(registry.worksheet_numbers().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_completion_decrements_once() {
        let mut registry = ReaderRegistry::new();
        let options = ReadOptions::drain_all();
        let styles = StyleTable::Placeholder;
        let ctx = ReadContext::new(&options, None, &styles);
        let mut events: Vec<ReadEvent> = Vec::new();

        registry.read_worksheet(2, &mut "<worksheet/>".as_bytes(), ctx, &mut events).unwrap();
        registry.read_worksheet(2, &mut "<worksheet/>".as_bytes(), ctx, &mut events).unwrap();
        registry.settle(&mut events).unwrap();
        assert_eq!(registry.lifecycle().open_readers(), 0);
        assert!(matches!(events.as_slice(), [ReadEvent::ReaderFinished(key)] if *key == ReaderKey::worksheet(2)));

        assert!(registry.container_exhausted());
        assert!(registry.lifecycle().is_finished());
    }

    #[test]
    fn test_finished_raised_by_last_completion_after_exhaustion() {
        let mut registry = ReaderRegistry::new();
        let options = ReadOptions::drain_all();
        let styles = StyleTable::Placeholder;
        let ctx = ReadContext::new(&options, None, &styles);
        let mut events: Vec<ReadEvent> = Vec::new();

        registry.hyperlinks(3);
        assert!(!registry.container_exhausted());
        registry.read_hyperlinks(3, &mut "<Relationships/>".as_bytes(), ctx, &mut events).unwrap();
        registry.settle(&mut events).unwrap();
        assert!(matches!(events.as_slice(), [ReadEvent::ReaderFinished(_), ReadEvent::Finished]));
        assert!(registry.lifecycle().is_finished());
    }
}
