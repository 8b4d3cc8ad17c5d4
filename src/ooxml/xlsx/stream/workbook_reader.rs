//! Streaming workbook session.

use std::io::{BufRead, BufReader};

use crate::common::error::{Error, Result};
use crate::ooxml::xlsx::styles::{StyleTable, Styles};

use super::entry::{ContainerEntry, EntrySource, PayloadTap, ReadInput, open_input};
use super::event::{EntryKind, EventSink, ReadEvent};
use super::hyperlink_reader::HyperlinkReader;
use super::options::{ReadOptions, SharedStringMode};
use super::reader::{ReadContext, drain};
use super::registry::ReaderRegistry;
use super::route;
use super::shared_strings::{SharedStringTable, StringEgress, extract_shared_strings};
use super::worksheet_reader::WorksheetReader;

/// One streaming read of an `.xlsx` package.
///
/// Entries are read in archive order and each is routed by path: shared
/// strings to the extractor, styles to the style table, numbered worksheet
/// and relationship parts to per-sheet sub-readers. Everything else is
/// drained. The session raises [`ReadEvent::End`] when the container has no
/// more entries and [`ReadEvent::Finished`] exactly once, when the
/// container is exhausted and every sub-reader has finished.
///
/// # Examples
///
/// ```rust,no_run
/// use litchi_stream::ooxml::xlsx::stream::{ReadEvent, ReadOptions, WorkbookReader};
///
/// let mut reader = WorkbookReader::new(ReadOptions::default());
/// let mut events: Vec<ReadEvent> = Vec::new();
/// reader.read("report.xlsx", &mut events)?;
/// for event in &events {
///     if let ReadEvent::Row { sheet, row } = event {
///         println!("sheet {} row {}: {} cells", sheet, row.number, row.cells.len());
///     }
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct WorkbookReader {
    /// Per-kind behavior, fixed for the session
    options: ReadOptions,
    /// Per-sheet sub-readers and the completion state machine
    registry: ReaderRegistry,
    /// Shared strings with their item offsets (sharedStrings=cache only)
    shared_strings: Option<SharedStringTable>,
    /// Style table; a placeholder until a styles part is cached
    styles: StyleTable,
    /// Set once a read has begun, whatever its outcome
    started: bool,
}

impl WorkbookReader {
    pub fn new(options: ReadOptions) -> Self {
        let shared_strings = (options.shared_string_mode() == Some(SharedStringMode::Cache)).then(SharedStringTable::new);
        Self {
            options,
            registry: ReaderRegistry::new(),
            shared_strings,
            styles: StyleTable::Placeholder,
            started: false,
        }
    }

    /// Open `input` and read every entry into `sink`.
    ///
    /// Fails with [`Error::UnrecognizedInput`] before any entry is read if
    /// the input is not a ZIP container.
    pub fn read(&mut self, input: impl Into<ReadInput>, sink: &mut dyn EventSink) -> Result<()> {
        self.begin()?;
        let mut source = open_input(input.into())?;
        self.read_all(&mut source, sink)
    }

    /// Read every entry of an already opened container into `sink`.
    ///
    /// A part that fails to parse raises [`ReadEvent::Error`] and the
    /// session moves on to the next entry. A container failure, or a sink
    /// that refuses an event, ends the session with an error and neither
    /// `End` nor `Finished` is raised. Failures reading an entry's payload
    /// (inflate, checksum, a closed input) are container failures.
    ///
    /// A session reads one container; any further read is rejected, even
    /// after a failed one.
    pub fn read_entries<E: EntrySource + ?Sized>(&mut self, source: &mut E, sink: &mut dyn EventSink) -> Result<()> {
        self.begin()?;
        self.read_all(source, sink)
    }

    fn begin(&mut self) -> Result<()> {
        if self.started {
            return Err(Error::Other("workbook session was already read".to_string()));
        }
        self.started = true;
        Ok(())
    }

    fn read_all<E: EntrySource + ?Sized>(&mut self, source: &mut E, sink: &mut dyn EventSink) -> Result<()> {
        while let Some(entry) = source.next_entry()? {
            let ContainerEntry { path, reader } = entry;
            let notice = route::notice(&path);
            log::trace!("routing {} as {}", notice.path, notice.kind);
            let kind = notice.kind;
            let part = notice.path.clone();
            if self.options.emit_entries() {
                sink.emit(ReadEvent::Entry(notice))?;
            }

            let mut payload = PayloadTap::new(reader);
            let result = {
                let mut input = BufReader::new(&mut payload);
                let dispatched = self.dispatch(kind, &mut input, sink);
                // A reader that stopped early leaves the rest of its payload.
                dispatched.and(drain(&mut input))
            };
            if let Some(failure) = payload.take_failure() {
                return Err(Error::ZipError(format!("failed to read {}: {}", part, failure)));
            }
            match result {
                Ok(()) => {},
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let e = e.in_part(&part);
                    log::warn!("failed to read {}: {}", part, e);
                    sink.emit(ReadEvent::Error(e))?;
                },
            }

            self.registry.settle(sink)?;
        }

        log::debug!("container exhausted, {} readers open", self.registry.lifecycle().open_readers());
        sink.emit(ReadEvent::End)?;
        if self.registry.container_exhausted() {
            log::debug!("workbook session finished");
            sink.emit(ReadEvent::Finished)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, kind: EntryKind, input: &mut dyn BufRead, sink: &mut dyn EventSink) -> Result<()> {
        match kind {
            EntryKind::SharedStrings => self.read_shared_strings(input, sink),
            EntryKind::Styles => self.read_styles(input),
            EntryKind::Worksheet(sheet) => {
                if self.options.emit_worksheets() {
                    sink.emit(ReadEvent::Worksheet { sheet })?;
                }
                let ctx = ReadContext::new(&self.options, self.shared_strings.as_ref(), &self.styles);
                self.registry.read_worksheet(sheet, input, ctx, sink)
            },
            EntryKind::Hyperlinks(sheet) => {
                if self.options.emit_hyperlinks() {
                    sink.emit(ReadEvent::Hyperlinks { sheet })?;
                }
                let ctx = ReadContext::new(&self.options, self.shared_strings.as_ref(), &self.styles);
                self.registry.read_hyperlinks(sheet, input, ctx, sink)
            },
            EntryKind::PackageRelationships
            | EntryKind::Workbook
            | EntryKind::WorkbookRelationships
            | EntryKind::Unrecognized => drain(input),
        }
    }

    fn read_shared_strings(&mut self, input: &mut dyn BufRead, sink: &mut dyn EventSink) -> Result<()> {
        let egress = match self.options.shared_string_mode() {
            Some(SharedStringMode::Cache) => {
                StringEgress::Cache(self.shared_strings.get_or_insert_with(SharedStringTable::new))
            },
            Some(SharedStringMode::Emit) => StringEgress::Emit(sink),
            None => return drain(input),
        };
        let count = extract_shared_strings(input, egress)?;
        log::debug!("read {} shared strings", count);
        Ok(())
    }

    fn read_styles(&mut self, input: &mut dyn BufRead) -> Result<()> {
        if !self.options.cache_styles() {
            return drain(input);
        }
        let styles = Styles::from_reader(input)?;
        log::debug!(
            "cached {} number formats and {} cell formats",
            styles.number_formats.len(),
            styles.cell_xfs.len()
        );
        self.styles = StyleTable::Parsed(styles);
        Ok(())
    }

    #[inline]
    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Cached `<t>` texts, in discovery order. Rich-text items contribute
    /// one entry per run.
    pub fn shared_strings(&self) -> Option<&[String]> {
        self.shared_strings.as_ref().map(SharedStringTable::strings)
    }

    #[inline]
    pub fn shared_string_table(&self) -> Option<&SharedStringTable> {
        self.shared_strings.as_ref()
    }

    /// Cached shared string by the zero-based index cells use, runs
    /// concatenated.
    pub fn shared_string(&self, index: usize) -> Option<String> {
        self.shared_strings.as_ref()?.item(index)
    }

    #[inline]
    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn worksheet_reader(&self, sheet: u32) -> Option<&WorksheetReader> {
        self.registry.worksheet_reader(sheet)
    }

    pub fn hyperlink_reader(&self, sheet: u32) -> Option<&HyperlinkReader> {
        self.registry.hyperlink_reader(sheet)
    }

    #[inline]
    pub fn registry(&self) -> &ReaderRegistry {
        &self.registry
    }

    /// Whether the terminal `Finished` event was raised.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.registry.lifecycle().is_finished()
    }
}

impl Default for WorkbookReader {
    fn default() -> Self {
        Self::new(ReadOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::stream::options::PartMode;
    use std::io::{Cursor, Read};

    /// In-memory entry source for driving the router without a ZIP layer.
    struct Entries(std::vec::IntoIter<(&'static str, &'static str)>);

    impl Entries {
        fn new(entries: Vec<(&'static str, &'static str)>) -> Self {
            Self(entries.into_iter())
        }
    }

    impl EntrySource for Entries {
        fn next_entry(&mut self) -> Result<Option<ContainerEntry<'_>>> {
            Ok(self.0.next().map(|(path, body)| ContainerEntry {
                path: path.to_string(),
                reader: Box::new(Cursor::new(body.as_bytes())) as Box<dyn Read>,
            }))
        }
    }

    struct Broken;

    impl EntrySource for Broken {
        fn next_entry(&mut self) -> Result<Option<ContainerEntry<'_>>> {
            Err(Error::ZipError("invalid local file header".to_string()))
        }
    }

    /// One shared-strings entry whose payload fails partway through.
    struct Truncated {
        served: bool,
    }

    struct FailingPayload(Cursor<&'static [u8]>);

    impl Read for FailingPayload {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.0.read(buf)? {
                0 => Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "invalid checksum")),
                n => Ok(n),
            }
        }
    }

    impl EntrySource for Truncated {
        fn next_entry(&mut self) -> Result<Option<ContainerEntry<'_>>> {
            if self.served {
                return Ok(None);
            }
            self.served = true;
            Ok(Some(ContainerEntry {
                path: "xl/sharedStrings.xml".to_string(),
                reader: Box::new(FailingPayload(Cursor::new(b"<sst><si><t>A</t></si>".as_slice()))),
            }))
        }
    }

    const SST: &str = r#"<sst><si><t>A</t></si><si><t>B</t></si><si><t>C</t></si></sst>"#;
    const SHEET: &str = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>2</v></c></row></sheetData></worksheet>"#;

    fn finished_count(events: &[ReadEvent]) -> usize {
        events.iter().filter(|e| matches!(e, ReadEvent::Finished)).count()
    }

    #[test]
    fn test_routes_and_finishes_once() {
        let mut reader = WorkbookReader::default();
        let mut events: Vec<ReadEvent> = Vec::new();
        let mut source = Entries::new(vec![
            ("xl/sharedStrings.xml", SST),
            ("xl/worksheets/sheet1.xml", SHEET),
            ("xl/theme/theme1.xml", "<theme/>"),
        ]);
        reader.read_entries(&mut source, &mut events).unwrap();

        assert_eq!(reader.shared_strings(), Some(&["A".to_string(), "B".to_string(), "C".to_string()][..]));
        assert_eq!(finished_count(&events), 1);
        assert!(matches!(events.last(), Some(ReadEvent::Finished)));
        assert!(reader.is_finished());

        let kinds: Vec<EntryKind> = events
            .iter()
            .filter_map(|e| match e {
                ReadEvent::Entry(notice) => Some(notice.kind),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![EntryKind::SharedStrings, EntryKind::Worksheet(1), EntryKind::Unrecognized]
        );

        let row = events.iter().find_map(|e| match e {
            ReadEvent::Row { row, .. } => Some(row),
            _ => None,
        });
        let cell = &row.unwrap().cells[0];
        assert_eq!(
            cell.value,
            crate::ooxml::xlsx::stream::CellValue::SharedString {
                index: 2,
                text: Some("C".to_string())
            }
        );
    }

    #[test]
    fn test_empty_container_finishes_immediately() {
        let mut reader = WorkbookReader::default();
        let mut events: Vec<ReadEvent> = Vec::new();
        reader.read_entries(&mut Entries::new(Vec::new()), &mut events).unwrap();
        assert!(matches!(events.as_slice(), [ReadEvent::End, ReadEvent::Finished]));
    }

    #[test]
    fn test_malformed_part_does_not_abort_session() {
        let mut reader = WorkbookReader::default();
        let mut events: Vec<ReadEvent> = Vec::new();
        let mut source = Entries::new(vec![
            ("xl/sharedStrings.xml", "<sst><si><t>A</t></si><si><t>B</x>"),
            ("xl/worksheets/sheet1.xml", SHEET),
        ]);
        reader.read_entries(&mut source, &mut events).unwrap();

        assert_eq!(reader.shared_strings(), Some(&["A".to_string()][..]));
        let error = events.iter().find_map(|e| match e {
            ReadEvent::Error(err) => Some(err),
            _ => None,
        });
        assert!(matches!(error, Some(Error::MalformedEntry { part, .. }) if part == "xl/sharedStrings.xml"));
        assert_eq!(finished_count(&events), 1);
    }

    #[test]
    fn test_container_failure_ends_session_without_finished() {
        let mut reader = WorkbookReader::default();
        let mut events: Vec<ReadEvent> = Vec::new();
        let result = reader.read_entries(&mut Broken, &mut events);
        assert!(matches!(result, Err(Error::ZipError(_))));
        assert!(events.is_empty());
        assert!(!reader.is_finished());
    }

    #[test]
    fn test_entries_notice_disabled() {
        let options = ReadOptions::default()
            .with_entries(PartMode::Ignore)
            .with_worksheets(PartMode::Ignore);
        let mut reader = WorkbookReader::new(options);
        let mut events: Vec<ReadEvent> = Vec::new();
        let mut source = Entries::new(vec![("xl/worksheets/sheet1.xml", SHEET)]);
        reader.read_entries(&mut source, &mut events).unwrap();
        assert!(matches!(
            events.as_slice(),
            [ReadEvent::ReaderFinished(_), ReadEvent::End, ReadEvent::Finished]
        ));
    }

    #[test]
    fn test_styles_cached_on_request() {
        let options = ReadOptions::default().with_styles(PartMode::Cache);
        let mut reader = WorkbookReader::new(options);
        let mut source = Entries::new(vec![(
            "xl/styles.xml",
            r#"<styleSheet><cellXfs count="1"><xf numFmtId="14"/></cellXfs></styleSheet>"#,
        )]);
        reader.read_entries(&mut source, &mut Vec::<ReadEvent>::new()).unwrap();
        assert!(reader.styles().is_cached());
        assert_eq!(reader.styles().num_fmt_id(0), Some(14));

        let mut reader = WorkbookReader::default();
        let mut source = Entries::new(vec![("xl/styles.xml", "<styleSheet/>")]);
        reader.read_entries(&mut source, &mut Vec::<ReadEvent>::new()).unwrap();
        assert!(!reader.styles().is_cached());
    }

    #[test]
    fn test_rich_text_item_resolves_by_cell_index() {
        let mut reader = WorkbookReader::default();
        let mut events: Vec<ReadEvent> = Vec::new();
        let mut source = Entries::new(vec![
            (
                "xl/sharedStrings.xml",
                "<sst><si><r><t>Hello </t></r><r><t>World</t></r></si><si><t>X</t></si></sst>",
            ),
            (
                "xl/worksheets/sheet1.xml",
                r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>1</v></c><c r="B1" t="s"><v>0</v></c></row></sheetData></worksheet>"#,
            ),
        ]);
        reader.read_entries(&mut source, &mut events).unwrap();

        assert_eq!(reader.shared_string(0).as_deref(), Some("Hello World"));
        assert_eq!(reader.shared_string(1).as_deref(), Some("X"));
        let cells = events
            .iter()
            .find_map(|e| match e {
                ReadEvent::Row { row, .. } => Some(&row.cells),
                _ => None,
            })
            .unwrap();
        let texts: Vec<_> = cells
            .iter()
            .map(|cell| match &cell.value {
                crate::ooxml::xlsx::stream::CellValue::SharedString { text, .. } => text.clone(),
                other => panic!("unexpected value {other:?}"),
            })
            .collect();
        assert_eq!(texts, vec![Some("X".to_string()), Some("Hello World".to_string())]);
    }

    #[test]
    fn test_payload_read_failure_ends_session() {
        let mut reader = WorkbookReader::default();
        let mut events: Vec<ReadEvent> = Vec::new();
        let result = reader.read_entries(&mut Truncated { served: false }, &mut events);

        match result {
            Err(Error::ZipError(message)) => {
                assert!(message.contains("xl/sharedStrings.xml"));
                assert!(message.contains("invalid checksum"));
            },
            other => panic!("unexpected result {other:?}"),
        }
        assert!(!events.iter().any(|e| matches!(e, ReadEvent::Error(_) | ReadEvent::End | ReadEvent::Finished)));
        assert!(!reader.is_finished());
    }

    #[test]
    fn test_read_after_failure_is_rejected() {
        let mut reader = WorkbookReader::default();
        assert!(reader.read_entries(&mut Broken, &mut Vec::<ReadEvent>::new()).is_err());
        let again = reader.read_entries(&mut Entries::new(Vec::new()), &mut Vec::<ReadEvent>::new());
        assert!(matches!(again, Err(Error::Other(_))));

        let mut reader = WorkbookReader::default();
        let input = ReadInput::stream(Cursor::new(b"not a zip".to_vec()));
        assert!(matches!(reader.read(input, &mut Vec::<ReadEvent>::new()), Err(Error::UnrecognizedInput(_))));
        let again = reader.read_entries(&mut Entries::new(Vec::new()), &mut Vec::<ReadEvent>::new());
        assert!(matches!(again, Err(Error::Other(_))));
    }

    #[test]
    fn test_second_read_is_rejected() {
        let mut reader = WorkbookReader::default();
        reader.read_entries(&mut Entries::new(Vec::new()), &mut Vec::<ReadEvent>::new()).unwrap();
        let again = reader.read_entries(&mut Entries::new(Vec::new()), &mut Vec::<ReadEvent>::new());
        assert!(matches!(again, Err(Error::Other(_))));
    }
}
