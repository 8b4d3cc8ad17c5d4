//! Sub-reader for worksheet parts (`xl/worksheets/sheet<N>.xml`).
//!
//! Rows are raised as soon as their closing tag is read. Cell values are
//! reported raw: interpreting numbers through number formats (dates,
//! percentages) is left to the consumer, which can use the style table.

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::common::error::{Error, Result};
use crate::common::xml::text_chunk;

use super::event::{CellHyperlink, EventSink, ReadEvent};
use super::lifecycle::Completion;
use super::reader::{ReadContext, SubReader, drain};
use super::shared_strings::SharedStringTable;

/// Raw cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Bool(bool),
    /// Error literal such as `#DIV/0!`
    Error(String),
    /// Inline string or string formula result
    Text(String),
    /// Shared-string reference; `text` is filled when strings are cached
    SharedString { index: usize, text: Option<String> },
    /// ISO 8601 date (`t="d"`)
    Date(String),
}

/// One cell of a row.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Cell address (e.g., "A1"); empty when the file omits `r`
    pub address: String,
    /// Index into `cellXfs`
    pub style: u32,
    /// Formula text without the leading `=`
    pub formula: Option<String>,
    pub value: CellValue,
}

/// One worksheet row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    /// 1-based row number; 0 when the file omits `r`
    pub number: u32,
    pub cells: Vec<Cell>,
}

/// Which text node of a cell is being accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellText {
    None,
    Value,
    Formula,
    Inline,
}

/// Cell under construction.
#[derive(Debug, Default)]
struct PendingCell {
    address: String,
    style: u32,
    cell_type: Option<String>,
    value: Option<String>,
    formula: Option<String>,
    inline: Option<String>,
}

impl PendingCell {
    fn from_start<R>(reader: &Reader<R>, start: &BytesStart<'_>) -> Result<Self> {
        let mut cell = PendingCell::default();
        for attr in start.attributes() {
            let attr = attr?;
            let value = attr.decode_and_unescape_value(reader.decoder())?;
            match attr.key.local_name().as_ref() {
                b"r" => cell.address = value.into_owned(),
                b"s" => cell.style = value.parse().unwrap_or(0),
                b"t" => cell.cell_type = Some(value.into_owned()),
                _ => {},
            }
        }
        Ok(cell)
    }

    fn finish(self, shared_strings: Option<&SharedStringTable>) -> Cell {
        let value = match (self.cell_type.as_deref(), self.value) {
            (Some("inlineStr"), _) => CellValue::Text(self.inline.unwrap_or_default()),
            (_, None) => CellValue::Empty,
            (Some("s"), Some(raw)) => match raw.trim().parse::<usize>() {
                Ok(index) => CellValue::SharedString {
                    index,
                    text: shared_strings.and_then(|table| table.item(index)),
                },
                Err(_) => CellValue::Error(raw),
            },
            (Some("str"), Some(raw)) => CellValue::Text(raw),
            (Some("b"), Some(raw)) => CellValue::Bool(raw.trim() == "1"),
            (Some("e"), Some(raw)) => CellValue::Error(raw),
            (Some("d"), Some(raw)) => CellValue::Date(raw),
            (_, Some(raw)) => match raw.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::Text(raw),
            },
        };
        Cell {
            address: self.address,
            style: self.style,
            formula: self.formula,
            value,
        }
    }
}

fn parse_row_number<R>(reader: &Reader<R>, start: &BytesStart<'_>) -> Result<u32> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == b"r" {
            let value = attr.decode_and_unescape_value(reader.decoder())?;
            return Ok(value.parse().unwrap_or(0));
        }
    }
    Ok(0)
}

fn parse_hyperlink<R>(reader: &Reader<R>, start: &BytesStart<'_>, ctx: &ReadContext<'_>) -> Result<CellHyperlink> {
    let mut hyperlink = CellHyperlink {
        address: String::new(),
        rel_id: None,
        target: None,
        location: None,
    };
    for attr in start.attributes() {
        let attr = attr?;
        let value = attr.decode_and_unescape_value(reader.decoder())?;
        // `r:id` lives in the office relationships namespace; match on the
        // local name like the rest of the readers.
        match (attr.key.prefix().is_some(), attr.key.local_name().as_ref()) {
            (false, b"ref") => hyperlink.address = value.into_owned(),
            (true, b"id") => hyperlink.rel_id = Some(value.into_owned()),
            (false, b"location") => hyperlink.location = Some(value.into_owned()),
            _ => {},
        }
    }
    if let (Some(rel_id), Some(links)) = (hyperlink.rel_id.as_deref(), ctx.hyperlinks) {
        hyperlink.target = links.get(rel_id).map(|rel| rel.target.clone());
    }
    Ok(hyperlink)
}

/// Reads the rows and cell hyperlinks of one sheet.
#[derive(Debug)]
pub struct WorksheetReader {
    sheet: u32,
    hyperlinks: Option<Vec<CellHyperlink>>,
    completion: Option<Completion>,
}

impl WorksheetReader {
    pub fn new(sheet: u32, completion: Completion) -> Self {
        Self {
            sheet,
            hyperlinks: None,
            completion: Some(completion),
        }
    }

    #[inline]
    pub fn sheet(&self) -> u32 {
        self.sheet
    }

    /// Cell hyperlinks retained when hyperlinks=cache, in document order.
    pub fn hyperlinks(&self) -> &[CellHyperlink] {
        self.hyperlinks.as_deref().unwrap_or_default()
    }

    fn parse(&mut self, input: &mut dyn BufRead, ctx: &ReadContext<'_>, sink: &mut dyn EventSink) -> Result<()> {
        let emit_rows = ctx.options.emit_worksheets();
        let emit_hyperlinks = ctx.options.emit_hyperlinks();

        let mut reader = Reader::from_reader(input);
        let mut buf = Vec::with_capacity(4096);

        let mut row: Option<Row> = None;
        let mut cell: Option<PendingCell> = None;
        let mut target = CellText::None;
        let mut in_inline = false;
        let mut text = String::new();

        loop {
            buf.clear();
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| Error::XmlError(format!("XML error in worksheet: {}", e)))?;
            match &event {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"row" if emit_rows => {
                        row = Some(Row {
                            number: parse_row_number(&reader, e)?,
                            cells: Vec::new(),
                        });
                    },
                    b"c" if row.is_some() => cell = Some(PendingCell::from_start(&reader, e)?),
                    b"is" if cell.is_some() => in_inline = true,
                    b"v" if cell.is_some() => {
                        target = CellText::Value;
                        text.clear();
                    },
                    b"f" if cell.is_some() => {
                        target = CellText::Formula;
                        text.clear();
                    },
                    b"t" if in_inline => {
                        target = CellText::Inline;
                        text.clear();
                    },
                    _ => {},
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"row" if emit_rows => {
                        let number = parse_row_number(&reader, e)?;
                        sink.emit(ReadEvent::Row {
                            sheet: self.sheet,
                            row: Row {
                                number,
                                cells: Vec::new(),
                            },
                        })?;
                    },
                    b"c" => {
                        if let Some(row) = row.as_mut() {
                            let pending = PendingCell::from_start(&reader, e)?;
                            row.cells.push(pending.finish(ctx.shared_strings));
                        }
                    },
                    b"hyperlink" => {
                        let hyperlink = parse_hyperlink(&reader, e, ctx)?;
                        if emit_hyperlinks {
                            sink.emit(ReadEvent::CellHyperlink {
                                sheet: self.sheet,
                                hyperlink,
                            })?;
                        } else if let Some(cache) = self.hyperlinks.as_mut() {
                            cache.push(hyperlink);
                        }
                    },
                    _ => {},
                },
                Event::End(e) => match e.local_name().as_ref() {
                    b"v" | b"f" | b"t" if target != CellText::None => {
                        let done = std::mem::take(&mut text);
                        if let Some(pending) = cell.as_mut() {
                            match target {
                                CellText::Value => pending.value = Some(done),
                                CellText::Formula => pending.formula = Some(done),
                                CellText::Inline => pending.inline.get_or_insert_with(String::new).push_str(&done),
                                CellText::None => {},
                            }
                        }
                        target = CellText::None;
                    },
                    b"is" => in_inline = false,
                    b"c" => {
                        if let (Some(pending), Some(row)) = (cell.take(), row.as_mut()) {
                            row.cells.push(pending.finish(ctx.shared_strings));
                        }
                    },
                    b"row" => {
                        if let Some(row) = row.take() {
                            sink.emit(ReadEvent::Row { sheet: self.sheet, row })?;
                        }
                    },
                    _ => {},
                },
                Event::Eof => break,
                other => {
                    if target != CellText::None
                        && let Some(chunk) = text_chunk(other)?
                    {
                        text.push_str(&chunk);
                    }
                },
            }
        }

        Ok(())
    }
}

impl SubReader for WorksheetReader {
    fn read(&mut self, input: &mut dyn BufRead, ctx: &ReadContext<'_>, sink: &mut dyn EventSink) -> Result<()> {
        let Some(completion) = self.completion.take() else {
            log::warn!("worksheet {} already finished, draining repeated part", self.sheet);
            return drain(input);
        };
        let wants_hyperlinks = ctx.options.emit_hyperlinks() || ctx.options.cache_hyperlinks();
        if !ctx.options.emit_worksheets() && !wants_hyperlinks {
            completion.signal();
            return drain(input);
        }
        if ctx.options.cache_hyperlinks() && self.hyperlinks.is_none() {
            self.hyperlinks = Some(Vec::new());
        }
        if wants_hyperlinks && ctx.hyperlinks.is_none() {
            log::debug!("worksheet {} read before its relationships part", self.sheet);
        }
        let result = self.parse(input, ctx, sink);
        completion.signal();
        result
    }

    #[inline]
    fn is_finished(&self) -> bool {
        self.completion.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::stream::hyperlink_reader::HyperlinkReader;
    use crate::ooxml::xlsx::stream::lifecycle::{ReaderKey, pending};
    use crate::ooxml::xlsx::stream::options::{PartMode, ReadOptions};
    use crate::ooxml::xlsx::styles::StyleTable;
    use std::sync::mpsc;

    const SHEET_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheetData>
<row r="1"><c r="A1" t="s"><v>1</v></c><c r="B1" s="2"><v>3.5</v></c><c r="C1" t="b"><v>1</v></c></row>
<row r="2"><c r="A2" t="inlineStr"><is><t>x &amp; y</t></is></c><c r="B2"><f>B1*2</f><v>7</v></c><c r="C2" t="e"><v>#DIV/0!</v></c><c r="D2" s="1"/></row>
<row r="3"/>
</sheetData>
<hyperlinks><hyperlink ref="A1" r:id="rId1"/><hyperlink ref="B2" location="Sheet2!A1"/></hyperlinks>
</worksheet>"#;

    const RELS_XML: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="http://x" TargetMode="External"/></Relationships>"#;

    fn cached_links(tx: mpsc::Sender<ReaderKey>) -> HyperlinkReader {
        let mut links = HyperlinkReader::new(1, Completion::new(ReaderKey::hyperlinks(1), tx));
        let options = ReadOptions::default().with_hyperlinks(PartMode::Cache);
        let styles = StyleTable::Placeholder;
        let ctx = ReadContext::new(&options, None, &styles);
        links.read(&mut RELS_XML.as_bytes(), &ctx, &mut Vec::<ReadEvent>::new()).unwrap();
        links
    }

    #[test]
    fn test_rows_and_values() {
        let (tx, rx) = mpsc::channel();
        let mut reader = WorksheetReader::new(1, Completion::new(ReaderKey::worksheet(1), tx));
        let options = ReadOptions::default();
        let styles = StyleTable::Placeholder;
        let mut strings = SharedStringTable::new();
        for text in ["zero", "one"] {
            strings.begin_item();
            strings.push(text.to_string(), false);
        }
        let ctx = ReadContext::new(&options, Some(&strings), &styles);
        let mut events: Vec<ReadEvent> = Vec::new();
        reader.read(&mut SHEET_XML.as_bytes(), &ctx, &mut events).unwrap();

        assert_eq!(pending(&rx).collect::<Vec<_>>(), vec![ReaderKey::worksheet(1)]);
        let rows: Vec<Row> = events
            .into_iter()
            .map(|event| match event {
                ReadEvent::Row { sheet: 1, row } => row,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(rows.len(), 3);

        let first = &rows[0];
        assert_eq!(first.number, 1);
        assert_eq!(
            first.cells[0].value,
            CellValue::SharedString {
                index: 1,
                text: Some("one".to_string())
            }
        );
        assert_eq!(first.cells[1].value, CellValue::Number(3.5));
        assert_eq!(first.cells[1].style, 2);
        assert_eq!(first.cells[2].value, CellValue::Bool(true));

        let second = &rows[1];
        assert_eq!(second.cells[0].value, CellValue::Text("x & y".to_string()));
        assert_eq!(second.cells[1].formula.as_deref(), Some("B1*2"));
        assert_eq!(second.cells[1].value, CellValue::Number(7.0));
        assert_eq!(second.cells[2].value, CellValue::Error("#DIV/0!".to_string()));
        assert_eq!(second.cells[3].value, CellValue::Empty);
        assert_eq!(second.cells[3].address, "D2");

        assert_eq!(rows[2].number, 3);
        assert!(rows[2].cells.is_empty());
    }

    #[test]
    fn test_hyperlinks_resolved_through_relationships_reader() {
        let (tx, rx) = mpsc::channel();
        let links = cached_links(tx.clone());
        let mut reader = WorksheetReader::new(1, Completion::new(ReaderKey::worksheet(1), tx));
        let options = ReadOptions::default()
            .with_worksheets(PartMode::Ignore)
            .with_hyperlinks(PartMode::Emit);
        let styles = StyleTable::Placeholder;
        let ctx = ReadContext::new(&options, None, &styles).with_hyperlinks(Some(&links));
        let mut events: Vec<ReadEvent> = Vec::new();
        reader.read(&mut SHEET_XML.as_bytes(), &ctx, &mut events).unwrap();

        assert_eq!(pending(&rx).count(), 2);
        let links: Vec<CellHyperlink> = events
            .into_iter()
            .map(|event| match event {
                ReadEvent::CellHyperlink { sheet: 1, hyperlink } => hyperlink,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].address, "A1");
        assert_eq!(links[0].rel_id.as_deref(), Some("rId1"));
        assert_eq!(links[0].target.as_deref(), Some("http://x"));
        assert_eq!(links[1].location.as_deref(), Some("Sheet2!A1"));
        assert_eq!(links[1].target, None);
    }

    #[test]
    fn test_hyperlinks_cached_without_relationships_reader() {
        let (tx, _rx) = mpsc::channel();
        let mut reader = WorksheetReader::new(4, Completion::new(ReaderKey::worksheet(4), tx));
        let options = ReadOptions::default()
            .with_worksheets(PartMode::Ignore)
            .with_hyperlinks(PartMode::Cache);
        let styles = StyleTable::Placeholder;
        let ctx = ReadContext::new(&options, None, &styles);
        let mut events: Vec<ReadEvent> = Vec::new();
        reader.read(&mut SHEET_XML.as_bytes(), &ctx, &mut events).unwrap();

        assert!(events.is_empty());
        assert_eq!(reader.hyperlinks().len(), 2);
        assert_eq!(reader.hyperlinks()[0].target, None);
    }

    #[test]
    fn test_repeated_part_is_drained_without_second_signal() {
        let (tx, rx) = mpsc::channel();
        let mut reader = WorksheetReader::new(1, Completion::new(ReaderKey::worksheet(1), tx));
        let options = ReadOptions::default();
        let styles = StyleTable::Placeholder;
        let ctx = ReadContext::new(&options, None, &styles);
        let mut events: Vec<ReadEvent> = Vec::new();
        reader.read(&mut SHEET_XML.as_bytes(), &ctx, &mut events).unwrap();
        let rows = events.len();
        reader.read(&mut SHEET_XML.as_bytes(), &ctx, &mut events).unwrap();
        assert_eq!(events.len(), rows);
        assert_eq!(pending(&rx).count(), 1);
    }

    #[test]
    fn test_malformed_sheet_still_signals() {
        let (tx, rx) = mpsc::channel();
        let mut reader = WorksheetReader::new(1, Completion::new(ReaderKey::worksheet(1), tx));
        let options = ReadOptions::default();
        let styles = StyleTable::Placeholder;
        let ctx = ReadContext::new(&options, None, &styles);
        let result = reader.read(&mut "<worksheet><sheetData><row></sheetData>".as_bytes(), &ctx, &mut Vec::<ReadEvent>::new());
        assert!(matches!(result, Err(Error::XmlError(_))));
        assert!(reader.is_finished());
        assert_eq!(pending(&rx).count(), 1);
    }
}
