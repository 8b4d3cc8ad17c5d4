//! Incremental parser for `xl/styles.xml`.

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{CellStyle, Styles};
use crate::common::error::{Error, Result};

/// Parse the number formats and cell formats of a style part.
pub(super) fn parse_styles<R: BufRead>(input: R) -> Result<Styles> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut styles = Styles::new();
    let mut buf = Vec::with_capacity(1024);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"numFmts" => parse_number_formats(&mut reader, &mut styles.number_formats)?,
                b"cellXfs" => parse_cell_xfs(&mut reader, &mut styles.cell_xfs)?,
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("XML parsing error: {}", e))),
            _ => {},
        }
    }

    Ok(styles)
}

/// Parse number formats section.
fn parse_number_formats<R: BufRead>(
    reader: &mut Reader<R>,
    number_formats: &mut HashMap<u32, String>,
) -> Result<()> {
    let mut buf = Vec::with_capacity(512);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"numFmt" => {
                let mut id = None;
                let mut code = None;

                for attr in e.attributes().flatten() {
                    match attr.key.local_name().as_ref() {
                        b"numFmtId" => {
                            if let Ok(value) = attr.decode_and_unescape_value(reader.decoder()) {
                                id = value.parse::<u32>().ok();
                            }
                        },
                        b"formatCode" => {
                            if let Ok(value) = attr.decode_and_unescape_value(reader.decoder()) {
                                code = Some(value.into_owned());
                            }
                        },
                        _ => {},
                    }
                }

                if let (Some(id), Some(code)) = (id, code) {
                    number_formats.insert(id, code);
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"numFmts" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("XML error in numFmts: {}", e))),
            _ => {},
        }
    }

    Ok(())
}

/// Parse cellXfs section. `xf` children may be empty or carry nested
/// elements (alignment, protection), which are skipped.
fn parse_cell_xfs<R: BufRead>(reader: &mut Reader<R>, cell_xfs: &mut Vec<CellStyle>) -> Result<()> {
    let mut buf = Vec::with_capacity(512);
    let mut depth = 0usize;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) if depth == 0 && e.local_name().as_ref() == b"xf" => {
                cell_xfs.push(parse_xf(reader, &e));
            },
            Ok(Event::Start(e)) => {
                if depth == 0 && e.local_name().as_ref() == b"xf" {
                    cell_xfs.push(parse_xf(reader, &e));
                }
                depth += 1;
            },
            Ok(Event::End(e)) => {
                if depth == 0 {
                    debug_assert_eq!(e.local_name().as_ref(), b"cellXfs");
                    break;
                }
                depth -= 1;
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("XML error in cellXfs: {}", e))),
            _ => {},
        }
    }

    Ok(())
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value == "true"
}

/// Read the attributes of a single `xf` element.
fn parse_xf<R: BufRead>(reader: &Reader<R>, start: &BytesStart<'_>) -> CellStyle {
    let mut style = CellStyle::new();

    for attr in start.attributes().flatten() {
        let Ok(value) = attr.decode_and_unescape_value(reader.decoder()) else {
            continue;
        };
        match attr.key.local_name().as_ref() {
            b"numFmtId" => style.num_fmt_id = value.parse::<u32>().ok(),
            b"fontId" => style.font_id = value.parse::<u32>().ok(),
            b"fillId" => style.fill_id = value.parse::<u32>().ok(),
            b"borderId" => style.border_id = value.parse::<u32>().ok(),
            b"xfId" => style.xf_id = value.parse::<u32>().ok(),
            b"applyNumberFormat" => style.apply_number_format = parse_flag(&value),
            b"quotePrefix" => style.quote_prefix = parse_flag(&value),
            _ => {},
        }
    }

    style
}
