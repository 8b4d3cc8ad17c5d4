//! Sub-reader for worksheet relationship parts
//! (`xl/worksheets/_rels/sheet<N>.xml.rels`).

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::common::error::{Error, Result};
use crate::ooxml::opc::rel::{RelType, Relationship, TargetMode};

use super::event::{EventSink, ReadEvent};
use super::lifecycle::Completion;
use super::options::ReadOptions;
use super::reader::{ReadContext, SubReader, drain};

/// Reads the hyperlink relationships of one sheet.
#[derive(Debug)]
pub struct HyperlinkReader {
    sheet: u32,
    hyperlinks: Option<HashMap<String, Relationship>>,
    completion: Option<Completion>,
}

impl HyperlinkReader {
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

    /// Cached hyperlink relationship by id (hyperlinks=cache only).
    pub fn get(&self, rel_id: &str) -> Option<&Relationship> {
        self.hyperlinks.as_ref()?.get(rel_id)
    }

    /// Number of cached hyperlink relationships.
    pub fn len(&self) -> usize {
        self.hyperlinks.as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the cached relationships in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.hyperlinks.iter().flat_map(HashMap::values)
    }

    fn parse(&mut self, input: &mut dyn BufRead, options: &ReadOptions, sink: &mut dyn EventSink) -> Result<()> {
        let emit = options.emit_hyperlinks();
        let mut reader = Reader::from_reader(input);
        let mut buf = Vec::with_capacity(512);

        loop {
            buf.clear();
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"Relationship" => {
                    let Some(relationship) = parse_relationship(&reader, &e)? else {
                        continue;
                    };
                    if relationship.rel_type != RelType::Hyperlink {
                        continue;
                    }
                    if emit {
                        sink.emit(ReadEvent::Hyperlink {
                            sheet: self.sheet,
                            relationship,
                        })?;
                    } else if let Some(cache) = self.hyperlinks.as_mut() {
                        cache.insert(relationship.id.clone(), relationship);
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlError(format!("XML error in relationships: {}", e))),
                _ => {},
            }
        }

        Ok(())
    }
}

/// Read one `Relationship` element. Elements without an `Id` are skipped.
fn parse_relationship<R: BufRead>(reader: &Reader<R>, start: &BytesStart<'_>) -> Result<Option<Relationship>> {
    let mut id = None;
    let mut rel_type = None;
    let mut target = String::new();
    let mut target_mode = None;

    for attr in start.attributes() {
        let attr = attr?;
        let value = attr.decode_and_unescape_value(reader.decoder())?;
        match attr.key.local_name().as_ref() {
            b"Id" => id = Some(value.into_owned()),
            b"Type" => rel_type = Some(RelType::from_uri(&value)),
            b"Target" => target = value.into_owned(),
            b"TargetMode" => target_mode = TargetMode::parse(&value),
            _ => {},
        }
    }

    Ok(id.map(|id| Relationship {
        id,
        rel_type: rel_type.unwrap_or_else(|| RelType::Other(String::new())),
        target,
        target_mode,
    }))
}

impl SubReader for HyperlinkReader {
    fn read(&mut self, input: &mut dyn BufRead, ctx: &ReadContext<'_>, sink: &mut dyn EventSink) -> Result<()> {
        let Some(completion) = self.completion.take() else {
            log::warn!("hyperlinks {} already finished, draining repeated part", self.sheet);
            return drain(input);
        };
        if !ctx.options.emit_hyperlinks() && !ctx.options.cache_hyperlinks() {
            completion.signal();
            return drain(input);
        }
        if ctx.options.cache_hyperlinks() && self.hyperlinks.is_none() {
            self.hyperlinks = Some(HashMap::new());
        }
        let result = self.parse(input, ctx.options, sink);
        completion.signal();
        result
    }

    #[inline]
    fn is_finished(&self) -> bool {
        self.completion.is_none()
    }
}
