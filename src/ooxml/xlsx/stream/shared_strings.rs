//! Incremental shared-string extraction.
//!
//! The extractor is a small state machine over tokenizer events: an opening
//! `<t>` starts a text node, text chunks are appended, and the closing
//! `</t>` completes one string. Everything else is passed over. A text node
//! may be delivered in any number of chunks.
//!
//! Cells reference shared strings by `<si>` item, and a rich-text item holds
//! one `<t>` per run. The cached store therefore keeps the offset at which
//! each item starts, so item text can be rebuilt from its runs.

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::common::error::{Error, Result};
use crate::common::xml::text_chunk;

use super::event::{EventSink, ReadEvent};

/// Tokenizer events the extractor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextToken<'a> {
    /// Opening tag, by local name
    Open(&'a [u8]),
    /// One chunk of character data
    Text(&'a str),
    /// Closing tag, by local name
    Close(&'a [u8]),
}

/// Cached shared strings.
///
/// `strings` holds every `<t>` text in discovery order. `items` holds, per
/// `<si>`, the offset of its first string; `phonetic` the offsets of strings
/// read inside `<rPh>`, which are kept but not part of the item text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStringTable {
    strings: Vec<String>,
    items: Vec<usize>,
    phonetic: Vec<usize>,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of a `<si>` item at the current store offset.
    pub fn begin_item(&mut self) {
        self.items.push(self.strings.len());
    }

    /// Append one completed `<t>` text.
    pub fn push(&mut self, text: String, phonetic: bool) {
        if phonetic {
            self.phonetic.push(self.strings.len());
        }
        self.strings.push(text);
    }

    /// Every `<t>` text in discovery order.
    #[inline]
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Number of `<si>` items; without item markers every string counts as
    /// one.
    pub fn item_count(&self) -> usize {
        if self.items.is_empty() { self.strings.len() } else { self.items.len() }
    }

    /// Text of the zero-based `index`th item, its runs concatenated.
    pub fn item(&self, index: usize) -> Option<String> {
        if self.items.is_empty() {
            return self.strings.get(index).cloned();
        }
        let start = *self.items.get(index)?;
        let end = self.items.get(index + 1).copied().unwrap_or(self.strings.len());
        let mut text = String::new();
        for offset in start..end {
            if self.phonetic.binary_search(&offset).is_err() {
                text.push_str(&self.strings[offset]);
            }
        }
        Some(text)
    }
}

/// Where completed strings go.
pub enum StringEgress<'a> {
    /// Append to the session's ordered store
    Cache(&'a mut SharedStringTable),
    /// Raise one [`ReadEvent::SharedString`] per string
    Emit(&'a mut dyn EventSink),
}

/// Text-node accumulator.
#[derive(Debug, Default)]
pub struct SharedStringExtractor {
    in_text: bool,
    text: String,
    next_index: usize,
}

impl SharedStringExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one token. Returns the zero-based discovery index and text of a
    /// string completed by this token.
    pub fn feed(&mut self, token: TextToken<'_>) -> Option<(usize, String)> {
        match token {
            TextToken::Open(b"t") => {
                self.in_text = true;
                self.text.clear();
                None
            },
            TextToken::Text(chunk) if self.in_text => {
                self.text.push_str(chunk);
                None
            },
            TextToken::Close(b"t") if self.in_text => {
                self.in_text = false;
                let index = self.next_index;
                self.next_index += 1;
                Some((index, std::mem::take(&mut self.text)))
            },
            _ => None,
        }
    }

    /// Number of strings completed so far.
    #[inline]
    pub fn count(&self) -> usize {
        self.next_index
    }
}

fn deliver(egress: &mut StringEgress<'_>, index: usize, text: String, phonetic: bool) -> Result<()> {
    match egress {
        StringEgress::Cache(table) => {
            table.push(text, phonetic);
            Ok(())
        },
        StringEgress::Emit(sink) => sink.emit(ReadEvent::SharedString { index, text }),
    }
}

fn begin_item(egress: &mut StringEgress<'_>) {
    if let StringEgress::Cache(table) = egress {
        table.begin_item();
    }
}

/// Tokenize a shared-string part and route every completed string to
/// `egress`. Returns the number of strings found.
///
/// Tokenizer failures are returned as [`Error::XmlError`]; strings completed
/// before the failure have already been delivered.
pub fn extract_shared_strings<R: BufRead>(input: R, mut egress: StringEgress<'_>) -> Result<usize> {
    let mut reader = Reader::from_reader(input);
    let mut extractor = SharedStringExtractor::new();
    let mut buf = Vec::with_capacity(1024);
    let mut in_phonetic = false;

    loop {
        buf.clear();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::XmlError(format!("XML error in shared strings: {}", e)))?;
        let completed = match &event {
            Event::Start(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"si" => begin_item(&mut egress),
                    b"rPh" => in_phonetic = true,
                    _ => {},
                }
                extractor.feed(TextToken::Open(name.as_ref()))
            },
            Event::End(e) => {
                let name = e.local_name();
                if name.as_ref() == b"rPh" {
                    in_phonetic = false;
                }
                extractor.feed(TextToken::Close(name.as_ref()))
            },
            Event::Empty(e) => {
                // `<t/>` is an empty text node, `<si/>` an empty item.
                let name = e.local_name();
                if name.as_ref() == b"si" {
                    begin_item(&mut egress);
                }
                extractor.feed(TextToken::Open(name.as_ref()));
                extractor.feed(TextToken::Close(name.as_ref()))
            },
            Event::Eof => break,
            other => match text_chunk(other)? {
                Some(chunk) => extractor.feed(TextToken::Text(&chunk)),
                None => None,
            },
        };
        if let Some((index, text)) = completed {
            deliver(&mut egress, index, text, in_phonetic)?;
        }
    }

    Ok(extractor.count())
}
