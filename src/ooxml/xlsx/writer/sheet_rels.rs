//! Incremental writer for worksheet relationship parts
//! (`xl/worksheets/_rels/sheet<N>.xml.rels`).
//!
//! Relationships are serialized as soon as they are registered. The output
//! stream is opened on the first registration, so a sheet without
//! relationships never produces a part.

use std::io::{self, Write};
use std::mem;

use crate::common::error::{Error, Result};
use crate::common::xml::write_escaped_attr;
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::packuri::worksheet_rels_partname;
use crate::ooxml::opc::rel::RelationshipRecord;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const RELS_CLOSE: &str = "</Relationships>";

/// Opens the output stream of a part by its pack URI.
pub trait PartOpener {
    type Stream: Write;

    fn open(&mut self, part_name: &str) -> io::Result<Self::Stream>;
}

impl<F, W> PartOpener for F
where
    F: FnMut(&str) -> io::Result<W>,
    W: Write,
{
    type Stream = W;

    #[inline]
    fn open(&mut self, part_name: &str) -> io::Result<W> {
        self(part_name)
    }
}

/// A hyperlink to register: external target and the cell that uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperlink {
    /// Target URL
    pub target: String,
    /// Cell reference (e.g., "A1")
    pub address: String,
}

impl Hyperlink {
    pub fn new(target: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            address: address.into(),
        }
    }
}

/// A registered hyperlink: its relationship id and cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperlinkRecord {
    /// Relationship ID (e.g., "rId1")
    pub rel_id: String,
    /// Cell reference
    pub address: String,
}

enum StreamState<W> {
    Unopened,
    Open(W),
    Committed(Option<W>),
    /// A write failed; the part may hold a partial element
    Failed,
}

/// Relationship writer for one worksheet.
///
/// Identifiers are `rId1`, `rId2`, ... in registration order, shared by
/// hyperlinks and media.
///
/// Any I/O failure closes the writer: the failing call returns the I/O
/// error and every later registration or commit returns
/// [`Error::WriterClosed`].
///
/// # Examples
///
/// ```
/// use litchi_stream::ooxml::xlsx::writer::{Hyperlink, SheetRelsWriter};
///
/// let mut writer = SheetRelsWriter::new(1, |_: &str| -> std::io::Result<Vec<u8>> { Ok(Vec::new()) });
/// let id = writer.add_hyperlink(Hyperlink::new("https://example.com", "A1"))?;
/// assert_eq!(id, "rId1");
/// writer.commit()?;
/// let xml = String::from_utf8(writer.into_stream().unwrap()).unwrap();
/// assert!(xml.ends_with("</Relationships>"));
/// # Ok::<(), litchi_stream::Error>(())
/// ```
pub struct SheetRelsWriter<O: PartOpener> {
    sheet: u32,
    count: u32,
    hyperlinks: Vec<HyperlinkRecord>,
    opener: O,
    state: StreamState<O::Stream>,
}

impl<O: PartOpener> SheetRelsWriter<O> {
    /// Create a writer for a 1-based sheet number. Nothing is opened yet.
    pub fn new(sheet: u32, opener: O) -> Self {
        Self {
            sheet,
            count: 0,
            hyperlinks: Vec::new(),
            opener,
            state: StreamState::Unopened,
        }
    }

    #[inline]
    pub fn sheet(&self) -> u32 {
        self.sheet
    }

    /// Pack URI of the part this writer produces.
    #[inline]
    pub fn part_name(&self) -> String {
        worksheet_rels_partname(self.sheet)
    }

    /// Register an external hyperlink and record which cell uses it.
    ///
    /// The target is attribute-escaped.
    pub fn add_hyperlink(&mut self, hyperlink: Hyperlink) -> Result<String> {
        let rel_id = self.write_relationship(&RelationshipRecord::hyperlink(hyperlink.target))?;
        self.hyperlinks.push(HyperlinkRecord {
            rel_id: rel_id.clone(),
            address: hyperlink.address,
        });
        Ok(rel_id)
    }

    /// Register an arbitrary relationship (images and the like).
    ///
    /// Without a target mode the target is written verbatim and must
    /// already be escaped.
    pub fn add_media(&mut self, record: &RelationshipRecord) -> Result<String> {
        self.write_relationship(record)
    }

    /// Close the fragment and flush the stream.
    ///
    /// Without registrations nothing is opened or written. Committing twice
    /// is a no-op.
    pub fn commit(&mut self) -> Result<()> {
        match mem::replace(&mut self.state, StreamState::Failed) {
            StreamState::Unopened => {
                self.state = StreamState::Committed(None);
                Ok(())
            },
            StreamState::Open(mut stream) => {
                stream.write_all(RELS_CLOSE.as_bytes())?;
                stream.flush()?;
                log::debug!("committed {} relationships for sheet {}", self.count, self.sheet);
                self.state = StreamState::Committed(Some(stream));
                Ok(())
            },
            committed @ StreamState::Committed(_) => {
                self.state = committed;
                Ok(())
            },
            StreamState::Failed => Err(Error::WriterClosed(self.sheet)),
        }
    }

    #[inline]
    pub fn is_committed(&self) -> bool {
        matches!(self.state, StreamState::Committed(_))
    }

    /// Whether a write failed and the writer was closed.
    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self.state, StreamState::Failed)
    }

    /// Give back the output stream, if one was opened and never failed.
    pub fn into_stream(self) -> Option<O::Stream> {
        match self.state {
            StreamState::Open(stream) | StreamState::Committed(Some(stream)) => Some(stream),
            StreamState::Unopened | StreamState::Committed(None) | StreamState::Failed => None,
        }
    }

    /// Number of relationships written, hyperlinks and media.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Registered hyperlinks in registration order.
    #[inline]
    pub fn hyperlinks(&self) -> &[HyperlinkRecord] {
        &self.hyperlinks
    }

    /// Number of registered hyperlinks.
    #[inline]
    pub fn len(&self) -> usize {
        self.hyperlinks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hyperlinks.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&HyperlinkRecord> {
        self.hyperlinks.get(index)
    }

    /// Handle that can only register hyperlinks.
    pub fn hyperlinks_proxy(&mut self) -> HyperlinksProxy<'_, O> {
        HyperlinksProxy { writer: self }
    }

    fn ensure_open(&mut self) -> Result<&mut O::Stream> {
        if let StreamState::Unopened = self.state {
            let part_name = self.part_name();
            log::debug!("opening {}", part_name);
            let mut stream = self.opener.open(&part_name)?;
            stream.write_all(XML_DECLARATION.as_bytes())?;
            stream.write_all(br#"<Relationships xmlns=""#)?;
            stream.write_all(namespace::OPC_RELATIONSHIPS.as_bytes())?;
            stream.write_all(br#"">"#)?;
            self.state = StreamState::Open(stream);
        }
        match &mut self.state {
            StreamState::Open(stream) => Ok(stream),
            _ => Err(Error::WriterClosed(self.sheet)),
        }
    }

    fn write_relationship(&mut self, record: &RelationshipRecord) -> Result<String> {
        if matches!(self.state, StreamState::Committed(_) | StreamState::Failed) {
            return Err(Error::WriterClosed(self.sheet));
        }
        let mut rel_id = String::with_capacity(8);
        rel_id.push_str("rId");
        rel_id.push_str(itoa::Buffer::new().format(self.count + 1));

        let written = self
            .ensure_open()
            .and_then(|stream| write_element(stream, &rel_id, record).map_err(Error::from));
        if let Err(e) = written {
            log::warn!("closing relationships writer for sheet {}: {}", self.sheet, e);
            self.state = StreamState::Failed;
            return Err(e);
        }
        self.count += 1;
        Ok(rel_id)
    }
}

fn write_element<W: Write + ?Sized>(out: &mut W, rel_id: &str, record: &RelationshipRecord) -> io::Result<()> {
    out.write_all(br#"<Relationship Id=""#)?;
    out.write_all(rel_id.as_bytes())?;
    out.write_all(br#"" Type=""#)?;
    out.write_all(record.rel_type.uri().as_bytes())?;
    out.write_all(br#"" Target=""#)?;
    match record.target_mode {
        Some(mode) => {
            write_escaped_attr(out, &record.target)?;
            out.write_all(br#"" TargetMode=""#)?;
            out.write_all(mode.as_str().as_bytes())?;
        },
        None => out.write_all(record.target.as_bytes())?,
    }
    out.write_all(br#""/>"#)
}

/// Accepts hyperlinks one at a time.
pub trait HyperlinkSink {
    /// Register a hyperlink, returning its relationship id.
    fn push(&mut self, hyperlink: Hyperlink) -> Result<String>;
}

/// Forwarding handle over a [`SheetRelsWriter`] for row writers that must
/// not see the writer's counters or stream.
pub struct HyperlinksProxy<'a, O: PartOpener> {
    writer: &'a mut SheetRelsWriter<O>,
}

impl<O: PartOpener> HyperlinkSink for HyperlinksProxy<'_, O> {
    #[inline]
    fn push(&mut self, hyperlink: Hyperlink) -> Result<String> {
        self.writer.add_hyperlink(hyperlink)
    }
}
