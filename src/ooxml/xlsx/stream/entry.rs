//! Container input and forward-only entry enumeration.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::PathBuf;

use zip::ZipArchive;

use crate::common::error::{Error, Result};

/// Local file header signature.
const ZIP_LOCAL_SIGNATURE: [u8; 4] = *b"PK\x03\x04";
/// End of central directory signature (archive without entries).
const ZIP_EMPTY_SIGNATURE: [u8; 4] = *b"PK\x05\x06";
/// General purpose flag: sizes and CRC follow the data in a descriptor.
const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

/// Where a workbook is read from.
pub enum ReadInput {
    /// Filesystem path; the file is opened when the session starts
    Path(PathBuf),
    /// Any forward-only byte stream
    Stream(Box<dyn Read + Send>),
}

impl ReadInput {
    pub fn stream<R: Read + Send + 'static>(reader: R) -> Self {
        ReadInput::Stream(Box::new(reader))
    }
}

impl fmt::Debug for ReadInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadInput::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ReadInput::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<PathBuf> for ReadInput {
    fn from(path: PathBuf) -> Self {
        ReadInput::Path(path)
    }
}

impl From<&std::path::Path> for ReadInput {
    fn from(path: &std::path::Path) -> Self {
        ReadInput::Path(path.to_path_buf())
    }
}

impl From<&str> for ReadInput {
    fn from(path: &str) -> Self {
        ReadInput::Path(PathBuf::from(path))
    }
}

impl From<String> for ReadInput {
    fn from(path: String) -> Self {
        ReadInput::Path(PathBuf::from(path))
    }
}

impl From<Box<dyn Read + Send>> for ReadInput {
    fn from(reader: Box<dyn Read + Send>) -> Self {
        ReadInput::Stream(reader)
    }
}

/// One container entry: its path and a reader over its decompressed bytes.
pub struct ContainerEntry<'a> {
    pub path: String,
    pub reader: Box<dyn Read + 'a>,
}

impl fmt::Debug for ContainerEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerEntry").field("path", &self.path).finish_non_exhaustive()
    }
}

/// Forward-only enumeration of container entries.
///
/// An entry borrows the source, so the previous entry must be dropped
/// before the next one is requested.
pub trait EntrySource {
    fn next_entry(&mut self) -> Result<Option<ContainerEntry<'_>>>;
}

/// Raised by [`HeaderTap`] when a local header defers its sizes.
#[derive(Debug, thiserror::Error)]
#[error("entry sizes are deferred to a data descriptor")]
struct DeferredSizes;

/// Watches the first bytes read since the last [`mark`](HeaderTap::mark)
/// and fails the read once they show a local header whose sizes are
/// deferred to a data descriptor.
struct HeaderTap<R> {
    inner: R,
    head: [u8; 8],
    filled: usize,
}

impl<R: Read> HeaderTap<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            head: [0; 8],
            filled: 0,
        }
    }

    fn mark(&mut self) {
        self.filled = 0;
    }

    fn defers_sizes(&self) -> bool {
        self.head[..4] == ZIP_LOCAL_SIGNATURE
            && u16::from_le_bytes([self.head[6], self.head[7]]) & FLAG_DATA_DESCRIPTOR != 0
    }
}

impl<R: Read> Read for HeaderTap<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if self.filled < self.head.len() {
            let take = (self.head.len() - self.filled).min(n);
            self.head[self.filled..self.filled + take].copy_from_slice(&buf[..take]);
            self.filled += take;
            if self.filled == self.head.len() && self.defers_sizes() {
                return Err(io::Error::new(io::ErrorKind::Unsupported, DeferredSizes));
            }
        }
        Ok(n)
    }
}

fn is_deferred_sizes(err: &io::Error) -> bool {
    err.get_ref().is_some_and(|inner| inner.is::<DeferredSizes>())
}

/// Entries of a ZIP archive read from its local headers, in archive order.
///
/// The central directory is never consulted, so the input need not be
/// seekable. Entries whose sizes are deferred to a trailing data descriptor
/// cannot be delimited this way and fail with [`Error::DataDescriptor`].
pub struct ZipEntrySource<R> {
    reader: HeaderTap<R>,
    exhausted: bool,
}

impl<R: Read> ZipEntrySource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: HeaderTap::new(reader),
            exhausted: false,
        }
    }

    /// Source that yields no entries.
    pub fn empty(reader: R) -> Self {
        Self {
            reader: HeaderTap::new(reader),
            exhausted: true,
        }
    }
}

impl<R: Read> EntrySource for ZipEntrySource<R> {
    fn next_entry(&mut self) -> Result<Option<ContainerEntry<'_>>> {
        if self.exhausted {
            return Ok(None);
        }
        self.reader.mark();
        match zip::read::read_zipfile_from_stream(&mut self.reader) {
            Ok(Some(file)) => {
                let path = file.name().to_owned();
                Ok(Some(ContainerEntry {
                    path,
                    reader: Box::new(file),
                }))
            },
            Ok(None) => {
                self.exhausted = true;
                Ok(None)
            },
            Err(zip::result::ZipError::Io(e)) if is_deferred_sizes(&e) => Err(Error::DataDescriptor),
            Err(e) => Err(e.into()),
        }
    }
}

/// Entries of a seekable ZIP archive, enumerated through its central
/// directory.
///
/// Sizes come from the directory, so entries written with data descriptors
/// are readable.
pub struct ArchiveEntrySource<R> {
    archive: ZipArchive<R>,
    next: usize,
}

impl<R: Read + Seek> ArchiveEntrySource<R> {
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
            next: 0,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }
}

impl<R: Read + Seek> EntrySource for ArchiveEntrySource<R> {
    fn next_entry(&mut self) -> Result<Option<ContainerEntry<'_>>> {
        if self.next >= self.archive.len() {
            return Ok(None);
        }
        let index = self.next;
        self.next += 1;
        let file = self.archive.by_index(index)?;
        let path = file.name().to_owned();
        Ok(Some(ContainerEntry {
            path,
            reader: Box::new(file),
        }))
    }
}

/// Entry source chosen for a [`ReadInput`].
pub enum PackageEntries {
    /// File on disk, read through its central directory
    Archive(ArchiveEntrySource<BufReader<File>>),
    /// Forward-only stream, read through local headers
    Stream(ZipEntrySource<Box<dyn Read + Send>>),
}

impl EntrySource for PackageEntries {
    fn next_entry(&mut self) -> Result<Option<ContainerEntry<'_>>> {
        match self {
            PackageEntries::Archive(source) => source.next_entry(),
            PackageEntries::Stream(source) => source.next_entry(),
        }
    }
}

/// Entry payload that remembers whether the underlying reader failed.
///
/// Decompression and transport failures surface through whatever parser
/// reads the payload, often rewrapped; the tap keeps them distinguishable
/// from a malformed part.
pub(crate) struct PayloadTap<R> {
    inner: R,
    failure: Option<String>,
}

impl<R: Read> PayloadTap<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, failure: None }
    }

    /// The first read failure, if any.
    pub(crate) fn take_failure(&mut self) -> Option<String> {
        self.failure.take()
    }
}

impl<R: Read> Read for PayloadTap<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).inspect_err(|e| {
            if e.kind() != io::ErrorKind::Interrupted && self.failure.is_none() {
                self.failure = Some(e.to_string());
            }
        })
    }
}

fn read_signature<R: Read + ?Sized>(reader: &mut R) -> Result<[u8; 4]> {
    let mut signature = [0u8; 4];
    match reader.read_exact(&mut signature) {
        Ok(()) => Ok(signature),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(Error::UnrecognizedInput("input is shorter than a ZIP header".to_string()))
        },
        Err(e) => Err(Error::Io(e)),
    }
}

fn unrecognized(signature: [u8; 4]) -> Error {
    Error::UnrecognizedInput(format!("not a ZIP container (signature {:02X?})", signature))
}

/// Open the input and check that it starts with a ZIP signature.
///
/// Files are rewound after the check and read through their central
/// directory. Streams get the signature bytes pushed back in front so the
/// entry source sees the archive from its first byte.
pub fn open_input(input: ReadInput) -> Result<PackageEntries> {
    match input {
        ReadInput::Path(path) => {
            if path.as_os_str().is_empty() {
                return Err(Error::UnrecognizedInput("empty path".to_string()));
            }
            log::debug!("opening workbook {}", path.display());
            let mut file = BufReader::new(File::open(&path)?);
            let signature = read_signature(&mut file)?;
            if signature != ZIP_LOCAL_SIGNATURE && signature != ZIP_EMPTY_SIGNATURE {
                return Err(unrecognized(signature));
            }
            file.seek(SeekFrom::Start(0))?;
            let source = ArchiveEntrySource::new(file)?;
            log::debug!("central directory lists {} entries", source.len());
            Ok(PackageEntries::Archive(source))
        },
        ReadInput::Stream(mut reader) => match read_signature(&mut reader)? {
            ZIP_LOCAL_SIGNATURE => {
                let chained: Box<dyn Read + Send> = Box::new(Cursor::new(ZIP_LOCAL_SIGNATURE).chain(reader));
                Ok(PackageEntries::Stream(ZipEntrySource::new(chained)))
            },
            ZIP_EMPTY_SIGNATURE => {
                log::debug!("archive has no entries");
                Ok(PackageEntries::Stream(ZipEntrySource::empty(reader)))
            },
            other => Err(unrecognized(other)),
        },
    }
}
