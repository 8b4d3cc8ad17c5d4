//! Unified error type for streaming workbook reads and relationship writes.
use thiserror::Error;

/// Main error type for litchi-stream operations.
///
/// Every variant is `Send`, so errors can be forwarded through event
/// channels as [`ReadEvent::Error`](crate::ooxml::xlsx::stream::ReadEvent::Error).
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input is neither a ZIP byte stream nor a usable file path
    #[error("Could not recognise input: {0}")]
    UnrecognizedInput(String),

    /// The container itself could not be decompressed
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// A forward-only stream met an entry whose sizes follow its data
    #[error("ZIP entry defers its sizes to a data descriptor and cannot be read from a stream; open the workbook by path")]
    DataDescriptor,

    /// Tokenizer-level failure inside one container entry
    #[error("Malformed entry {part}: {message}")]
    MalformedEntry { part: String, message: String },

    /// XML tokenizer error not yet attributed to a part
    #[error("XML error: {0}")]
    XmlError(String),

    /// A relationship was registered after the writer was committed or failed
    #[error("Relationships writer for sheet {0} is closed")]
    WriterClosed(u32),

    /// The event consumer went away before the session ended
    #[error("Event receiver closed")]
    Cancelled,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Attach the container path of the failing part to a tokenizer error.
    pub(crate) fn in_part(self, part: &str) -> Self {
        match self {
            Error::XmlError(message) => Error::MalformedEntry {
                part: part.to_string(),
                message,
            },
            other => other,
        }
    }

    /// Whether this error ends the whole session rather than a single part.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ZipError(_) | Error::DataDescriptor | Error::Cancelled)
    }
}

/// Result type for litchi-stream operations.
pub type Result<T> = std::result::Result<T, Error>;
