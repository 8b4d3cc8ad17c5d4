//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from the
//! tokenizer and decompressor error types to the unified Error type.

use super::types::Error;

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlError(format!("attribute error: {}", err))
    }
}

impl From<quick_xml::encoding::EncodingError> for Error {
    fn from(err: quick_xml::encoding::EncodingError) -> Self {
        Error::XmlError(format!("encoding error: {}", err))
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::XmlError(format!("invalid UTF-8: {}", err))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::ZipError(e.to_string()),
            other => Error::ZipError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_error_is_attributed_to_part() {
        let err = Error::XmlError("unexpected end".to_string()).in_part("xl/sharedStrings.xml");
        match err {
            Error::MalformedEntry { part, message } => {
                assert_eq!(part, "xl/sharedStrings.xml");
                assert_eq!(message, "unexpected end");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::ZipError("bad header".into()).is_fatal());
        assert!(Error::Cancelled.is_fatal());
        assert!(Error::DataDescriptor.is_fatal());
        assert!(!Error::WriterClosed(1).is_fatal());
        assert!(
            !Error::MalformedEntry {
                part: "xl/styles.xml".into(),
                message: "x".into()
            }
            .is_fatal()
        );
    }
}
