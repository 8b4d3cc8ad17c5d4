//! Text-node helpers over quick-xml events.
//!
//! quick-xml reports a single text node as several events: plain runs,
//! CDATA sections and entity references (`&amp;`, `&#169;`) each arrive
//! separately. Callers accumulate the chunks returned here until the
//! enclosing element closes.

use std::borrow::Cow;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;

use crate::common::error::{Error, Result};

/// Return the text carried by `event`, or `None` for non-text events.
///
/// Unknown named entities are kept verbatim rather than failing the part.
pub fn text_chunk<'a>(event: &'a Event<'_>) -> Result<Option<Cow<'a, str>>> {
    match event {
        Event::Text(e) => Ok(Some(Cow::Borrowed(std::str::from_utf8(e.as_ref())?))),
        Event::CData(e) => Ok(Some(Cow::Borrowed(std::str::from_utf8(e.as_ref())?))),
        Event::GeneralRef(r) => {
            if r.is_char_ref() {
                return match r.resolve_char_ref()? {
                    Some(ch) => Ok(Some(Cow::Owned(ch.to_string()))),
                    None => Err(Error::XmlError(format!(
                        "invalid character reference &{};",
                        String::from_utf8_lossy(r.as_ref())
                    ))),
                };
            }
            let name = std::str::from_utf8(r.as_ref())?;
            match resolve_predefined_entity(name) {
                Some(resolved) => Ok(Some(Cow::Borrowed(resolved))),
                None => {
                    log::warn!("unknown entity &{};, keeping it verbatim", name);
                    Ok(Some(Cow::Owned(format!("&{};", name))))
                },
            }
        },
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::Reader;

    fn collect_text(xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut chunks = Vec::new();
        loop {
            let event = reader.read_event().unwrap();
            if matches!(event, Event::Eof) {
                break;
            }
            if let Some(chunk) = text_chunk(&event).unwrap() {
                chunks.push(chunk.into_owned());
            }
        }
        chunks
    }

    #[test]
    fn test_entities_arrive_as_separate_chunks() {
        let chunks = collect_text("<t>A &amp; B&#65;</t>");
        assert_eq!(chunks.concat(), "A & BA");
        assert!(chunks.len() > 1);
    }

    #[test]
    fn test_cdata_is_text() {
        assert_eq!(collect_text("<t><![CDATA[<raw>]]></t>").concat(), "<raw>");
    }

    #[test]
    fn test_unknown_entity_kept_verbatim() {
        assert_eq!(collect_text("<t>&nbsp;</t>").concat(), "&nbsp;");
    }
}
