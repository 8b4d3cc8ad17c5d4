//! Part-name helpers for container entries.
//!
//! ZIP entry names inside a package have no leading slash, while OPC pack
//! URIs always begin with one. Entries produced by some writers also use
//! backslashes. Everything is canonicalized to the ZIP form before routing.

use std::borrow::Cow;

use super::constants::part_name;

/// Canonicalize a ZIP entry name: strip leading slashes and use `/`
/// separators.
///
/// Borrows when the name is already canonical.
pub fn canonical_entry_name(name: &str) -> Cow<'_, str> {
    let trimmed = name.trim_start_matches(['/', '\\']);
    if trimmed.contains('\\') {
        Cow::Owned(trimmed.replace('\\', "/"))
    } else {
        Cow::Borrowed(trimmed)
    }
}

/// Extract `N` from `<dir>sheet<N><suffix>`.
///
/// `N` must be a positive decimal integer that fits in a `u32`.
fn numbered_sheet_part(name: &str, dir: &str, suffix: &str) -> Option<u32> {
    let digits = name
        .strip_prefix(dir)?
        .strip_prefix("sheet")?
        .strip_suffix(suffix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|&n| n > 0)
}

/// Sheet number of a worksheet part (`xl/worksheets/sheet<N>.xml`).
#[inline]
pub fn worksheet_number(name: &str) -> Option<u32> {
    numbered_sheet_part(name, part_name::WORKSHEETS_DIR, ".xml")
}

/// Sheet number of a worksheet relationships part
/// (`xl/worksheets/_rels/sheet<N>.xml.rels`).
#[inline]
pub fn worksheet_rels_number(name: &str) -> Option<u32> {
    numbered_sheet_part(name, part_name::WORKSHEET_RELS_DIR, ".xml.rels")
}

/// Pack URI of the relationships part for a 1-based sheet number.
pub fn worksheet_rels_partname(sheet: u32) -> String {
    let mut buf = itoa::Buffer::new();
    let mut uri = String::with_capacity(40);
    uri.push('/');
    uri.push_str(part_name::WORKSHEET_RELS_DIR);
    uri.push_str("sheet");
    uri.push_str(buf.format(sheet));
    uri.push_str(".xml.rels");
    uri
}
