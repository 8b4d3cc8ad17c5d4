//! Entry classification.

use crate::ooxml::opc::constants::part_name;
use crate::ooxml::opc::packuri::{canonical_entry_name, worksheet_number, worksheet_rels_number};

use super::event::{EntryKind, EntryNotice};

/// Classify a container entry by its path.
///
/// Matching is exact on the canonical name, so `xl/worksheets/sheet1.xml.bak`
/// or `xl/worksheets/sheet01x.xml` are unrecognized.
pub fn classify(path: &str) -> EntryKind {
    let name = canonical_entry_name(path);
    match name.as_ref() {
        part_name::PACKAGE_RELS => EntryKind::PackageRelationships,
        part_name::WORKBOOK => EntryKind::Workbook,
        part_name::WORKBOOK_RELS => EntryKind::WorkbookRelationships,
        part_name::SHARED_STRINGS => EntryKind::SharedStrings,
        part_name::STYLES => EntryKind::Styles,
        other => {
            if let Some(sheet) = worksheet_number(other) {
                EntryKind::Worksheet(sheet)
            } else if let Some(sheet) = worksheet_rels_number(other) {
                EntryKind::Hyperlinks(sheet)
            } else {
                EntryKind::Unrecognized
            }
        },
    }
}

/// Classify and build the notice raised for an entry.
pub fn notice(path: &str) -> EntryNotice {
    EntryNotice {
        path: canonical_entry_name(path).into_owned(),
        kind: classify(path),
    }
}
