//! Constant values used by the streaming workbook reader and the
//! relationship writer: part names, namespaces and relationship types.

/// Well-known part names inside an `.xlsx` package.
pub mod part_name {
    /// Package-level relationships
    pub const PACKAGE_RELS: &str = "_rels/.rels";

    /// Workbook definition
    pub const WORKBOOK: &str = "xl/workbook.xml";

    /// Workbook relationships
    pub const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";

    /// Shared string table
    pub const SHARED_STRINGS: &str = "xl/sharedStrings.xml";

    /// Style table
    pub const STYLES: &str = "xl/styles.xml";

    /// Directory holding worksheet parts (`sheet<N>.xml`)
    pub const WORKSHEETS_DIR: &str = "xl/worksheets/";

    /// Directory holding worksheet relationship parts (`sheet<N>.xml.rels`)
    pub const WORKSHEET_RELS_DIR: &str = "xl/worksheets/_rels/";
}

/// XML namespace URIs
pub mod namespace {
    /// OPC relationships namespace
    pub const OPC_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships";
}

/// Open XML relationship target modes
pub mod target_mode {
    /// Internal relationship target mode (default)
    pub const INTERNAL: &str = "Internal";

    /// External relationship target mode (e.g., hyperlinks to external URLs)
    pub const EXTERNAL: &str = "External";
}

/// Relationship type URIs
pub mod relationship_type {
    // Images and media
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

    // External links
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
}
