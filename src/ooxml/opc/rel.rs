//! Relationship records shared by the hyperlink reader and the sheet
//! relationship writer.

use std::fmt;

use super::constants::{relationship_type, target_mode};

/// Relationship type taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RelType {
    /// External hyperlink
    Hyperlink,
    /// Embedded media (images)
    Image,
    /// Any other relationship type, by URI
    Other(String),
}

impl RelType {
    /// Map a relationship type URI back onto the taxonomy.
    pub fn from_uri(uri: &str) -> Self {
        match uri {
            relationship_type::HYPERLINK => RelType::Hyperlink,
            relationship_type::IMAGE => RelType::Image,
            other => RelType::Other(other.to_string()),
        }
    }

    /// The relationship type URI written into `Type="..."`.
    #[inline]
    pub fn uri(&self) -> &str {
        match self {
            RelType::Hyperlink => relationship_type::HYPERLINK,
            RelType::Image => relationship_type::IMAGE,
            RelType::Other(uri) => uri,
        }
    }
}

/// Relationship target mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetMode {
    Internal,
    External,
}

impl TargetMode {
    /// Parse a `TargetMode` attribute value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            target_mode::INTERNAL => Some(TargetMode::Internal),
            target_mode::EXTERNAL => Some(TargetMode::External),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            TargetMode::Internal => target_mode::INTERNAL,
            TargetMode::External => target_mode::EXTERNAL,
        }
    }
}

impl fmt::Display for TargetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relationship to be registered with a sheet relationship writer.
///
/// The identifier is not part of the record: it is allocated by the writer
/// at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipRecord {
    /// Relationship type
    pub rel_type: RelType,
    /// Target URI or package-internal path
    pub target: String,
    /// Target mode; `None` omits the `TargetMode` attribute
    pub target_mode: Option<TargetMode>,
}

impl RelationshipRecord {
    /// Create a record without a target mode.
    pub fn new(rel_type: RelType, target: impl Into<String>) -> Self {
        Self {
            rel_type,
            target: target.into(),
            target_mode: None,
        }
    }

    /// External hyperlink record.
    pub fn hyperlink(target: impl Into<String>) -> Self {
        Self {
            rel_type: RelType::Hyperlink,
            target: target.into(),
            target_mode: Some(TargetMode::External),
        }
    }

    /// Set the target mode.
    pub fn with_target_mode(mut self, mode: TargetMode) -> Self {
        self.target_mode = Some(mode);
        self
    }
}

/// A relationship read back from a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type
    pub rel_type: RelType,
    /// Target reference
    pub target: String,
    /// Target mode, if the attribute was present
    pub target_mode: Option<TargetMode>,
}

impl Relationship {
    /// Check if this is an external relationship.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.target_mode == Some(TargetMode::External)
    }
}
