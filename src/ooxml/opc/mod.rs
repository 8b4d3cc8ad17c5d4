/// Open Packaging Conventions (OPC) pieces needed for streaming.
///
/// Only what a forward-only reader and writer need is kept here: part-name
/// canonicalization and matching, relationship records, and the constant
/// URIs written into relationship parts.
pub mod constants;
pub mod packuri;
pub mod rel;

pub use rel::{RelType, Relationship, RelationshipRecord, TargetMode};
