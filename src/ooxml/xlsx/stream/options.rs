//! Per-session read configuration.

use serde::{Deserialize, Serialize};

/// What to do with one kind of container entry.
///
/// Not every mode is meaningful for every kind; see the accessors on
/// [`ReadOptions`] for the recognized combinations. An unrecognized
/// combination drains the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartMode {
    /// Retain fully in memory for later lookup
    Cache,
    /// Surface as discrete events, retain nothing
    Emit,
    /// Drain without parsing
    #[default]
    Ignore,
}

/// Egress of the shared-string extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedStringMode {
    Cache,
    Emit,
}

/// Configuration of one read session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadOptions {
    /// Container-entry notices (recognized: emit)
    pub entries: PartMode,
    /// Shared-string part (recognized: cache, emit)
    pub shared_strings: PartMode,
    /// Style part (recognized: cache)
    pub styles: PartMode,
    /// Worksheet relationship parts (recognized: cache, emit)
    pub hyperlinks: PartMode,
    /// Worksheet parts (recognized: emit)
    pub worksheets: PartMode,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            entries: PartMode::Emit,
            shared_strings: PartMode::Cache,
            styles: PartMode::Ignore,
            hyperlinks: PartMode::Ignore,
            worksheets: PartMode::Emit,
        }
    }
}

impl ReadOptions {
    /// Options that drain every part and emit nothing.
    pub fn drain_all() -> Self {
        Self {
            entries: PartMode::Ignore,
            shared_strings: PartMode::Ignore,
            styles: PartMode::Ignore,
            hyperlinks: PartMode::Ignore,
            worksheets: PartMode::Ignore,
        }
    }

    pub fn with_entries(mut self, mode: PartMode) -> Self {
        self.entries = mode;
        self
    }

    pub fn with_shared_strings(mut self, mode: PartMode) -> Self {
        self.shared_strings = mode;
        self
    }

    pub fn with_styles(mut self, mode: PartMode) -> Self {
        self.styles = mode;
        self
    }

    pub fn with_hyperlinks(mut self, mode: PartMode) -> Self {
        self.hyperlinks = mode;
        self
    }

    pub fn with_worksheets(mut self, mode: PartMode) -> Self {
        self.worksheets = mode;
        self
    }

    /// Whether entry notices are raised.
    #[inline]
    pub fn emit_entries(&self) -> bool {
        self.entries == PartMode::Emit
    }

    /// Shared-string egress, or `None` to drain the part.
    #[inline]
    pub fn shared_string_mode(&self) -> Option<SharedStringMode> {
        match self.shared_strings {
            PartMode::Cache => Some(SharedStringMode::Cache),
            PartMode::Emit => Some(SharedStringMode::Emit),
            PartMode::Ignore => None,
        }
    }

    /// Whether the style part is parsed into a style table.
    #[inline]
    pub fn cache_styles(&self) -> bool {
        self.styles == PartMode::Cache
    }

    /// Whether hyperlink relationships are raised as events.
    #[inline]
    pub fn emit_hyperlinks(&self) -> bool {
        self.hyperlinks == PartMode::Emit
    }

    /// Whether hyperlink relationships are retained for lookup.
    #[inline]
    pub fn cache_hyperlinks(&self) -> bool {
        self.hyperlinks == PartMode::Cache
    }

    /// Whether worksheet rows are raised as events.
    #[inline]
    pub fn emit_worksheets(&self) -> bool {
        self.worksheets == PartMode::Emit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReadOptions::default();
        assert!(options.emit_entries());
        assert_eq!(options.shared_string_mode(), Some(SharedStringMode::Cache));
        assert!(!options.cache_styles());
        assert!(!options.emit_hyperlinks() && !options.cache_hyperlinks());
        assert!(options.emit_worksheets());
    }

    #[test]
    fn test_unrecognized_modes_drain() {
        let options = ReadOptions::drain_all()
            .with_entries(PartMode::Cache)
            .with_styles(PartMode::Emit)
            .with_worksheets(PartMode::Cache);
        assert!(!options.emit_entries());
        assert!(!options.cache_styles());
        assert!(!options.emit_worksheets());
    }

    #[test]
    fn test_builders() {
        let options = ReadOptions::default()
            .with_shared_strings(PartMode::Emit)
            .with_hyperlinks(PartMode::Cache)
            .with_styles(PartMode::Cache);
        assert_eq!(options.shared_string_mode(), Some(SharedStringMode::Emit));
        assert!(options.cache_hyperlinks());
        assert!(options.cache_styles());
    }

    #[test]
    fn test_deserialize_partial_camel_case() {
        let options: ReadOptions = serde_json::from_str(r#"{"sharedStrings":"emit","hyperlinks":"cache"}"#).unwrap();
        assert_eq!(options.shared_string_mode(), Some(SharedStringMode::Emit));
        assert!(options.cache_hyperlinks());
        assert!(options.emit_entries());
        assert!(options.emit_worksheets());

        let json = serde_json::to_string(&ReadOptions::drain_all()).unwrap();
        assert!(json.contains(r#""sharedStrings":"ignore""#));
    }
}
