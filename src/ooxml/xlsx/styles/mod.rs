//! Style table for streamed workbooks.
//!
//! Until a `xl/styles.xml` part has been parsed the reader works against
//! [`StyleTable::Placeholder`], which answers every lookup with `None`.
//! When styles are cached the part is parsed incrementally into
//! [`Styles`] and the session switches to [`StyleTable::Parsed`].
//!
//! Only number formats and cell formats (`cellXfs`) are retained; fonts,
//! fills and borders are referenced by id and not resolved.

mod cell_style;
mod parser;

pub use cell_style::CellStyle;

use std::collections::HashMap;
use std::io::BufRead;

use crate::common::error::Result;

/// Parsed style information.
#[derive(Debug, Default)]
pub struct Styles {
    /// Custom number formats (ID -> format code)
    pub number_formats: HashMap<u32, String>,
    /// Cell format records (cellXfs - the actual styles applied to cells)
    pub cell_xfs: Vec<CellStyle>,
}

impl Styles {
    /// Create a new empty styles collection.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse styles from a `xl/styles.xml` byte stream.
    ///
    /// The part is tokenized incrementally; it is never buffered whole.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        parser::parse_styles(reader)
    }

    /// Get a cell style by ID (index into `cellXfs`).
    #[inline]
    pub fn cell_style(&self, id: u32) -> Option<&CellStyle> {
        self.cell_xfs.get(id as usize)
    }
}

/// Style lookup capability used by worksheet readers.
#[derive(Debug, Default)]
pub enum StyleTable {
    /// Inert stand-in used until (or unless) a style part is parsed
    #[default]
    Placeholder,
    /// Populated table
    Parsed(Styles),
}

impl StyleTable {
    /// Whether a real style part has been parsed.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, StyleTable::Parsed(_))
    }

    /// Look up a cell format by style id.
    pub fn cell_style(&self, style_id: u32) -> Option<&CellStyle> {
        match self {
            StyleTable::Placeholder => None,
            StyleTable::Parsed(styles) => styles.cell_style(style_id),
        }
    }

    /// Number format id applied by a style.
    pub fn num_fmt_id(&self, style_id: u32) -> Option<u32> {
        self.cell_style(style_id).and_then(|style| style.num_fmt_id)
    }

    /// Custom number format code applied by a style.
    ///
    /// Built-in format ids (which have no `numFmt` entry) return `None`.
    pub fn number_format(&self, style_id: u32) -> Option<&str> {
        let StyleTable::Parsed(styles) = self else {
            return None;
        };
        let id = styles.cell_style(style_id)?.num_fmt_id?;
        styles.number_formats.get(&id).map(String::as_str)
    }
}
