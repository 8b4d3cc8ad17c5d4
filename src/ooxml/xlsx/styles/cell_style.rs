//! Cell format records (`cellXfs/xf`).

/// Cell style information.
///
/// Only the references needed to interpret cell values are kept; fonts,
/// fills and borders are carried as raw ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellStyle {
    /// Number format ID (references built-in or custom number format)
    pub num_fmt_id: Option<u32>,
    /// Font ID (index into fonts array)
    pub font_id: Option<u32>,
    /// Fill ID (index into fills array)
    pub fill_id: Option<u32>,
    /// Border ID (index into borders array)
    pub border_id: Option<u32>,
    /// Cell style format ID (references cellStyleXfs)
    pub xf_id: Option<u32>,
    /// Apply number format flag
    pub apply_number_format: bool,
    /// Quote prefix flag (for preserving leading apostrophe)
    pub quote_prefix: bool,
}

impl CellStyle {
    /// Create a new empty cell style.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}
