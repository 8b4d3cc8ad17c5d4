//! XML helpers shared by the part readers and the relationship writer.

pub mod escape;
pub mod text;

pub use escape::{escape_attr, write_escaped_attr};
pub use text::text_chunk;
