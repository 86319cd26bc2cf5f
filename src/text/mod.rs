//! Text and Markdown emission from a normalized page.
//!
//! - [`escape`]: Markdown escaping and code delimiter sizing
//! - [`render`]: the tree walk producing the export text
//!
//! Plain text output gets no escaping at all; Markdown output escapes every
//! text run so literal `*`, `_` or `[` in prose never turn into markup.

mod escape;
mod render;

pub use escape::{
    calculate_fence_length, calculate_inline_code_ticks, escape_link_destination, escape_markdown,
    escape_markdown_from,
};
pub use render::{TextRenderer, render};
