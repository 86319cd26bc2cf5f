//! # sitetext
//!
//! Companion plain-text and Markdown exports for built documentation sites.
//!
//! For every rendered HTML page the export pipeline
//!
//! 1. rewrites references ([`links`]) so page links point at sibling exports
//!    and assets resolve from wherever the export is read,
//! 2. normalizes the tree ([`normalize`]) for the target format,
//! 3. emits text or Markdown ([`text`]),
//!
//! then writes the export beside the page and lets a theme handler
//! ([`theme`]) inject a link to it into the page itself.
//!
//! ## Quick Start
//!
//! ```
//! use sitetext::{RenderConfig, Renderer, theme::GenericTheme};
//!
//! let renderer = Renderer::new(RenderConfig::markdown(), Box::new(GenericTheme));
//! let md = renderer.render_doc(
//!     "<h1>Home</h1><p>See <a href=\"guide.html\">the guide</a>.</p>",
//!     "file:///site/index",
//!     None,
//! );
//! assert_eq!(md, "# Home\n\nSee [the guide](<guide.md>).");
//! ```
//!
//! ## As a build plugin
//!
//! A host build drives [`Plugin`] through `on_config`, `on_nav`, one
//! `on_post_page` per page and `on_post_build`. Conversion failures are
//! logged and counted; they never abort the host build.

pub mod config;
pub mod dom;
pub mod error;
pub mod links;
pub mod normalize;
pub mod plugin;
pub mod registry;
pub mod renderer;
pub mod text;
pub mod theme;
pub mod util;

pub use config::{ExportConfig, OutputFormat, RenderConfig};
pub use dom::Document;
pub use error::{Error, Result};
pub use plugin::{BuildSummary, NavPage, PageFile, Plugin};
pub use registry::{PageRegistry, PageSlot};
pub use renderer::{CombineCursor, CombineSummary, Renderer};
pub use theme::ThemeHandler;
