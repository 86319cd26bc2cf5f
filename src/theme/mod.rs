//! Theme handlers: per-theme stylesheet and export-link injection.
//!
//! A handler is resolved once per build, either from the compiled-in
//! registry by theme name or from an external program named by
//! `theme_handler_path` (see [`CommandHandler`]).

mod cinder;
mod command;
mod generic;

use std::path::Path;

use tracing::{debug, warn};

use crate::error::Result;

pub use cinder::CinderTheme;
pub use command::CommandHandler;
pub use generic::GenericTheme;

/// Title given to every injected export link.
pub const LINK_TITLE: &str = "Text export";

/// Theme-specific hooks applied to every page of a build.
pub trait ThemeHandler {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Extra CSS injected into each page before rendering (may be empty).
    fn stylesheet(&self) -> String;

    /// Add a discoverable link to the export file `href` to a page.
    fn modify_html(&self, html: &str, href: &str) -> Result<String>;
}

/// Normalize a theme name for registry lookup.
pub fn normalize_theme_name(name: &str) -> String {
    name.trim().replace('-', "_").to_lowercase()
}

/// Look up a compiled-in handler.
pub fn builtin(name: &str) -> Option<Box<dyn ThemeHandler>> {
    match normalize_theme_name(name).as_str() {
        "generic" => Some(Box::new(GenericTheme)),
        "cinder" => Some(Box::new(CinderTheme)),
        _ => None,
    }
}

/// Pick the handler for a build.
///
/// A non-empty `handler_path` that exists wins. Otherwise the theme name is
/// looked up in the registry, falling back to the generic handler.
pub fn resolve(theme: Option<&str>, handler_path: &str) -> Box<dyn ThemeHandler> {
    let theme_name = theme.unwrap_or("generic");

    if !handler_path.is_empty() {
        let path = Path::new(handler_path);
        if path.is_file() {
            debug!("Using theme handler program {}", path.display());
            return Box::new(CommandHandler::new(path));
        }
        warn!(
            "Could not load theme handler {theme_name} from custom path \"{handler_path}\": file not found"
        );
    }

    match builtin(theme_name) {
        Some(handler) => handler,
        None => {
            warn!("Could not load theme handler {theme_name}: no such theme, using generic");
            Box::new(GenericTheme)
        }
    }
}
