//! Error types for sitetext operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while exporting a page.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid kill selector: {0}")]
    Selector(String),

    #[error("Page not registered in navigation: {0}")]
    UnknownPage(String),

    #[error("Page contributed twice: {0}")]
    DuplicatePage(String),

    #[error("Theme handler failed: {0}")]
    ThemeHandler(String),

    #[error("Path has no file name: {}", .0.display())]
    InvalidPath(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
