//! Build lifecycle hooks.
//!
//! The host build system drives a [`Plugin`] through four calls:
//! [`on_config`](Plugin::on_config) once, [`on_nav`](Plugin::on_nav) once
//! all pages are known, [`on_post_page`](Plugin::on_post_page) per rendered
//! page, and [`on_post_build`](Plugin::on_post_build) at the end. A disabled
//! plugin turns every hook into a pass-through.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::{ExportConfig, RenderConfig};
use crate::error::{Error, Result};
use crate::links::iri_to_uri;
use crate::renderer::{CombineSummary, Renderer};
use crate::theme;

/// A page as listed in the site navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPage {
    /// Site-relative URL of the page.
    pub url: String,
}

impl NavPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Source and output locations of one built page.
#[derive(Debug, Clone)]
pub struct PageFile {
    pub src_path: PathBuf,
    pub abs_dest_path: PathBuf,
    /// Site-relative URL, as listed in the navigation.
    pub url: String,
}

/// Counters reported when the build finishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildSummary {
    pub files: usize,
    pub errors: usize,
    pub seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined: Option<CombineSummary>,
}

pub struct Plugin {
    config: ExportConfig,
    enabled: bool,
    renderer: Option<Renderer>,
    num_files: usize,
    num_errors: usize,
    total_time: Duration,
}

impl Plugin {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            enabled: true,
            renderer: None,
            num_files: 0,
            num_errors: 0,
            total_time: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn num_files(&self) -> usize {
        self.num_files
    }

    pub fn num_errors(&self) -> usize {
        self.num_errors
    }

    /// Decide whether the plugin runs for this build.
    ///
    /// `lookup` reads environment variables; pass `|k| std::env::var(k).ok()`
    /// for the process environment.
    pub fn on_config<F>(&mut self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        self.enabled = self.config.is_enabled_with(lookup);
        if !self.enabled {
            if let Some(name) = &self.config.enabled_if_env {
                warn!("Text export is disabled (set environment variable {name} to 1 to enable)");
            }
            return false;
        }

        debug!(
            "Text export enabled: format {:?}, extension .{}",
            self.config.format(),
            self.config.file_ext()
        );
        true
    }

    /// Build the renderer and lay out the combined export, if any.
    pub fn on_nav(&mut self, pages: &[NavPage], theme: Option<&str>) {
        if !self.enabled {
            return;
        }

        let handler = theme::resolve(theme, &self.config.theme_handler_path);
        let mut renderer = Renderer::new(RenderConfig::from_export(&self.config), handler);
        if self.config.combined {
            for page in pages {
                renderer.registry_mut().register(page.url.as_str());
            }
            debug!(
                "Registered {} pages for the combined export",
                renderer.registry().len()
            );
        }
        self.renderer = Some(renderer);
    }

    /// Export one page and return the HTML to publish in its place.
    ///
    /// Failures are logged and counted; the page's original HTML is
    /// returned so the site build carries on.
    pub fn on_post_page(&mut self, html: &str, page: &PageFile) -> String {
        if !self.enabled {
            return html.to_owned();
        }

        let start = Instant::now();
        self.num_files += 1;

        let html = match self.export_page(html, page) {
            Ok(out) => out,
            Err(e) => {
                self.record_error(page, &e);
                html.to_owned()
            }
        };

        self.total_time += start.elapsed();
        html
    }

    /// Count a page that could not even be handed to [`on_post_page`](Self::on_post_page).
    pub fn skip_page(&mut self, page: &PageFile, reason: &dyn std::fmt::Display) {
        if !self.enabled {
            return;
        }
        self.num_files += 1;
        self.record_error(page, reason);
    }

    /// Count a failure on an already counted page.
    pub fn record_error(&mut self, page: &PageFile, reason: &dyn std::fmt::Display) {
        error!("Error converting {} to text: {reason}", page.src_path.display());
        self.num_errors += 1;
    }

    fn renderer_mut(&mut self) -> &mut Renderer {
        let config = &self.config;
        self.renderer.get_or_insert_with(|| {
            let handler = theme::resolve(None, &config.theme_handler_path);
            Renderer::new(RenderConfig::from_export(config), handler)
        })
    }

    fn export_page(&mut self, html: &str, page: &PageFile) -> Result<String> {
        let dest_dir = page
            .abs_dest_path
            .parent()
            .ok_or_else(|| Error::InvalidPath(page.abs_dest_path.clone()))?;
        let stem = page
            .src_path
            .file_stem()
            .ok_or_else(|| Error::InvalidPath(page.src_path.clone()))?
            .to_string_lossy()
            .into_owned();
        let base_url = file_url(&dest_dir.join(&stem))?;
        let combined = self.config.combined;

        let renderer = self.renderer_mut();
        if combined {
            renderer.add_doc(html, &base_url, &page.url)?;
            return Ok(html.to_owned());
        }

        let export_name = format!("{stem}.{}", renderer.config().file_ext);
        renderer.write_export(html, &base_url, &dest_dir.join(&export_name))?;
        renderer.add_link(html, &iri_to_uri(&export_name))
    }

    /// Flush the combined export and report totals.
    ///
    /// Returns `None` when the plugin is disabled.
    pub fn on_post_build(&mut self, site_dir: &Path) -> Option<BuildSummary> {
        if !self.enabled {
            return None;
        }

        let mut combined = None;
        if self.config.combined {
            let start = Instant::now();
            let path = site_dir.join(self.config.combined_output_path());
            match self.renderer_mut().write_combined(&path) {
                Ok(summary) => {
                    info!(
                        "Combined {} pages into {} ({} skipped)",
                        summary.pages,
                        path.display(),
                        summary.skipped
                    );
                    combined = Some(summary);
                }
                Err(e) => {
                    error!("Error writing combined export {}: {e}", path.display());
                    self.num_errors += 1;
                }
            }
            self.total_time += start.elapsed();
        }

        let seconds = self.total_time.as_secs_f64();
        info!("Converting {} files to text took {seconds:.1}s", self.num_files);
        if self.num_errors > 0 {
            error!("{} conversion errors occurred (see above)", self.num_errors);
        }

        Some(BuildSummary {
            files: self.num_files,
            errors: self.num_errors,
            seconds,
            combined,
        })
    }
}

/// `file://` URL of a path, made absolute against the working directory.
fn file_url(path: &Path) -> Result<String> {
    let absolute = std::path::absolute(path)?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| Error::InvalidPath(absolute))
}
