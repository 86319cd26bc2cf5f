//! Plugin options and the per-build render configuration.
//!
//! [`ExportConfig`] is what users write in their site configuration; it is
//! deserialized with serde and left untouched afterwards. [`RenderConfig`] is
//! resolved from it once per build (kill selectors compiled, file extension
//! decided) and shared read-only by every page.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::dom::SelectorSet;
use crate::error::Result;

/// Name of the plugin entry in a site configuration's `plugins` list.
pub const PLUGIN_NAME: &str = "text-export";

/// Options accepted by the plugin, with their documented defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Emit debug diagnostics.
    pub verbose: bool,
    /// Environment variable that must be `1` for the plugin to run.
    pub enabled_if_env: Option<String>,
    /// Emit Markdown instead of plain text.
    pub markdown: bool,
    /// Flatten tables into sentences.
    pub plain_tables: bool,
    pub open_quote: String,
    pub close_quote: String,
    /// Alt text for images that have none.
    pub default_image_alt: String,
    /// Drop struck-through text entirely.
    pub hide_strikethrough: bool,
    /// CSS selectors whose matching elements are removed before rendering.
    pub kill_tags: Vec<String>,
    /// External theme handler program.
    pub theme_handler_path: String,
    /// Literal placed before each list item in plain text output.
    pub list_item_mark: String,
    /// Export file extension override.
    pub file_ext: Option<String>,
    /// Concatenate every page into one export instead of one file per page.
    pub combined: bool,
    /// Combined export location, relative to the site directory.
    pub combined_output_path: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            enabled_if_env: None,
            markdown: false,
            plain_tables: false,
            open_quote: "“".to_owned(),
            close_quote: "”".to_owned(),
            default_image_alt: String::new(),
            hide_strikethrough: false,
            kill_tags: Vec::new(),
            theme_handler_path: String::new(),
            list_item_mark: String::new(),
            file_ext: None,
            combined: false,
            combined_output_path: None,
        }
    }
}

impl ExportConfig {
    /// Parse plugin options from a YAML mapping.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read plugin options from a YAML file.
    ///
    /// The file may be either a bare options mapping or a whole site
    /// configuration with a `plugins:` list containing `text-export`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml)?;
        match plugin_entry(&value) {
            Some(entry) => Ok(serde_yaml::from_value(entry)?),
            None if value.get("plugins").is_some() => Ok(Self::default()),
            None => Self::from_yaml(&yaml),
        }
    }

    /// Whether the environment allows the plugin to run.
    ///
    /// With `enabled_if_env` set, the named variable must be exactly `1`.
    pub fn is_enabled_with<F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        match &self.enabled_if_env {
            Some(name) => lookup(name).as_deref() == Some("1"),
            None => true,
        }
    }

    pub fn format(&self) -> OutputFormat {
        if self.markdown {
            OutputFormat::Markdown
        } else {
            OutputFormat::Text
        }
    }

    /// Extension of export files, without the dot.
    pub fn file_ext(&self) -> String {
        match self.file_ext.as_deref().map(|e| e.trim_start_matches('.')) {
            Some(ext) if !ext.is_empty() => ext.to_owned(),
            _ => self.format().default_ext().to_owned(),
        }
    }

    /// Combined export location, relative to the site directory.
    pub fn combined_output_path(&self) -> String {
        self.combined_output_path
            .clone()
            .unwrap_or_else(|| format!("combined.{}", self.file_ext()))
    }
}

/// Find the `text-export` options inside a site configuration's plugin list.
fn plugin_entry(site: &serde_yaml::Value) -> Option<serde_yaml::Value> {
    let plugins = site.get("plugins")?.as_sequence()?;
    plugins.iter().find_map(|entry| match entry {
        serde_yaml::Value::String(name) if name == PLUGIN_NAME => {
            Some(serde_yaml::Value::Mapping(Default::default()))
        }
        serde_yaml::Value::Mapping(map) => map.get(PLUGIN_NAME).map(|options| match options {
            serde_yaml::Value::Null => serde_yaml::Value::Mapping(Default::default()),
            other => other.clone(),
        }),
        _ => None,
    })
}

/// Target format of the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
}

impl OutputFormat {
    pub fn default_ext(self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Markdown => "md",
        }
    }

    pub fn is_markdown(self) -> bool {
        self == OutputFormat::Markdown
    }
}

/// Immutable rendering options shared by every page of a build.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub open_quote: String,
    pub close_quote: String,
    pub default_image_alt: String,
    pub hide_strikethrough: bool,
    pub kill_tags: SelectorSet,
    pub plain_tables: bool,
    pub list_item_mark: String,
    pub file_ext: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::from_export(&ExportConfig::default())
    }
}

impl RenderConfig {
    /// Resolve render options from plugin options.
    ///
    /// A kill tag that is not a valid selector is reported and ignored; the
    /// remaining ones still apply.
    pub fn from_export(config: &ExportConfig) -> Self {
        let mut kill_tags = SelectorSet::default();
        for tag in &config.kill_tags {
            if let Err(e) = kill_tags.add(tag) {
                warn!("Ignoring kill tag: {e}");
            }
        }

        Self {
            format: config.format(),
            open_quote: config.open_quote.clone(),
            close_quote: config.close_quote.clone(),
            default_image_alt: config.default_image_alt.clone(),
            hide_strikethrough: config.hide_strikethrough,
            kill_tags,
            plain_tables: config.plain_tables,
            list_item_mark: config.list_item_mark.clone(),
            file_ext: config.file_ext(),
        }
    }

    /// Plain text render options with everything else at defaults.
    pub fn text() -> Self {
        Self::default()
    }

    /// Markdown render options with everything else at defaults.
    pub fn markdown() -> Self {
        Self::from_export(&ExportConfig {
            markdown: true,
            ..Default::default()
        })
    }

    pub fn is_markdown(&self) -> bool {
        self.format.is_markdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert!(!config.markdown);
        assert!(!config.plain_tables);
        assert_eq!(config.open_quote, "“");
        assert_eq!(config.close_quote, "”");
        assert_eq!(config.default_image_alt, "");
        assert!(!config.hide_strikethrough);
        assert!(config.kill_tags.is_empty());
        assert_eq!(config.theme_handler_path, "");
        assert!(!config.verbose);
        assert_eq!(config.enabled_if_env, None);
        assert_eq!(config.file_ext(), "txt");
    }

    #[test]
    fn test_markdown_switches_extension() {
        let config = ExportConfig::from_yaml("markdown: true").unwrap();
        assert_eq!(config.format(), OutputFormat::Markdown);
        assert_eq!(config.file_ext(), "md");
        assert_eq!(config.combined_output_path(), "combined.md");
    }

    #[test]
    fn test_extension_override() {
        let config = ExportConfig::from_yaml("file_ext: .text").unwrap();
        assert_eq!(config.file_ext(), "text");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ExportConfig::from_yaml("kill_tags: [nav, '.md-footer']\nopen_quote: '\"'").unwrap();
        assert_eq!(config.kill_tags, vec!["nav", ".md-footer"]);
        assert_eq!(config.open_quote, "\"");
        assert_eq!(config.close_quote, "”");
    }

    #[test]
    fn test_env_gating() {
        let mut config = ExportConfig::default();
        assert!(config.is_enabled_with(|_| None));

        config.enabled_if_env = Some("ENABLE_EXPORT".to_owned());
        assert!(!config.is_enabled_with(|_| None));
        assert!(!config.is_enabled_with(|_| Some("0".to_owned())));
        assert!(!config.is_enabled_with(|_| Some("true".to_owned())));
        assert!(config.is_enabled_with(|name| (name == "ENABLE_EXPORT").then(|| "1".to_owned())));
    }

    #[test]
    fn test_invalid_kill_tag_is_skipped() {
        let config = ExportConfig {
            kill_tags: vec!["nav".to_owned(), "p >".to_owned(), "footer".to_owned()],
            ..Default::default()
        };
        let render = RenderConfig::from_export(&config);
        assert_eq!(render.kill_tags.sources(), ["nav", "footer"]);
    }

    #[test]
    fn test_plugin_entry_in_site_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mkdocs.yml");
        std::fs::write(
            &path,
            "site_name: Docs\nplugins:\n  - search\n  - text-export:\n      markdown: true\n      kill_tags: [nav]\n",
        )
        .unwrap();

        let config = ExportConfig::from_path(&path).unwrap();
        assert!(config.markdown);
        assert_eq!(config.kill_tags, vec!["nav"]);
    }

    #[test]
    fn test_site_config_without_plugin_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mkdocs.yml");
        std::fs::write(&path, "site_name: Docs\nplugins:\n  - search\n  - text-export\n").unwrap();

        assert_eq!(ExportConfig::from_path(&path).unwrap(), ExportConfig::default());
    }
}
