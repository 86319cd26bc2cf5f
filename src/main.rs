//! sitetext - export a built documentation site to plain text or Markdown

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use sitetext::util::{decode_text, extract_meta_charset};
use sitetext::{ExportConfig, NavPage, PageFile, Plugin};

#[derive(Parser)]
#[command(name = "sitetext")]
#[command(version, about = "Export a built site's HTML pages to text or Markdown", long_about = None)]
#[command(after_help = "EXAMPLES:
    sitetext site/                       Write a .txt beside every page
    sitetext --markdown site/            Write .md exports instead
    sitetext --config mkdocs.yml site/   Use the text-export options of a site config
    sitetext --combined --json site/     One combined export, summary as JSON")]
struct Cli {
    /// Directory of built HTML pages
    #[arg(value_name = "SITE_DIR")]
    site_dir: PathBuf,

    /// YAML file with plugin options (or a site config with a plugins list)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit Markdown instead of plain text
    #[arg(long)]
    markdown: bool,

    /// Theme whose handler injects the export link
    #[arg(long, value_name = "NAME")]
    theme: Option<String>,

    /// Concatenate all pages into one export
    #[arg(long)]
    combined: bool,

    /// Log debug diagnostics
    #[arg(short, long)]
    verbose: bool,

    /// Print the build summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match ExportConfig::from_path(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => ExportConfig::default(),
    };
    config.markdown |= cli.markdown;
    config.combined |= cli.combined;
    config.verbose |= cli.verbose;

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), config.verbose))
        .init();

    match run(&cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins when set and valid, otherwise `--verbose` enables DEBUG.
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "warn" };
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level))
}

fn run(cli: &Cli, config: ExportConfig) -> Result<(), String> {
    if !cli.site_dir.is_dir() {
        return Err(format!("{} is not a directory", cli.site_dir.display()));
    }

    let pages = collect_pages(&cli.site_dir)?;
    let mut plugin = Plugin::new(config);

    if !plugin.on_config(|name| std::env::var(name).ok()) {
        return Ok(());
    }

    let nav: Vec<NavPage> = pages.iter().map(|(_, url)| NavPage::new(url.as_str())).collect();
    plugin.on_nav(&nav, cli.theme.as_deref());

    for (path, url) in &pages {
        export_file(&mut plugin, path, url);
    }

    let Some(summary) = plugin.on_post_build(&cli.site_dir) else {
        return Ok(());
    };
    if cli.json {
        let json = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        println!(
            "Exported {} files ({} errors) in {:.1}s",
            summary.files, summary.errors, summary.seconds
        );
    }
    Ok(())
}

/// Export one page in place. Unreadable or unwritable pages are counted
/// as errors and the run carries on.
fn export_file(plugin: &mut Plugin, path: &Path, url: &str) {
    let page = PageFile {
        src_path: path.to_path_buf(),
        abs_dest_path: path.to_path_buf(),
        url: url.to_owned(),
    };
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            plugin.skip_page(&page, &e);
            return;
        }
    };
    let html = decode_text(&bytes, extract_meta_charset(&bytes));

    let out = plugin.on_post_page(&html, &page);
    if out != html {
        match std::fs::write(path, out) {
            Ok(()) => debug!("Updated {}", path.display()),
            Err(e) => plugin.record_error(&page, &e),
        }
    }
}

/// Every `*.html` file under the site directory, sorted, with its
/// site-relative URL.
fn collect_pages(site_dir: &Path) -> Result<Vec<(PathBuf, String)>, String> {
    let mut pages = Vec::new();
    for entry in WalkDir::new(site_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| e.to_string())?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "html") {
            continue;
        }
        let rel = path
            .strip_prefix(site_dir)
            .map_err(|e| format!("{}: {e}", path.display()))?;
        let url = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        pages.push((path.to_path_buf(), url));
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_plugin(pages: &[&str]) -> Plugin {
        let mut plugin = Plugin::new(ExportConfig::default());
        assert!(plugin.on_config(|_| None));
        let nav: Vec<_> = pages.iter().map(|url| NavPage::new(*url)).collect();
        plugin.on_nav(&nav, None);
        plugin
    }

    #[test]
    fn test_rust_log_overrides_verbose() {
        assert_eq!(log_filter(Some("sitetext=info"), true).to_string(), "sitetext=info");
        assert_eq!(log_filter(None, true).to_string(), "debug");
        assert_eq!(log_filter(None, false).to_string(), "warn");
        assert_eq!(log_filter(Some(""), true).to_string(), "debug");
    }

    #[test]
    fn test_unreadable_page_is_counted_and_skipped() {
        let site = tempfile::tempdir().unwrap();
        let good = site.path().join("index.html");
        std::fs::write(&good, "<html><head></head><body><p>Home</p></body></html>").unwrap();
        let mut plugin = enabled_plugin(&["gone.html", "index.html"]);

        export_file(&mut plugin, &site.path().join("gone.html"), "gone.html");
        export_file(&mut plugin, &good, "index.html");

        assert_eq!(std::fs::read_to_string(site.path().join("index.txt")).unwrap(), "Home\n");
        let summary = plugin.on_post_build(site.path()).unwrap();
        assert_eq!(summary.files, 2);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn test_collect_pages_uses_site_urls() {
        let site = tempfile::tempdir().unwrap();
        std::fs::create_dir(site.path().join("guide")).unwrap();
        for name in ["index.html", "guide/setup.html", "guide/app.css"] {
            std::fs::write(site.path().join(name), "").unwrap();
        }

        let urls: Vec<_> = collect_pages(site.path())
            .unwrap()
            .into_iter()
            .map(|(_, url)| url)
            .collect();
        assert_eq!(urls, vec!["guide/setup.html", "index.html"]);
    }
}
