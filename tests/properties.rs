//! Property tests for reference rewriting and normalization.

use proptest::prelude::*;
use url::Url;

use sitetext::links::{abs_asset_href, rel_export_href};
use sitetext::normalize::normalize;
use sitetext::text::render;
use sitetext::{Document, ExportConfig, RenderConfig};

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,7}"
}

fn relative_path() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(prop_oneof![Just("..".to_owned()), segment()], 0..4),
        segment(),
    )
        .prop_map(|(dirs, name)| {
            let mut parts = dirs;
            parts.push(name);
            parts.join("/")
        })
}

const KILL_SELECTORS: &[&str] = &["nav", ".ad", "footer", "aside p", "#banner", "script"];

const PAGE: &str = concat!(
    "<div id=\"banner\">Sale!</div><nav><a href=\"a.html\">A</a></nav>",
    "<main><p>Body text</p><div class=\"ad\"><p>Buy now</p></div>",
    "<aside><p>Side note</p><span>kept</span></aside></main>",
    "<footer>Footer</footer>",
);

proptest! {
    #[test]
    fn prop_anchors_pass_through(fragment in "[A-Za-z0-9_-]{0,12}", ext in "(txt|md)") {
        let href = format!("#{fragment}");
        prop_assert_eq!(rel_export_href(&href, &ext), href);
    }

    #[test]
    fn prop_absolute_urls_pass_through(
        scheme in "(https?|ftp|mailto)",
        path in relative_path(),
        ext in "(txt|md)",
    ) {
        let href = format!("{scheme}://example.com/{path}.html");
        prop_assert_eq!(rel_export_href(&href, &ext), href.clone());
        prop_assert_eq!(abs_asset_href(&href, "file:///site/docs/page"), href);
    }

    #[test]
    fn prop_extension_swap_is_idempotent(path in relative_path(), ext in "(txt|md)") {
        let href = format!("{path}.html");
        let once = rel_export_href(&href, &ext);
        prop_assert_eq!(&once, &format!("{path}.{ext}"));
        prop_assert_eq!(rel_export_href(&once, &ext), once);
    }

    #[test]
    fn prop_asset_join_matches_url_join(
        path in relative_path(),
        asset_ext in "(png|css|js|svg)",
        base_dirs in prop::collection::vec(segment(), 0..3),
    ) {
        let base = format!("file:///site/{}/page", base_dirs.join("/"));
        let href = format!("{path}.{asset_ext}");

        let expected = Url::parse(&base).unwrap().join(&href).unwrap();
        prop_assert_eq!(abs_asset_href(&href, &base), expected.to_string());
    }

    #[test]
    fn prop_kill_order_does_not_matter(
        selectors in Just(KILL_SELECTORS.to_vec()).prop_shuffle(),
        markdown in any::<bool>(),
    ) {
        let forward = RenderConfig::from_export(&ExportConfig {
            markdown,
            kill_tags: KILL_SELECTORS.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        });
        let shuffled = RenderConfig::from_export(&ExportConfig {
            markdown,
            kill_tags: selectors.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        });

        let a = render(&normalize(Document::parse(PAGE), &forward), &forward);
        let b = render(&normalize(Document::parse(PAGE), &shuffled), &shuffled);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a, "Body text\n\nkept");
    }

    #[test]
    fn prop_flattened_tables_leave_no_table_markup(
        rows in prop::collection::vec(prop::collection::vec("[a-z]{0,5}", 1..4), 1..5),
    ) {
        let body: String = rows
            .iter()
            .map(|cells| {
                let cells: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
                format!("<tr>{cells}</tr>")
            })
            .collect();
        let html = format!("<table><caption>T</caption>{body}</table>");

        let config = RenderConfig::from_export(&ExportConfig {
            plain_tables: true,
            ..Default::default()
        });
        let doc = normalize(Document::parse(&html), &config);

        for id in doc.elements() {
            if doc.is_attached(id) {
                let tag = doc.tag(id).unwrap_or("");
                prop_assert!(!matches!(tag, "table" | "caption" | "thead" | "tbody" | "tr" | "td" | "th"));
            }
        }

        let mut expected = vec!["T".to_owned()];
        expected.extend(
            rows.iter()
                .map(|cells| {
                    cells.iter().filter(|c| !c.is_empty()).cloned().collect::<Vec<_>>().join(", ")
                })
                .filter(|row| !row.is_empty()),
        );
        prop_assert_eq!(render(&doc, &config), expected.join(". "));
    }
}
