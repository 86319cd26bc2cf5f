//! Reference rewriting for exported pages.
//!
//! Site pages link to each other with relative `.html` references. In an
//! export those links must point at the sibling export file instead, and
//! asset references (stylesheets, images, scripts) must stay resolvable even
//! though the export lives outside the HTML page.
//!
//! - Hyperlinks (`a[href]`) to relative HTML documents get the export
//!   extension ([`rel_export_href`]).
//! - Every other `href` and every `src` becomes absolute against the page's
//!   base URL ([`abs_asset_href`]).
//! - In combined mode hyperlinks are instead normalized to a root-relative
//!   path within the site ([`normalize_href`]).
//!
//! A reference counts as a document purely by its extension; nothing is
//! fetched or checked for existence.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use crate::dom::Document;

/// Bytes left alone when turning an IRI into a URI: unreserved characters,
/// reserved delimiters and `%` (so existing escapes survive).
const IRI_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/')
    .remove(b':')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b'%');

/// Percent-encode spaces, non-ASCII and other characters invalid in a URI.
///
/// # Examples
///
/// ```
/// use sitetext::links::iri_to_uri;
///
/// assert_eq!(iri_to_uri("guide/über uns.txt"), "guide/%C3%BCber%20uns.txt");
/// assert_eq!(iri_to_uri("a%20b.txt"), "a%20b.txt");
/// ```
pub fn iri_to_uri(iri: &str) -> String {
    utf8_percent_encode(iri, IRI_SAFE).to_string()
}

/// Whether a reference carries a URL scheme (`https:`, `mailto:`, `file:`).
pub fn is_absolute_url(href: &str) -> bool {
    let Some((scheme, _)) = href.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Whether a reference is an absolute filesystem-style path.
pub fn is_absolute_path(href: &str) -> bool {
    href.starts_with('/') || href.starts_with('\\')
}

/// Split a path into (directory part including the trailing `/`, last segment).
fn split_last_segment(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..=i], &path[i + 1..]),
        None => ("", path),
    }
}

/// Split a file name into stem and extension (with the dot), like a
/// filesystem would: leading dots do not start an extension.
fn split_extension(name: &str) -> (&str, &str) {
    let trimmed = name.trim_start_matches('.');
    let offset = name.len() - trimmed.len();
    match trimmed.rfind('.') {
        Some(i) => name.split_at(offset + i),
        None => (name, ""),
    }
}

/// Whether a reference points at another HTML document of the site.
///
/// True for relative references whose last segment has an extension that
/// starts with `.html` (`page.html`, `page.htm` does not count,
/// `page.html#part` does).
pub fn is_doc(href: &str) -> bool {
    if is_absolute_url(href) || is_absolute_path(href) {
        return false;
    }
    let (_, tail) = split_last_segment(href);
    let (_, ext) = split_extension(tail);
    ext.starts_with(".html")
}

/// Rewrite a relative document link to the export file next to it.
///
/// Anchors, absolute URLs and non-document references are returned
/// unchanged. The query and fragment of a rewritten link are dropped since
/// export files have no anchors.
///
/// # Examples
///
/// ```
/// use sitetext::links::rel_export_href;
///
/// assert_eq!(rel_export_href("../setup/index.html", "txt"), "../setup/index.txt");
/// assert_eq!(rel_export_href("#install", "txt"), "#install");
/// assert_eq!(rel_export_href("https://example.com/a.html", "md"), "https://example.com/a.html");
/// ```
pub fn rel_export_href(href: &str, ext: &str) -> String {
    if href.starts_with('#') || !is_doc(href) {
        return href.to_owned();
    }

    let (head, tail) = split_last_segment(href);
    let (stem, _) = split_extension(tail);
    iri_to_uri(&format!("{head}{stem}.{ext}"))
}

/// Make an asset reference absolute against the page's base URL.
///
/// Absolute URLs and absolute paths pass through, as does everything when
/// the base URL itself does not parse.
pub fn abs_asset_href(href: &str, base_url: &str) -> String {
    if is_absolute_url(href) || is_absolute_path(href) {
        return href.to_owned();
    }

    match Url::parse(base_url).and_then(|base| base.join(href)) {
        Ok(joined) => iri_to_uri(joined.as_str()),
        Err(_) => href.to_owned(),
    }
}

/// Normalize a link to a site-root-relative path to the export file.
///
/// The reference is joined onto the directory of `rel_url` (the linking
/// page's site URL), `..` segments are folded into their parents, and the
/// last segment gets the export extension:
///
/// ```
/// use sitetext::links::normalize_href;
///
/// assert_eq!(normalize_href("../../index.html", "foo/bar/baz/page.html", "txt"), "foo/index.txt");
/// assert_eq!(normalize_href("other.html", "guide/intro.html", "md"), "guide/other.md");
/// ```
pub fn normalize_href(href: &str, rel_url: &str, ext: &str) -> String {
    let (rel_dir, _) = split_last_segment(rel_url);
    let joined = format!("{rel_dir}{href}");

    let mut segments: Vec<&str> = joined
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    reduce_parent_segments(&mut segments);

    let Some(last) = segments.last().copied() else {
        return String::new();
    };
    let name = last.split_once('#').map_or(last, |(name, _)| name);
    let (stem, _) = split_extension(name);
    iri_to_uri(&with_last(&segments, &format!("{stem}.{ext}")))
}

fn with_last(segments: &[&str], last: &str) -> String {
    let mut out = segments[..segments.len() - 1].join("/");
    if !out.is_empty() {
        out.push('/');
    }
    out.push_str(last);
    out
}

/// Remove each `..` together with the segment before it, repeating until
/// nothing changes. A leading `..` has no parent to fold into and stops the
/// reduction.
fn reduce_parent_segments(segments: &mut Vec<&str>) {
    while let Some(i) = segments.iter().position(|s| *s == "..") {
        if i == 0 {
            return;
        }
        segments.drain(i - 1..=i);
    }
}

/// Rewrite every `a[href]` link to the sibling export file.
fn rewrite_doc_links(doc: &mut Document, ext: &str) {
    for id in doc.elements() {
        if !doc.has_tag(id, "a") {
            continue;
        }
        if let Some(href) = doc.get_attr(id, "href") {
            let rewritten = rel_export_href(href, ext);
            doc.set_attr(id, "href", rewritten);
        }
    }
}

/// Make every non-anchor `href` and every `src` absolute.
pub fn replace_asset_hrefs(doc: &mut Document, base_url: &str) {
    for id in doc.elements() {
        if !doc.has_tag(id, "a")
            && let Some(href) = doc.get_attr(id, "href")
        {
            let absolute = abs_asset_href(href, base_url);
            doc.set_attr(id, "href", absolute);
        }
        if let Some(src) = doc.get_attr(id, "src") {
            let absolute = abs_asset_href(src, base_url);
            doc.set_attr(id, "src", absolute);
        }
    }
}

/// Prepare a page that is exported to its own file.
pub fn rewrite_separate(mut doc: Document, base_url: &str, ext: &str) -> Document {
    rewrite_doc_links(&mut doc, ext);
    replace_asset_hrefs(&mut doc, base_url);
    doc
}

/// Prepare a page that becomes one part of a combined export.
pub fn rewrite_combined(mut doc: Document, base_url: &str, rel_url: &str, ext: &str) -> Document {
    for id in doc.elements() {
        if !doc.has_tag(id, "a") {
            continue;
        }
        if let Some(href) = doc.get_attr(id, "href")
            && is_doc(href)
        {
            let normalized = normalize_href(href, rel_url, ext);
            doc.set_attr(id, "href", normalized);
        }
    }
    replace_asset_hrefs(&mut doc, base_url);
    doc
}
