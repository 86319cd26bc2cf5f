//! Page registry for combined exports.
//!
//! Slots are laid out once, in navigation order, before any page is built.
//! Each page then fills its own slot exactly once; the combined export reads
//! the slots back in order.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};

/// One page's contribution to the combined export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlot {
    pub html: String,
    pub base_url: String,
    pub site_url: String,
}

#[derive(Debug, Default)]
pub struct PageRegistry {
    urls: Vec<String>,
    slots: Vec<Option<PageSlot>>,
    index: HashMap<String, usize>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay out one slot per distinct URL, in order.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for url in urls {
            registry.register(url);
        }
        registry
    }

    /// Reserve a slot for a page, returning its position.
    ///
    /// Registering a URL twice keeps the first position.
    pub fn register(&mut self, url: impl Into<String>) -> usize {
        let url = url.into();
        if let Some(&pos) = self.index.get(&url) {
            debug!("Page {url} already registered at position {pos}");
            return pos;
        }
        let pos = self.slots.len();
        self.index.insert(url.clone(), pos);
        self.urls.push(url);
        self.slots.push(None);
        pos
    }

    /// Fill the slot registered for `site_url`.
    pub fn contribute(&mut self, html: &str, base_url: &str, site_url: &str) -> Result<()> {
        let pos = *self
            .index
            .get(site_url)
            .ok_or_else(|| Error::UnknownPage(site_url.to_owned()))?;
        let slot = &mut self.slots[pos];
        if slot.is_some() {
            return Err(Error::DuplicatePage(site_url.to_owned()));
        }
        *slot = Some(PageSlot {
            html: html.to_owned(),
            base_url: base_url.to_owned(),
            site_url: site_url.to_owned(),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots in navigation order, with the URL each was registered under.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&PageSlot>)> {
        self.urls
            .iter()
            .map(String::as_str)
            .zip(self.slots.iter().map(Option::as_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_follow_navigation_order() {
        let mut registry = PageRegistry::from_urls(["index.html", "guide/", "about/"]);
        registry.contribute("<p>b</p>", "file:///b", "about/").unwrap();
        registry.contribute("<p>a</p>", "file:///a", "index.html").unwrap();

        let urls: Vec<_> = registry.iter().map(|(url, slot)| (url, slot.is_some())).collect();
        assert_eq!(urls, vec![("index.html", true), ("guide/", false), ("about/", true)]);
    }

    #[test]
    fn test_unknown_page_rejected() {
        let mut registry = PageRegistry::from_urls(["index.html"]);
        let err = registry.contribute("", "", "other.html").unwrap_err();
        assert!(matches!(err, Error::UnknownPage(url) if url == "other.html"));
    }

    #[test]
    fn test_slot_filled_at_most_once() {
        let mut registry = PageRegistry::from_urls(["index.html"]);
        registry.contribute("<p>1</p>", "", "index.html").unwrap();
        let err = registry.contribute("<p>2</p>", "", "index.html").unwrap_err();

        assert!(matches!(err, Error::DuplicatePage(_)));
        let (_, slot) = registry.iter().next().unwrap();
        assert_eq!(slot.unwrap().html, "<p>1</p>");
    }

    #[test]
    fn test_duplicate_registration_keeps_position() {
        let mut registry = PageRegistry::new();
        assert_eq!(registry.register("a"), 0);
        assert_eq!(registry.register("b"), 1);
        assert_eq!(registry.register("a"), 0);
        assert_eq!(registry.len(), 2);
    }
}
