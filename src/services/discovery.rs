//! Detail-page link discovery.
//!
//! Scans a listing page for product detail links, deduplicating into a set
//! capped at the requested limit. Link order beyond deduplication is not
//! guaranteed; consumers must not depend on it.

use std::collections::HashSet;

use scraper::{Html, Selector};

use crate::services::PageFetcher;
use crate::utils::{is_detail_url, resolve};

/// Service discovering product detail links on listing pages.
pub struct LinkDiscoverer<'a> {
    fetcher: &'a PageFetcher,
}

impl<'a> LinkDiscoverer<'a> {
    pub fn new(fetcher: &'a PageFetcher) -> Self {
        Self { fetcher }
    }

    /// Discover up to `limit` unique detail-page URLs on a listing page.
    ///
    /// An unfetchable listing page yields an empty set; the caller treats
    /// that as a recoverable miss, not a fatal condition.
    pub async fn discover(&self, base_url: &str, limit: usize) -> HashSet<String> {
        let Some(document) = self.fetcher.fetch(base_url).await else {
            log::warn!("Listing page unavailable, skipping: {}", base_url);
            return HashSet::new();
        };

        let links = collect_detail_links(&document, base_url, limit);
        log::info!("Discovered {} detail links on {}", links.len(), base_url);
        links
    }
}

/// Scan hyperlink elements for detail-page URLs.
///
/// Relative hrefs are resolved against `base_url` before the detail-shape
/// check; scanning stops once `limit` unique links are collected.
pub fn collect_detail_links(document: &Html, base_url: &str, limit: usize) -> HashSet<String> {
    let link_selector = Selector::parse("a[href]").unwrap();
    let mut links = HashSet::new();

    for element in document.select(&link_selector) {
        if links.len() >= limit {
            break;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(absolute) = resolve(base_url, href) else {
            continue;
        };
        if is_detail_url(&absolute) {
            links.insert(absolute);
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{}</body></html>", body))
    }

    const BASE: &str = "https://mihanstore.net/";

    #[test]
    fn test_collects_detail_links_and_resolves_relative() {
        let document = listing(
            r#"
            <a href="product.php?id=1">A</a>
            <a href="/product.php?id=2">B</a>
            <a href="https://mihanstore.net/product.php?id=3">C</a>
            "#,
        );
        let links = collect_detail_links(&document, BASE, 10);
        assert_eq!(links.len(), 3);
        assert!(links.contains("https://mihanstore.net/product.php?id=1"));
        assert!(links.contains("https://mihanstore.net/product.php?id=2"));
        assert!(links.contains("https://mihanstore.net/product.php?id=3"));
    }

    #[test]
    fn test_skips_non_detail_links() {
        let document = listing(
            r#"
            <a href="cat.php?id=5">category</a>
            <a href="about.html">about</a>
            <a href="product.php">no id</a>
            <a href="product.php?id=8">real</a>
            "#,
        );
        let links = collect_detail_links(&document, BASE, 10);
        assert_eq!(links.len(), 1);
        assert!(links.contains("https://mihanstore.net/product.php?id=8"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let document = listing(
            r#"
            <a href="product.php?id=4">thumb</a>
            <a href="product.php?id=4">title</a>
            <a href="/product.php?id=4">again</a>
            "#,
        );
        let links = collect_detail_links(&document, BASE, 10);
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_limit_is_respected() {
        let body: String = (1..=20)
            .map(|i| format!(r#"<a href="product.php?id={}">p</a>"#, i))
            .collect();
        let document = listing(&body);
        let links = collect_detail_links(&document, BASE, 5);
        assert_eq!(links.len(), 5);
    }

    #[test]
    fn test_limit_zero_returns_empty() {
        let document = listing(r#"<a href="product.php?id=1">p</a>"#);
        assert!(collect_detail_links(&document, BASE, 0).is_empty());
    }
}
