//! Utility functions and helpers.

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a URL string against a base URL string.
pub fn resolve(base_url: &str, href: &str) -> Option<String> {
    Url::parse(base_url)
        .ok()
        .map(|base| resolve_url(&base, href))
}

/// Extract the domain from a URL string.
pub fn get_domain(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
}

/// Extract the product ID from a detail-page URL.
///
/// Detail pages have the shape `<base>/product.php?id=<product_id>`; any URL
/// without that shape yields `None`.
pub fn extract_product_id(url_str: &str) -> Option<String> {
    let parsed = Url::parse(url_str).ok()?;
    if !parsed.path().ends_with("/product.php") {
        return None;
    }
    parsed
        .query_pairs()
        .find(|(key, value)| key == "id" && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Whether a URL addresses a single product detail page.
pub fn is_detail_url(url_str: &str) -> bool {
    extract_product_id(url_str).is_some()
}

/// Build the canonical detail-page URL for a product on the given base domain.
pub fn detail_url(base: &str, product_id: &str) -> String {
    format!("{}/product.php?id={}", base.trim_end_matches('/'), product_id)
}
