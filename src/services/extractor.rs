//! Product field extraction.
//!
//! Detail pages are uncontrolled HTML; every field is pulled through an
//! ordered chain of fallback strategies and the first non-empty result wins.
//! Name is the only mandatory field: a record without one is dropped with a
//! logged reason. A missing price degrades to 0 ("contact for price"), a
//! missing image to an empty string.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{ExtractionConfig, Product, StoreConfig, now_timestamp};
use crate::services::price::{display_price, parse_price};
use crate::utils::{detail_url, resolve};

/// Pattern matching a number followed by the currency word anywhere in text.
const PRICE_TEXT_PATTERN: &str = r"([0-9][0-9,]*)\s*تومان";

/// Apply string strategies in order; the first non-empty result wins.
fn first_non_empty(strategies: &[&dyn Fn() -> Option<String>]) -> Option<String> {
    strategies.iter().find_map(|strategy| {
        strategy()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

/// Collapse runs of whitespace the way browsers render them.
fn clean_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lazy-loading storefronts move the real source into data attributes.
fn image_source(element: ElementRef<'_>) -> Option<String> {
    ["src", "data-src", "data-lazy-src"]
        .iter()
        .find_map(|attr| element.value().attr(attr))
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts structured products from parsed detail pages.
pub struct ProductExtractor {
    platform: String,
    base_url: String,
    default_category: String,
    title_suffixes: Vec<Regex>,
    name_selectors: Vec<Selector>,
    price_selectors: Vec<Selector>,
    image_selectors: Vec<Selector>,
    image_src_denylist: Vec<String>,
    price_pattern: Regex,
}

impl ProductExtractor {
    /// Compile the configured fallback rules; invalid patterns or selectors
    /// are a fatal configuration error.
    pub fn new(store: &StoreConfig, extraction: &ExtractionConfig) -> Result<Self> {
        let title_suffixes = extraction
            .title_suffix_patterns
            .iter()
            .map(|p| {
                Regex::new(p)
                    .map_err(|e| AppError::config(format!("title suffix pattern '{p}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            platform: store.platform.clone(),
            base_url: store.base_url.clone(),
            default_category: store.default_category.clone(),
            title_suffixes,
            name_selectors: Self::parse_selectors(&extraction.name_selectors)?,
            price_selectors: Self::parse_selectors(&extraction.price_selectors)?,
            image_selectors: Self::parse_selectors(&extraction.image_selectors)?,
            image_src_denylist: extraction.image_src_denylist.clone(),
            price_pattern: Regex::new(PRICE_TEXT_PATTERN)
                .map_err(|e| AppError::config(format!("price pattern: {e}")))?,
        })
    }

    /// Extract a product from a parsed detail page.
    ///
    /// Returns `None` when no strategy yields a name; every other field
    /// degrades instead of rejecting the record.
    pub fn extract(&self, document: &Html, product_id: &str) -> Option<Product> {
        let name = first_non_empty(&[
            &|| self.name_from_title(document),
            &|| self.name_from_heading(document),
            &|| self.name_from_title_class(document),
        ]);

        let Some(name) = name else {
            log::warn!("Product {}: no name found, dropping record", product_id);
            return None;
        };

        let price = self
            .price_from_text(document)
            .or_else(|| self.price_from_selectors(document))
            .unwrap_or(0);
        if price == 0 {
            log::debug!("Product {}: no price found, marking contact-for-price", product_id);
        }

        let image = first_non_empty(&[
            &|| self.image_from_selectors(document),
            &|| self.image_fallback(document),
        ])
        .and_then(|src| resolve(&self.base_url, &src))
        .unwrap_or_default();

        Some(Product {
            product_id: product_id.to_string(),
            platform: self.platform.clone(),
            name,
            price,
            price_formatted: display_price(price),
            image,
            product_url: detail_url(&self.base_url, product_id),
            category: self.default_category.clone(),
            status: "Active".to_string(),
            scraped_at: now_timestamp(),
        })
    }

    /// Strategy 1: document title with store/buy suffixes stripped.
    fn name_from_title(&self, document: &Html) -> Option<String> {
        let title_selector = Selector::parse("title").unwrap();
        let element = document.select(&title_selector).next()?;
        let mut title = clean_text(element);
        for suffix in &self.title_suffixes {
            title = suffix.replace(&title, "").to_string();
        }
        Some(title)
    }

    /// Strategy 2: first level-1 heading.
    fn name_from_heading(&self, document: &Html) -> Option<String> {
        let h1_selector = Selector::parse("h1").unwrap();
        document.select(&h1_selector).next().map(clean_text)
    }

    /// Strategy 3: first element with a product-title class.
    fn name_from_title_class(&self, document: &Html) -> Option<String> {
        self.name_selectors
            .iter()
            .find_map(|selector| document.select(selector).next())
            .map(clean_text)
    }

    /// Price strategy 1: first number-plus-currency-word match in the
    /// document text.
    fn price_from_text(&self, document: &Html) -> Option<u64> {
        let text = document.root_element().text().collect::<String>();
        self.price_pattern
            .captures(&text)
            .map(|caps| parse_price(&caps[1]))
    }

    /// Price strategy 2: configured selectors until one yields a strictly
    /// positive price.
    fn price_from_selectors(&self, document: &Html) -> Option<u64> {
        self.price_selectors.iter().find_map(|selector| {
            document
                .select(selector)
                .next()
                .map(|element| parse_price(&clean_text(element)))
                .filter(|price| *price > 0)
        })
    }

    /// Image strategy 1: elements marked as product imagery.
    fn image_from_selectors(&self, document: &Html) -> Option<String> {
        self.image_selectors
            .iter()
            .find_map(|selector| document.select(selector).next().and_then(image_source))
    }

    /// Image strategy 2: first image whose source is not site decoration.
    fn image_fallback(&self, document: &Html) -> Option<String> {
        let img_selector = Selector::parse("img").unwrap();
        document.select(&img_selector).find_map(|element| {
            image_source(element).filter(|src| {
                let lower = src.to_lowercase();
                !self
                    .image_src_denylist
                    .iter()
                    .any(|denied| lower.contains(denied))
            })
        })
    }

    fn parse_selectors(raw: &[String]) -> Result<Vec<Selector>> {
        raw.iter()
            .map(|s| Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}"))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractionConfig;

    fn extractor() -> ProductExtractor {
        ProductExtractor::new(&StoreConfig::default(), &ExtractionConfig::default()).unwrap()
    }

    fn extractor_with_suffix(pattern: &str) -> ProductExtractor {
        let mut extraction = ExtractionConfig::default();
        extraction.title_suffix_patterns = vec![pattern.to_string()];
        ProductExtractor::new(&StoreConfig::default(), &extraction).unwrap()
    }

    fn page(head: &str, body: &str) -> Html {
        Html::parse_document(&format!(
            "<html><head>{}</head><body>{}</body></html>",
            head, body
        ))
    }

    #[test]
    fn test_name_from_title_strips_store_suffix() {
        let extractor = extractor_with_suffix(r"\s*-\s*Example Store$");
        let document = page("<title>Wireless Mouse - Example Store</title>", "");

        let product = extractor.extract(&document, "4521").unwrap();
        assert_eq!(product.name, "Wireless Mouse");
    }

    #[test]
    fn test_name_falls_back_to_heading() {
        let extractor = extractor_with_suffix(r"^.*$"); // title strips to nothing
        let document = page(
            "<title>anything</title>",
            "<h1>کفش ورزشی مردانه</h1>",
        );

        let product = extractor.extract(&document, "7").unwrap();
        assert_eq!(product.name, "کفش ورزشی مردانه");
    }

    #[test]
    fn test_name_falls_back_to_title_class() {
        let document = page(
            "",
            r#"<div class="product-title">Running Shoes</div>"#,
        );

        let product = extractor().extract(&document, "7").unwrap();
        assert_eq!(product.name, "Running Shoes");
    }

    #[test]
    fn test_record_rejected_without_name() {
        let document = page("", "<p>no product here</p>");
        assert!(extractor().extract(&document, "7").is_none());
    }

    #[test]
    fn test_price_from_document_text() {
        let document = page(
            "<title>Item</title>",
            "<p>قیمت: 1,698,000 تومان</p>",
        );

        let product = extractor().extract(&document, "7").unwrap();
        assert_eq!(product.price, 1_698_000);
        assert_eq!(product.price_formatted, "1,698,000 تومان");
    }

    #[test]
    fn test_price_from_selector_fallback() {
        let document = page(
            "<title>Item</title>",
            r#"<span class="price">248,000</span>"#,
        );

        let product = extractor().extract(&document, "7").unwrap();
        assert_eq!(product.price, 248_000);
    }

    #[test]
    fn test_missing_price_is_contact_for_price() {
        let document = page("<title>Item</title>", "<p>no numbers here</p>");

        let product = extractor().extract(&document, "7").unwrap();
        assert_eq!(product.price, 0);
        assert_eq!(product.price_formatted, crate::services::price::CONTACT_FOR_PRICE);
    }

    #[test]
    fn test_image_skips_denylisted_sources() {
        let document = page(
            "<title>Item</title>",
            r#"
            <img src="logo.png">
            <img src="icon_x.png">
            <img src="product_photo.jpg">
            "#,
        );

        let product = extractor().extract(&document, "7").unwrap();
        assert_eq!(product.image, "https://mihanstore.net/product_photo.jpg");
    }

    #[test]
    fn test_image_prefers_product_imagery_selector() {
        let document = page(
            "<title>Item</title>",
            r#"
            <img src="banner.jpg">
            <img class="product-main" src="/img/main.jpg">
            "#,
        );

        let product = extractor().extract(&document, "7").unwrap();
        assert_eq!(product.image, "https://mihanstore.net/img/main.jpg");
    }

    #[test]
    fn test_image_lazy_source_attribute() {
        let document = page(
            "<title>Item</title>",
            r#"<img class="product" data-src="/img/lazy.jpg">"#,
        );

        let product = extractor().extract(&document, "7").unwrap();
        assert_eq!(product.image, "https://mihanstore.net/img/lazy.jpg");
    }

    #[test]
    fn test_missing_image_is_empty_not_rejected() {
        let document = page("<title>Item</title>", "<p>text only</p>");

        let product = extractor().extract(&document, "7").unwrap();
        assert_eq!(product.image, "");
    }

    #[test]
    fn test_canonical_product_url() {
        let document = page("<title>Item</title>", "");

        let product = extractor().extract(&document, "4521").unwrap();
        assert_eq!(
            product.product_url,
            "https://mihanstore.net/product.php?id=4521"
        );
        assert_eq!(product.key(), "mihanstore_4521");
    }
}
