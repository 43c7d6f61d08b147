//! Product data structures.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Column headers of the synchronized product table, in sheet order.
pub const HEADERS: [&str; 11] = [
    "Product ID",
    "Platform",
    "Name",
    "Price (Toman)",
    "Price Formatted",
    "Image URL",
    "Product URL",
    "Category",
    "Status",
    "Last Updated",
    "Scraped At",
];

/// A product scraped from a storefront detail page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    /// Platform-local identifier taken from the detail-page URL
    pub product_id: String,

    /// Source store identifier
    pub platform: String,

    /// Product name (extraction rejects records without one)
    pub name: String,

    /// Normalized price in toman; 0 means unknown / contact for price
    pub price: u64,

    /// Display form of the price
    pub price_formatted: String,

    /// Absolute image URL, or empty
    pub image: String,

    /// Canonical detail-page URL
    pub product_url: String,

    /// Listing category
    pub category: String,

    /// Listing status
    pub status: String,

    /// Capture time, formatted `%Y-%m-%d %H:%M:%S`
    pub scraped_at: String,
}

impl Product {
    /// Unique key of a product within the synchronized table.
    pub fn key(&self) -> String {
        format!("{}_{}", self.platform, self.product_id)
    }

    /// Convert to a sheet row in [`HEADERS`] order.
    pub fn to_row(&self, last_updated: &str) -> Vec<String> {
        vec![
            self.product_id.clone(),
            self.platform.clone(),
            self.name.clone(),
            self.price.to_string(),
            self.price_formatted.clone(),
            self.image.clone(),
            self.product_url.clone(),
            self.category.clone(),
            self.status.clone(),
            last_updated.to_string(),
            self.scraped_at.clone(),
        ]
    }
}

/// Timestamp format used throughout the sheet and artifacts.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current time formatted for sheet cells.
pub fn now_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Summary of a scrape run.
#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    pub products: Vec<Product>,
    pub links_found: usize,
    pub pages_fetched: usize,
    pub fetch_failures: usize,
    pub extract_failures: usize,
}

/// Aggregate statistics for one platform's products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSummary {
    pub count: usize,
    pub avg_price: f64,
    pub min_price: u64,
    pub max_price: u64,
    pub categories: Vec<String>,
}

/// Derived summary artifact for a scrape run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeSummary {
    pub generated_at: String,
    pub total_products: usize,
    pub platforms: HashMap<String, PlatformSummary>,
}

impl ScrapeSummary {
    /// Build a summary from products grouped by platform.
    pub fn build(by_platform: &HashMap<String, Vec<Product>>) -> Self {
        let mut platforms = HashMap::new();
        let mut total = 0;

        for (platform, products) in by_platform {
            if products.is_empty() {
                continue;
            }
            total += products.len();

            let prices: Vec<u64> = products.iter().map(|p| p.price).collect();
            let sum: u64 = prices.iter().sum();

            let mut categories: Vec<String> =
                products.iter().map(|p| p.category.clone()).collect();
            categories.sort();
            categories.dedup();

            platforms.insert(
                platform.clone(),
                PlatformSummary {
                    count: products.len(),
                    avg_price: sum as f64 / products.len() as f64,
                    min_price: prices.iter().copied().min().unwrap_or(0),
                    max_price: prices.iter().copied().max().unwrap_or(0),
                    categories,
                },
            );
        }

        Self {
            generated_at: now_timestamp(),
            total_products: total,
            platforms,
        }
    }
}
