//! Pipeline entry points for scraper operations.
//!
//! - `run_scrape`: listing discovery → sequential detail fetch → extraction
//! - `run_sync`: diff-based upsert against the remote table

use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;
use crate::models::{Config, Product, ScrapeOutcome};
use crate::services::{LinkDiscoverer, PageFetcher, ProductExtractor};
use crate::sheets::{SheetsClient, SyncEngine, SyncMode, SyncStats};
use crate::utils::extract_product_id;

/// Scrape every configured listing page.
///
/// Detail pages are fetched one at a time with a fixed delay between
/// requests and a longer delay between listing batches; the delays are
/// backpressure against the storefront, not a tuning knob. No fetch or
/// extraction failure terminates the run.
pub async fn run_scrape(config: &Config) -> Result<ScrapeOutcome> {
    let fetcher = PageFetcher::new(&config.scraper, &config.store)?;
    let discoverer = LinkDiscoverer::new(&fetcher);
    let extractor = ProductExtractor::new(&config.store, &config.extraction)?;

    let request_delay = Duration::from_millis(config.scraper.request_delay_ms);
    let category_delay = Duration::from_millis(config.scraper.category_delay_ms);

    let listings = config.store.listing_urls();
    let mut outcome = ScrapeOutcome::default();

    for (index, listing_url) in listings.iter().enumerate() {
        log::info!(
            "Scanning listing {}/{}: {}",
            index + 1,
            listings.len(),
            listing_url
        );

        let links = discoverer
            .discover(listing_url, config.scraper.max_products)
            .await;
        outcome.links_found += links.len();

        for link in links {
            let Some(product_id) = extract_product_id(&link) else {
                continue;
            };

            match fetcher.fetch(&link).await {
                Some(document) => {
                    outcome.pages_fetched += 1;
                    match extractor.extract(&document, &product_id) {
                        Some(product) => {
                            log::info!("Scraped {}: {}", product.key(), product.name);
                            outcome.products.push(product);
                        }
                        None => outcome.extract_failures += 1,
                    }
                }
                None => outcome.fetch_failures += 1,
            }

            if !request_delay.is_zero() {
                tokio::time::sleep(request_delay).await;
            }
        }

        if index + 1 < listings.len() && !category_delay.is_zero() {
            tokio::time::sleep(category_delay).await;
        }
    }

    log::info!(
        "Scrape complete: {} products from {} links ({} fetch misses, {} extract misses)",
        outcome.products.len(),
        outcome.links_found,
        outcome.fetch_failures,
        outcome.extract_failures
    );
    Ok(outcome)
}

/// Reconcile scraped products with the remote table.
pub async fn run_sync(
    products: &[Product],
    sheets: &SheetsClient,
    mode: SyncMode,
) -> Result<SyncStats> {
    let stats = SyncEngine::new(sheets).synchronize(products, mode).await?;
    log::info!(
        "Upload finished: +{} | ~{} | ={}",
        stats.added,
        stats.updated,
        stats.unchanged
    );
    Ok(stats)
}

/// Group scraped products by platform for the output artifacts.
pub fn group_by_platform(products: &[Product]) -> HashMap<String, Vec<Product>> {
    let mut by_platform: HashMap<String, Vec<Product>> = HashMap::new();
    for product in products {
        by_platform
            .entry(product.platform.clone())
            .or_default()
            .push(product.clone());
    }
    by_platform
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(platform: &str, product_id: &str) -> Product {
        Product {
            product_id: product_id.to_string(),
            platform: platform.to_string(),
            name: "Item".to_string(),
            price: 1000,
            price_formatted: "1,000 تومان".to_string(),
            image: String::new(),
            product_url: String::new(),
            category: "Fashion".to_string(),
            status: "Active".to_string(),
            scraped_at: "2026-08-05 06:00:00".to_string(),
        }
    }

    #[test]
    fn test_group_by_platform() {
        let products = vec![
            make_product("mihanstore", "1"),
            make_product("mihanstore", "2"),
            make_product("digikala", "9"),
        ];

        let grouped = group_by_platform(&products);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["mihanstore"].len(), 2);
        assert_eq!(grouped["digikala"].len(), 1);
    }
}
