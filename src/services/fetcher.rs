//! Page fetching with fallback-domain retry.
//!
//! A fetch miss is a recoverable condition here: callers receive `None` and
//! the run continues with the next link. Only detail-page URLs are retried
//! against the configured fallback domains.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderValue};
use scraper::Html;

use crate::error::Result;
use crate::models::{ScraperConfig, StoreConfig};
use crate::utils::{detail_url, extract_product_id};

/// HTTP page fetcher holding the session client and fallback-domain list.
pub struct PageFetcher {
    client: Client,
    fallback_domains: Vec<String>,
}

impl PageFetcher {
    /// Create a fetcher with the browser-like identity header set.
    ///
    /// Accept-Encoding is supplied by reqwest's compression features so
    /// response bodies are decompressed transparently.
    pub fn new(scraper: &ScraperConfig, store: &StoreConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("fa,en;q=0.9"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .user_agent(&scraper.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(scraper.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            fallback_domains: store.fallback_domains.clone(),
        })
    }

    /// Fetch a page and parse it as HTML.
    ///
    /// On failure, detail-page URLs are retried against each fallback domain
    /// in order; listing-page failures are not retried. All failures resolve
    /// to `None` and are logged.
    pub async fn fetch(&self, url: &str) -> Option<Html> {
        match self.get_document(url).await {
            Ok(document) => Some(document),
            Err(error) => {
                log::warn!("Fetch failed for {}: {}", url, error);
                match extract_product_id(url) {
                    Some(product_id) => self.fetch_via_fallbacks(&product_id).await,
                    None => None,
                }
            }
        }
    }

    /// Retry a detail page against the fallback domains, first success wins.
    async fn fetch_via_fallbacks(&self, product_id: &str) -> Option<Html> {
        for domain in &self.fallback_domains {
            let url = detail_url(domain, product_id);
            match self.get_document(&url).await {
                Ok(document) => {
                    log::info!("Fallback domain served product {}: {}", product_id, domain);
                    return Some(document);
                }
                Err(error) => {
                    log::warn!("Fallback fetch failed for {}: {}", url, error);
                }
            }
        }
        log::warn!("All fallback domains exhausted for product {}", product_id);
        None
    }

    async fn get_document(&self, url: &str) -> Result<Html> {
        let text = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(Html::parse_document(&text))
    }
}
