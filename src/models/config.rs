//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and scraping behavior settings
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Storefront definition (domains, categories)
    #[serde(default)]
    pub store: StoreConfig,

    /// Field extraction fallback rules
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Remote spreadsheet settings
    #[serde(default)]
    pub sheets: SheetsConfig,

    /// Local output artifact settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::validation("scraper.user_agent is empty"));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::validation("scraper.timeout_secs must be > 0"));
        }
        if self.scraper.max_products == 0 {
            return Err(AppError::validation("scraper.max_products must be > 0"));
        }
        if self.store.platform.trim().is_empty() {
            return Err(AppError::validation("store.platform is empty"));
        }
        let base = url::Url::parse(&self.store.base_url)
            .map_err(|e| AppError::validation(format!("store.base_url: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AppError::validation("store.base_url must be http(s)"));
        }
        for domain in &self.store.fallback_domains {
            url::Url::parse(domain)
                .map_err(|e| AppError::validation(format!("store.fallback_domains '{domain}': {e}")))?;
        }
        for pattern in &self.extraction.title_suffix_patterns {
            regex::Regex::new(pattern)
                .map_err(|e| AppError::validation(format!("extraction.title_suffix_patterns: {e}")))?;
        }
        if self.sheets.sheet_name.trim().is_empty() {
            return Err(AppError::validation("sheets.sheet_name is empty"));
        }
        Ok(())
    }
}

/// HTTP client and scraping behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between detail-page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Delay between category batches in milliseconds
    #[serde(default = "defaults::category_delay")]
    pub category_delay_ms: u64,

    /// Maximum number of detail pages per category
    #[serde(default = "defaults::max_products")]
    pub max_products: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            category_delay_ms: defaults::category_delay(),
            max_products: defaults::max_products(),
        }
    }
}

/// Storefront definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Platform identifier stored on every product
    #[serde(default = "defaults::platform")]
    pub platform: String,

    /// Primary storefront base URL
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Alternate base domains tried when a detail-page fetch fails
    #[serde(default = "defaults::fallback_domains")]
    pub fallback_domains: Vec<String>,

    /// Category listing URLs to scan (base_url is used when empty)
    #[serde(default)]
    pub categories: Vec<String>,

    /// Category assigned to products when the page offers none
    #[serde(default = "defaults::default_category")]
    pub default_category: String,
}

impl StoreConfig {
    /// Listing pages to scan, falling back to the storefront root.
    pub fn listing_urls(&self) -> Vec<String> {
        if self.categories.is_empty() {
            vec![self.base_url.clone()]
        } else {
            self.categories.clone()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            platform: defaults::platform(),
            base_url: defaults::base_url(),
            fallback_domains: defaults::fallback_domains(),
            categories: Vec::new(),
            default_category: defaults::default_category(),
        }
    }
}

/// Field extraction fallback rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Regex patterns stripped from the tail of the document title
    #[serde(default = "defaults::title_suffix_patterns")]
    pub title_suffix_patterns: Vec<String>,

    /// CSS selectors for elements carrying the product title
    #[serde(default = "defaults::name_selectors")]
    pub name_selectors: Vec<String>,

    /// CSS selectors tried in order for the price element
    #[serde(default = "defaults::price_selectors")]
    pub price_selectors: Vec<String>,

    /// CSS selectors for product imagery
    #[serde(default = "defaults::image_selectors")]
    pub image_selectors: Vec<String>,

    /// Substrings marking an image source as decoration, not product imagery
    #[serde(default = "defaults::image_src_denylist")]
    pub image_src_denylist: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            title_suffix_patterns: defaults::title_suffix_patterns(),
            name_selectors: defaults::name_selectors(),
            price_selectors: defaults::price_selectors(),
            image_selectors: defaults::image_selectors(),
            image_src_denylist: defaults::image_src_denylist(),
        }
    }
}

/// Remote spreadsheet settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Target spreadsheet ID
    #[serde(default)]
    pub spreadsheet_id: String,

    /// Worksheet name holding the product table
    #[serde(default = "defaults::sheet_name")]
    pub sheet_name: String,

    /// Sheets API base URL
    #[serde(default = "defaults::sheets_api_base")]
    pub api_base: String,

    /// OAuth bearer token (falls back to STORESYNC_SHEETS_TOKEN env var)
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: defaults::sheet_name(),
            api_base: defaults::sheets_api_base(),
            access_token: None,
        }
    }
}

/// Local output artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving products.json and summary.json
    #[serde(default = "defaults::data_dir")]
    pub data_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
        }
    }
}

mod defaults {
    // Scraper defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        500
    }
    pub fn category_delay() -> u64 {
        2000
    }
    pub fn max_products() -> usize {
        30
    }

    // Store defaults
    pub fn platform() -> String {
        "mihanstore".into()
    }
    pub fn base_url() -> String {
        "https://mihanstore.net".into()
    }
    pub fn fallback_domains() -> Vec<String> {
        vec![
            "https://www.mihanstore.net".into(),
            "https://affiliate-marketing.mihanstore.net".into(),
        ]
    }
    pub fn default_category() -> String {
        "Fashion".into()
    }

    // Extraction defaults
    pub fn title_suffix_patterns() -> Vec<String> {
        vec![
            r"\s*[-|–]\s*میهن\s?استور.*$".into(),
            r"(?i)\s*[-|–]\s*mihanstore.*$".into(),
            r"\s*[-|–]\s*خرید\s.*$".into(),
        ]
    }
    pub fn name_selectors() -> Vec<String> {
        vec![
            r#"[class*="product-title"]"#.into(),
            r#"[class*="product_title"]"#.into(),
            ".product-name".into(),
        ]
    }
    pub fn price_selectors() -> Vec<String> {
        vec![
            ".price".into(),
            ".product-price".into(),
            ".price-current".into(),
            r#"span[class*="price"]"#.into(),
        ]
    }
    pub fn image_selectors() -> Vec<String> {
        vec![
            r#"img[class*="product"]"#.into(),
            r#"img[id*="product"]"#.into(),
            ".product-image img".into(),
        ]
    }
    pub fn image_src_denylist() -> Vec<String> {
        vec![
            "logo".into(),
            "icon".into(),
            "banner".into(),
            "button".into(),
        ]
    }

    // Sheets defaults
    pub fn sheet_name() -> String {
        "Products".into()
    }
    pub fn sheets_api_base() -> String {
        "https://sheets.googleapis.com".into()
    }

    // Output defaults
    pub fn data_dir() -> String {
        "data".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.scraper.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.scraper.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.store.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_title_pattern() {
        let mut config = Config::default();
        config.extraction.title_suffix_patterns = vec!["([unclosed".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn listing_urls_fall_back_to_base() {
        let store = StoreConfig::default();
        assert_eq!(store.listing_urls(), vec![store.base_url.clone()]);

        let mut store = StoreConfig::default();
        store.categories = vec!["https://mihanstore.net/cat.php?id=7".into()];
        assert_eq!(store.listing_urls(), store.categories);
    }

    #[test]
    fn config_parses_partial_toml() {
        let toml = r#"
            [scraper]
            max_products = 5

            [sheets]
            spreadsheet_id = "abc123"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.scraper.max_products, 5);
        assert_eq!(config.sheets.spreadsheet_id, "abc123");
        assert_eq!(config.scraper.timeout_secs, 30);
        assert_eq!(config.store.platform, "mihanstore");
    }
}
