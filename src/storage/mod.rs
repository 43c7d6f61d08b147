//! Local output artifacts.
//!
//! Each scrape run leaves two JSON files in the data directory:
//!
//! ```text
//! {data_dir}/
//! ├── products.json   # platform → scraped products
//! └── summary.json    # per-platform count and price statistics
//! ```
//!
//! `products.json` doubles as the input of a later `sync` invocation, so
//! writes are atomic (temp file + rename) to never leave a half-written
//! artifact behind.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Product, ScrapeSummary};

const PRODUCTS_FILE: &str = "products.json";
const SUMMARY_FILE: &str = "summary.json";

/// Filesystem store for scrape artifacts.
#[derive(Clone)]
pub struct LocalStore {
    data_dir: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Write the scraped products grouped by platform.
    pub async fn write_products(
        &self,
        by_platform: &HashMap<String, Vec<Product>>,
    ) -> Result<()> {
        self.write_json(PRODUCTS_FILE, by_platform).await?;
        let total: usize = by_platform.values().map(Vec::len).sum();
        log::info!(
            "Saved {} products to {}",
            total,
            self.path(PRODUCTS_FILE).display()
        );
        Ok(())
    }

    /// Write the derived summary artifact.
    pub async fn write_summary(&self, summary: &ScrapeSummary) -> Result<()> {
        self.write_json(SUMMARY_FILE, summary).await?;
        log::info!("Saved summary to {}", self.path(SUMMARY_FILE).display());
        Ok(())
    }

    /// Load a previously written products artifact, if any.
    pub async fn load_products(&self) -> Result<Option<HashMap<String, Vec<Product>>>> {
        self.read_json(PRODUCTS_FILE).await
    }

    fn path(&self, key: &str) -> PathBuf {
        self.data_dir.join(key)
    }

    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_product() -> Product {
        Product {
            product_id: "4521".to_string(),
            platform: "mihanstore".to_string(),
            name: "Wireless Mouse".to_string(),
            price: 120_000,
            price_formatted: "120,000 تومان".to_string(),
            image: String::new(),
            product_url: "https://mihanstore.net/product.php?id=4521".to_string(),
            category: "Fashion".to_string(),
            status: "Active".to_string(),
            scraped_at: "2026-08-05 06:00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_products_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let mut by_platform = HashMap::new();
        by_platform.insert("mihanstore".to_string(), vec![sample_product()]);

        store.write_products(&by_platform).await.unwrap();
        let loaded = store.load_products().await.unwrap().unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["mihanstore"][0], sample_product());
    }

    #[tokio::test]
    async fn test_load_missing_products_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        assert!(store.load_products().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_summary_written() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let mut by_platform = HashMap::new();
        by_platform.insert("mihanstore".to_string(), vec![sample_product()]);
        let summary = ScrapeSummary::build(&by_platform);

        store.write_summary(&summary).await.unwrap();
        assert!(tmp.path().join("summary.json").exists());
    }
}
