//! Remote tabular store access.
//!
//! Talks to the Google Sheets values API over REST. The worksheet is the
//! published product snapshot: row 1 is the fixed header, data rows follow in
//! original write order. Reads and writes are batched; one synchronization
//! run issues at most one range read, one append and one batch update.
//!
//! Authentication uses a pre-issued OAuth bearer token from configuration or
//! the `STORESYNC_SHEETS_TOKEN` environment variable; acquiring or refreshing
//! that token is the operator's concern.

pub mod sync;

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{HEADERS, SheetsConfig};

pub use sync::{RowUpdate, SyncEngine, SyncMode, SyncPlan, SyncStats, plan_sync};

/// Environment variable consulted when no token is configured.
pub const TOKEN_ENV: &str = "STORESYNC_SHEETS_TOKEN";

/// First data row; row 1 is reserved for headers.
const DATA_START_ROW: usize = 2;

/// Data range covering all 11 product columns.
const DATA_RANGE: &str = "A2:K";

const COL_PRODUCT_ID: usize = 0;
const COL_PLATFORM: usize = 1;
pub(crate) const COL_PRICE: usize = 3;

/// A materialized data row of the remote table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// 1-based sheet row index
    pub row_number: usize,
    /// Cell values in header order
    pub values: Vec<String>,
}

/// Build the sync key of a row from its positional columns.
///
/// Rows missing the platform cell fall back to the bare product ID so that
/// hand-edited sheets still resolve to some key.
pub fn row_key(row: &TableRow) -> Option<String> {
    let product_id = row.values.get(COL_PRODUCT_ID)?;
    if product_id.is_empty() {
        return None;
    }
    match row.values.get(COL_PLATFORM) {
        Some(platform) if !platform.is_empty() => Some(format!("{platform}_{product_id}")),
        _ => Some(product_id.clone()),
    }
}

/// Index rows by sync key for O(1) diff lookups.
pub fn existing_by_key(rows: Vec<TableRow>) -> HashMap<String, TableRow> {
    rows.into_iter()
        .filter_map(|row| row_key(&row).map(|key| (key, row)))
        .collect()
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// REST client for the spreadsheet holding the product table.
pub struct SheetsClient {
    client: reqwest::Client,
    api_base: String,
    spreadsheet_id: String,
    sheet_name: String,
    token: String,
}

impl SheetsClient {
    /// Create a client from configuration.
    ///
    /// A missing spreadsheet ID or access token is a fatal configuration
    /// error; the run must not proceed without store credentials.
    pub fn new(config: &SheetsConfig) -> Result<Self> {
        if config.spreadsheet_id.trim().is_empty() {
            return Err(AppError::config("sheets.spreadsheet_id is not set"));
        }

        let token = config
            .access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var(TOKEN_ENV).ok().filter(|t| !t.trim().is_empty()))
            .ok_or_else(|| {
                AppError::config(format!(
                    "no Sheets access token: set sheets.access_token or {TOKEN_ENV}"
                ))
            })?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            sheet_name: config.sheet_name.clone(),
            token,
        })
    }

    fn values_url(&self, range_and_op: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.api_base, self.spreadsheet_id, range_and_op
        )
    }

    /// Read the current data rows, numbered from row 2.
    pub async fn read_rows(&self) -> Result<Vec<TableRow>> {
        let url = self.values_url(&format!("{}!{}", self.sheet_name, DATA_RANGE));
        let response = self.client.get(&url).bearer_auth(&self.token).send().await?;
        let body: ValuesResponse = Self::check("read_rows", response).await?.json().await?;

        let rows = body
            .values
            .into_iter()
            .enumerate()
            .map(|(offset, values)| TableRow {
                row_number: DATA_START_ROW + offset,
                values,
            })
            .collect::<Vec<_>>();

        log::info!("Read {} existing rows from sheet", rows.len());
        Ok(rows)
    }

    /// Append new rows after the last existing data row, in one request.
    pub async fn append_rows(&self, rows: &[Vec<String>]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = format!(
            "{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.values_url(&format!("{}!A{}", self.sheet_name, DATA_START_ROW))
        );
        let body = serde_json::json!({ "values": rows });
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::check("append_rows", response).await?;

        log::info!("Appended {} new rows", rows.len());
        Ok(())
    }

    /// Overwrite changed rows in place, all in one batch request.
    pub async fn update_rows(&self, updates: &[RowUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let data: Vec<serde_json::Value> = updates
            .iter()
            .map(|update| {
                serde_json::json!({
                    "range": format!("{}!A{}", self.sheet_name, update.row_number),
                    "values": [update.values],
                })
            })
            .collect();
        let body = serde_json::json!({ "valueInputOption": "RAW", "data": data });

        let url = format!(
            "{}/v4/spreadsheets/{}/values:batchUpdate",
            self.api_base, self.spreadsheet_id
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::check("update_rows", response).await?;

        log::info!("Updated {} existing rows", updates.len());
        Ok(())
    }

    /// Clear every data row below the header.
    pub async fn clear_rows(&self) -> Result<()> {
        let url = format!(
            "{}:clear",
            self.values_url(&format!("{}!{}", self.sheet_name, DATA_RANGE))
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        Self::check("clear_rows", response).await?;

        log::info!("Cleared all data rows");
        Ok(())
    }

    /// Write the fixed header row.
    pub async fn ensure_headers(&self) -> Result<()> {
        let url = format!(
            "{}?valueInputOption=RAW",
            self.values_url(&format!("{}!A1", self.sheet_name))
        );
        let body = serde_json::json!({ "values": [HEADERS] });
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::check("ensure_headers", response).await?;
        Ok(())
    }

    async fn check(context: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::sheets(context, format!("HTTP {status}: {body}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SheetsConfig;

    fn row(row_number: usize, values: &[&str]) -> TableRow {
        TableRow {
            row_number,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn test_row_key_from_positional_columns() {
        let r = row(2, &["4521", "mihanstore", "Wireless Mouse", "120000"]);
        assert_eq!(row_key(&r), Some("mihanstore_4521".to_string()));
    }

    #[test]
    fn test_row_key_without_platform_column() {
        let r = row(2, &["4521"]);
        assert_eq!(row_key(&r), Some("4521".to_string()));
    }

    #[test]
    fn test_row_key_empty_row_is_none() {
        assert_eq!(row_key(&row(2, &[])), None);
        assert_eq!(row_key(&row(2, &["", "mihanstore"])), None);
    }

    #[test]
    fn test_existing_by_key_indexes_rows() {
        let rows = vec![
            row(2, &["1", "mihanstore", "A", "1000"]),
            row(3, &["2", "mihanstore", "B", "2000"]),
            row(4, &[]),
        ];
        let existing = existing_by_key(rows);
        assert_eq!(existing.len(), 2);
        assert_eq!(existing["mihanstore_2"].row_number, 3);
    }

    #[test]
    fn test_client_requires_spreadsheet_id() {
        let config = SheetsConfig {
            access_token: Some("tok".into()),
            ..SheetsConfig::default()
        };
        assert!(SheetsClient::new(&config).is_err());
    }

    #[test]
    fn test_client_with_configured_token() {
        let config = SheetsConfig {
            spreadsheet_id: "sheet123".into(),
            access_token: Some("tok".into()),
            ..SheetsConfig::default()
        };
        let client = SheetsClient::new(&config).unwrap();
        assert_eq!(
            client.values_url("Products!A2:K"),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet123/values/Products!A2:K"
        );
    }
}
