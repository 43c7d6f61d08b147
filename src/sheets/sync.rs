//! Diff-based upsert synchronization.
//!
//! Planning is pure: scraped products are diffed against the existing row
//! index and classified as added, updated or unchanged. Only the price cell
//! decides updated-vs-unchanged; a refreshed timestamp or a reworded name
//! never triggers a rewrite. Execution then issues at most one batched
//! append and one batched update.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::Result;
use crate::models::{Product, now_timestamp};
use crate::services::price::parse_price;
use crate::sheets::{COL_PRICE, SheetsClient, TableRow, existing_by_key};

/// How scraped products are reconciled with the existing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Upsert: update changed rows, append new ones, skip the rest.
    #[default]
    Update,
    /// Clear all data rows first, then append everything.
    Replace,
    /// Always append, never read the table. Duplicate keys are accepted as
    /// a known limitation of this mode.
    AppendOnly,
}

impl SyncMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "update" => Some(Self::Update),
            "replace" => Some(Self::Replace),
            "append-only" | "append" => Some(Self::AppendOnly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Replace => "replace",
            Self::AppendOnly => "append-only",
        }
    }
}

/// Counts returned by a synchronization run.
///
/// `added + updated + unchanged` always equals the number of products
/// considered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// A single-row overwrite at a stored row index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdate {
    pub row_number: usize,
    pub values: Vec<String>,
}

/// The writes a synchronization run will issue, plus their classification.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub appends: Vec<Vec<String>>,
    pub updates: Vec<RowUpdate>,
    pub stats: SyncStats,
}

/// Diff scraped products against the existing row index.
///
/// The stored price cell is compared numerically so formatting variance in
/// hand-edited sheets does not cause spurious rewrites.
pub fn plan_sync(products: &[Product], existing: &HashMap<String, TableRow>) -> SyncPlan {
    let now = now_timestamp();
    let mut plan = SyncPlan::default();

    for product in products {
        let row = product.to_row(&now);
        match existing.get(&product.key()) {
            Some(stored) => {
                let stored_price = stored
                    .values
                    .get(COL_PRICE)
                    .map(|cell| parse_price(cell))
                    .unwrap_or(0);
                if stored_price != product.price {
                    plan.updates.push(RowUpdate {
                        row_number: stored.row_number,
                        values: row,
                    });
                    plan.stats.updated += 1;
                } else {
                    plan.stats.unchanged += 1;
                }
            }
            None => {
                plan.appends.push(row);
                plan.stats.added += 1;
            }
        }
    }

    plan
}

/// Executes sync plans against the remote table.
pub struct SyncEngine<'a> {
    sheets: &'a SheetsClient,
}

impl<'a> SyncEngine<'a> {
    pub fn new(sheets: &'a SheetsClient) -> Self {
        Self { sheets }
    }

    /// Reconcile scraped products with the remote table.
    ///
    /// A failed existing-row read degrades the run to append-only rather
    /// than aborting; a failed write surfaces to the caller and leaves the
    /// counts unreliable (already-issued writes are not rolled back).
    pub async fn synchronize(&self, products: &[Product], mode: SyncMode) -> Result<SyncStats> {
        log::info!(
            "Synchronizing {} products (mode: {})",
            products.len(),
            mode.as_str()
        );

        let existing = match mode {
            SyncMode::Update => match self.sheets.read_rows().await {
                Ok(rows) => existing_by_key(rows),
                Err(error) => {
                    log::warn!(
                        "Existing-row read failed, treating all products as new: {}",
                        error
                    );
                    HashMap::new()
                }
            },
            SyncMode::Replace => {
                self.sheets.clear_rows().await?;
                self.sheets.ensure_headers().await?;
                HashMap::new()
            }
            SyncMode::AppendOnly => HashMap::new(),
        };

        let plan = plan_sync(products, &existing);

        self.sheets.append_rows(&plan.appends).await?;
        self.sheets.update_rows(&plan.updates).await?;

        Ok(plan.stats)
    }
}
