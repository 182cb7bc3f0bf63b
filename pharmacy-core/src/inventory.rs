use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::StoreError;

/// Quantity of one medication held by one pharmacy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockEntry {
    pub pharmacy_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub last_updated: DateTime<Utc>,
}

/// Inventory service. Rows are maintained outside the ordering pipeline;
/// there is at most one row per (pharmacy, product).
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn stock_entry(
        &self,
        product_id: Uuid,
        pharmacy_id: Uuid,
    ) -> Result<Option<StockEntry>, StoreError>;

    async fn stock_entries(&self, product_id: Uuid) -> Result<Vec<StockEntry>, StoreError>;
}
