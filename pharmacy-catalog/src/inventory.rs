use pharmacy_core::{InventorySource, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Stock of one medication in one pharmacy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PharmacyStockLevel {
    pub pharmacy_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub available: bool,
}

/// Chain-wide stock of one medication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicationAvailability {
    pub product_id: Uuid,
    pub total_quantity: i64,
    pub in_stock: bool,
    /// Only pharmacies holding at least one unit.
    pub pharmacies: Vec<PharmacyStockLevel>,
}

/// Read-only view of per-pharmacy stock.
///
/// A missing stock row counts as zero. Nothing here reserves or decrements
/// stock; checkout does not consult the ledger.
#[derive(Clone)]
pub struct StockLedger {
    source: Arc<dyn InventorySource>,
}

impl StockLedger {
    pub fn new(source: Arc<dyn InventorySource>) -> Self {
        Self { source }
    }

    /// Units of `product_id` in `pharmacy_id`, or across the whole chain.
    pub async fn quantity(
        &self,
        product_id: Uuid,
        pharmacy_id: Option<Uuid>,
    ) -> Result<i64, StoreError> {
        match pharmacy_id {
            Some(pharmacy_id) => Ok(self
                .source
                .stock_entry(product_id, pharmacy_id)
                .await?
                .map(|entry| entry.quantity)
                .unwrap_or(0)),
            None => Ok(self
                .source
                .stock_entries(product_id)
                .await?
                .iter()
                .map(|entry| entry.quantity)
                .sum()),
        }
    }

    pub async fn is_available(
        &self,
        product_id: Uuid,
        pharmacy_id: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        Ok(self.quantity(product_id, pharmacy_id).await? > 0)
    }

    pub async fn check_medication(
        &self,
        pharmacy_id: Uuid,
        product_id: Uuid,
    ) -> Result<PharmacyStockLevel, StoreError> {
        let quantity = self.quantity(product_id, Some(pharmacy_id)).await?;
        Ok(PharmacyStockLevel {
            pharmacy_id,
            product_id,
            quantity,
            available: quantity > 0,
        })
    }

    pub async fn availability(&self, product_id: Uuid) -> Result<MedicationAvailability, StoreError> {
        let entries = self.source.stock_entries(product_id).await?;
        let total_quantity = entries.iter().map(|entry| entry.quantity).sum();

        let pharmacies = entries
            .into_iter()
            .filter(|entry| entry.quantity > 0)
            .map(|entry| PharmacyStockLevel {
                pharmacy_id: entry.pharmacy_id,
                product_id,
                quantity: entry.quantity,
                available: true,
            })
            .collect();

        Ok(MedicationAvailability {
            product_id,
            total_quantity,
            in_stock: total_quantity > 0,
            pharmacies,
        })
    }

    /// Pharmacies that currently hold `product_id`.
    pub async fn available_pharmacies(&self, product_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .availability(product_id)
            .await?
            .pharmacies
            .into_iter()
            .map(|level| level.pharmacy_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use pharmacy_core::StockEntry;

    struct StockRows(Vec<StockEntry>);

    #[async_trait]
    impl InventorySource for StockRows {
        async fn stock_entry(
            &self,
            product_id: Uuid,
            pharmacy_id: Uuid,
        ) -> Result<Option<StockEntry>, StoreError> {
            Ok(self
                .0
                .iter()
                .find(|e| e.product_id == product_id && e.pharmacy_id == pharmacy_id)
                .cloned())
        }

        async fn stock_entries(&self, product_id: Uuid) -> Result<Vec<StockEntry>, StoreError> {
            Ok(self.0.iter().filter(|e| e.product_id == product_id).cloned().collect())
        }
    }

    fn entry(pharmacy_id: Uuid, product_id: Uuid, quantity: i64) -> StockEntry {
        StockEntry {
            pharmacy_id,
            product_id,
            quantity,
            last_updated: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_quantity_aggregates_across_pharmacies() {
        let (central, north, south) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let aspirin = Uuid::new_v4();
        let ledger = StockLedger::new(Arc::new(StockRows(vec![
            entry(central, aspirin, 12),
            entry(north, aspirin, 0),
            entry(central, Uuid::new_v4(), 40),
        ])));

        assert_eq!(ledger.quantity(aspirin, None).await.unwrap(), 12);
        assert_eq!(ledger.quantity(aspirin, Some(central)).await.unwrap(), 12);
        assert_eq!(ledger.quantity(aspirin, Some(north)).await.unwrap(), 0);
        // No row at all is zero, not an error
        assert_eq!(ledger.quantity(aspirin, Some(south)).await.unwrap(), 0);
        assert!(!ledger.is_available(aspirin, Some(south)).await.unwrap());
        assert!(ledger.is_available(aspirin, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_product_is_unavailable() {
        let ledger = StockLedger::new(Arc::new(StockRows(Vec::new())));
        let product = Uuid::new_v4();

        assert_eq!(ledger.quantity(product, None).await.unwrap(), 0);
        let availability = ledger.availability(product).await.unwrap();
        assert!(!availability.in_stock);
        assert!(availability.pharmacies.is_empty());
    }

    #[tokio::test]
    async fn test_available_pharmacies_skip_empty_shelves() {
        let (central, north) = (Uuid::new_v4(), Uuid::new_v4());
        let vitamin_c = Uuid::new_v4();
        let ledger = StockLedger::new(Arc::new(StockRows(vec![
            entry(central, vitamin_c, 0),
            entry(north, vitamin_c, 7),
        ])));

        assert_eq!(ledger.available_pharmacies(vitamin_c).await.unwrap(), vec![north]);
        let level = ledger.check_medication(central, vitamin_c).await.unwrap();
        assert!(!level.available);
    }
}
