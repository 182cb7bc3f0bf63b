pub mod product;
pub mod pricing;
pub mod inventory;

pub use product::{Catalog, CatalogError, CatalogRepository, Medication, MedicationCategory, Pharmacy};
pub use pricing::{DeliveryTariff, PriceBreakdown, Priced, PricingEngine};
pub use inventory::{MedicationAvailability, PharmacyStockLevel, StockLedger};
