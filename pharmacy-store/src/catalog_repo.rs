use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pharmacy_catalog::{CatalogRepository, Medication, Pharmacy};
use pharmacy_core::{InventorySource, StockEntry, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{db_err, parse_column};

pub struct StoreCatalogRepository {
    pool: PgPool,
}

impl StoreCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MedicationRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    manufacturer: String,
    category: String,
    price_cents: i64,
    is_prescription: bool,
    active_ingredient: Option<String>,
    dosage: Option<String>,
    is_available: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<MedicationRow> for Medication {
    type Error = StoreError;

    fn try_from(row: MedicationRow) -> Result<Self, Self::Error> {
        Ok(Medication {
            id: row.id,
            name: row.name,
            description: row.description,
            manufacturer: row.manufacturer,
            category: parse_column(&row.category, "category")?,
            price_cents: row.price_cents,
            is_prescription: row.is_prescription,
            active_ingredient: row.active_ingredient,
            dosage: row.dosage,
            is_available: row.is_available,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PharmacyRow {
    id: Uuid,
    name: String,
    address: String,
    city: String,
    phone: String,
    working_hours: String,
    is_active: bool,
}

impl From<PharmacyRow> for Pharmacy {
    fn from(row: PharmacyRow) -> Self {
        Pharmacy {
            id: row.id,
            name: row.name,
            address: row.address,
            city: row.city,
            phone: row.phone,
            working_hours: row.working_hours,
            is_active: row.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StockRow {
    pharmacy_id: Uuid,
    medication_id: Uuid,
    quantity: i64,
    last_updated: DateTime<Utc>,
}

impl From<StockRow> for StockEntry {
    fn from(row: StockRow) -> Self {
        StockEntry {
            pharmacy_id: row.pharmacy_id,
            product_id: row.medication_id,
            quantity: row.quantity,
            last_updated: row.last_updated,
        }
    }
}

const MEDICATION_COLUMNS: &str = "id, name, description, manufacturer, category, price_cents, \
    is_prescription, active_ingredient, dosage, is_available, created_at";

#[async_trait]
impl CatalogRepository for StoreCatalogRepository {
    async fn medication(&self, id: Uuid) -> Result<Option<Medication>, StoreError> {
        let row = sqlx::query_as::<_, MedicationRow>(&format!(
            "SELECT {} FROM medications WHERE id = $1",
            MEDICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Medication::try_from).transpose()
    }

    async fn pharmacy(&self, id: Uuid) -> Result<Option<Pharmacy>, StoreError> {
        let row = sqlx::query_as::<_, PharmacyRow>(
            "SELECT id, name, address, city, phone, working_hours, is_active FROM pharmacies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(Pharmacy::from))
    }

    async fn pharmacies(&self) -> Result<Vec<Pharmacy>, StoreError> {
        let rows = sqlx::query_as::<_, PharmacyRow>(
            "SELECT id, name, address, city, phone, working_hours, is_active FROM pharmacies ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Pharmacy::from).collect())
    }
}

#[async_trait]
impl InventorySource for StoreCatalogRepository {
    async fn stock_entry(&self, product_id: Uuid, pharmacy_id: Uuid) -> Result<Option<StockEntry>, StoreError> {
        let row = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT pharmacy_id, medication_id, quantity, last_updated
            FROM stock
            WHERE medication_id = $1 AND pharmacy_id = $2
            "#,
        )
        .bind(product_id)
        .bind(pharmacy_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(StockEntry::from))
    }

    async fn stock_entries(&self, product_id: Uuid) -> Result<Vec<StockEntry>, StoreError> {
        let rows = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT pharmacy_id, medication_id, quantity, last_updated
            FROM stock
            WHERE medication_id = $1
            ORDER BY pharmacy_id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(StockEntry::from).collect())
    }
}
