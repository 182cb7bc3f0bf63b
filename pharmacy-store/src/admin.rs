use async_trait::async_trait;
use pharmacy_catalog::{Medication, Pharmacy};
use pharmacy_core::{Account, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::account_repo::{AccountRow, ACCOUNT_COLUMNS};
use crate::database::db_err;

/// Back-office writes used for seeding. The ordering pipeline never calls
/// these.
#[async_trait]
pub trait StoreAdmin: Send + Sync {
    async fn account_count(&self) -> Result<u64, StoreError>;

    async fn account_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    async fn insert_medication(&self, medication: &Medication) -> Result<(), StoreError>;

    async fn insert_pharmacy(&self, pharmacy: &Pharmacy) -> Result<(), StoreError>;

    /// Insert or overwrite the (pharmacy, product) row.
    async fn set_stock(&self, pharmacy_id: Uuid, product_id: Uuid, quantity: i64) -> Result<(), StoreError>;
}

pub struct StoreAdminRepository {
    pool: PgPool,
}

impl StoreAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreAdmin for StoreAdminRepository {
    async fn account_count(&self) -> Result<u64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count.max(0) as u64)
    }

    async fn account_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE username = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Account::try_from).transpose()
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, email, phone, tier, bonus_points, email_notifications, sms_notifications, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(account.tier.as_str())
        .bind(account.bonus_points)
        .bind(account.email_notifications)
        .bind(account.sms_notifications)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn insert_medication(&self, medication: &Medication) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO medications (id, name, description, manufacturer, category, price_cents, is_prescription, active_ingredient, dosage, is_available, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(medication.id)
        .bind(&medication.name)
        .bind(&medication.description)
        .bind(&medication.manufacturer)
        .bind(medication.category.as_str())
        .bind(medication.price_cents)
        .bind(medication.is_prescription)
        .bind(&medication.active_ingredient)
        .bind(&medication.dosage)
        .bind(medication.is_available)
        .bind(medication.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn insert_pharmacy(&self, pharmacy: &Pharmacy) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO pharmacies (id, name, address, city, phone, working_hours, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(pharmacy.id)
        .bind(&pharmacy.name)
        .bind(&pharmacy.address)
        .bind(&pharmacy.city)
        .bind(&pharmacy.phone)
        .bind(&pharmacy.working_hours)
        .bind(pharmacy.is_active)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn set_stock(&self, pharmacy_id: Uuid, product_id: Uuid, quantity: i64) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO stock (pharmacy_id, medication_id, quantity, last_updated)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (pharmacy_id, medication_id)
            DO UPDATE SET quantity = EXCLUDED.quantity, last_updated = NOW()
            "#,
        )
        .bind(pharmacy_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}
