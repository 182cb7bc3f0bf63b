use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pharmacy_core::{Account, AccountDirectory, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{db_err, parse_column};

pub struct StoreAccountRepository {
    pool: PgPool,
}

impl StoreAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct AccountRow {
    id: Uuid,
    username: String,
    email: String,
    phone: Option<String>,
    tier: String,
    bonus_points: i64,
    email_notifications: bool,
    sms_notifications: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: row.id,
            username: row.username,
            email: row.email,
            phone: row.phone,
            tier: parse_column(&row.tier, "tier")?,
            bonus_points: row.bonus_points,
            email_notifications: row.email_notifications,
            sms_notifications: row.sms_notifications,
            created_at: row.created_at,
        })
    }
}

pub(crate) const ACCOUNT_COLUMNS: &str = "id, username, email, phone, tier, bonus_points, \
    email_notifications, sms_notifications, created_at";

#[async_trait]
impl AccountDirectory for StoreAccountRepository {
    async fn account(&self, owner_id: Uuid) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS))
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(Account::try_from).transpose()
    }

    async fn add_bonus_points(&self, owner_id: Uuid, points: i64) -> Result<i64, StoreError> {
        let balance: Option<(i64,)> = sqlx::query_as(
            "UPDATE accounts SET bonus_points = bonus_points + $2 WHERE id = $1 RETURNING bonus_points",
        )
        .bind(owner_id)
        .bind(points)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        balance
            .map(|(points,)| points)
            .ok_or_else(|| StoreError::Backend(format!("no account {}", owner_id)))
    }
}
