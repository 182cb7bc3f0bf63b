use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pharmacy_core::StoreError;
use pharmacy_notify::{Notification, NotificationRepository};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{db_err, parse_column};

pub struct StoreNotificationRepository {
    pool: PgPool,
}

impl StoreNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    owner_id: Uuid,
    kind: String,
    channel: String,
    message: String,
    is_sent: bool,
    is_read: bool,
    created_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            owner_id: row.owner_id,
            kind: parse_column(&row.kind, "notifications.kind")?,
            channel: parse_column(&row.channel, "notifications.channel")?,
            message: row.message,
            is_sent: row.is_sent,
            is_read: row.is_read,
            created_at: row.created_at,
            sent_at: row.sent_at,
        })
    }
}

#[async_trait]
impl NotificationRepository for StoreNotificationRepository {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, owner_id, kind, channel, message, is_sent, is_read, created_at, sent_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(notification.id)
        .bind(notification.owner_id)
        .bind(notification.kind.as_str())
        .bind(notification.channel.as_str())
        .bind(&notification.message)
        .bind(notification.is_sent)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .bind(notification.sent_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn recent_notifications(&self, owner_id: Uuid, limit: usize) -> Result<Vec<Notification>, StoreError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, owner_id, kind, channel, message, is_sent, is_read, created_at, sent_at
            FROM notifications
            WHERE owner_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn unread_count(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE owner_id = $1 AND is_read = FALSE")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(count.max(0) as u64)
    }

    async fn mark_read(&self, owner_id: Uuid, ids: Option<&[Uuid]>) -> Result<u64, StoreError> {
        let result = match ids {
            Some(ids) => {
                sqlx::query(
                    "UPDATE notifications SET is_read = TRUE WHERE owner_id = $1 AND is_read = FALSE AND id = ANY($2)",
                )
                .bind(owner_id)
                .bind(ids)
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query("UPDATE notifications SET is_read = TRUE WHERE owner_id = $1 AND is_read = FALSE")
                    .bind(owner_id)
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(db_err)?;

        Ok(result.rows_affected())
    }
}
