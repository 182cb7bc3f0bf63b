use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pharmacy_core::StoreError;
use pharmacy_order::{
    Delivery, DeliveryRepository, OrderError, OrderTotals, Payment, PaymentRepository, PaymentSettlement,
    PaymentStatus,
};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{db_err, parse_column};

/// Payments and deliveries; both hang off an order one-to-one.
pub struct StorePaymentRepository {
    pool: PgPool,
}

impl StorePaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    order_id: Uuid,
    amount_cents: i64,
    method: String,
    status: String,
    transaction_id: Option<String>,
    details: Value,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            order_id: row.order_id,
            amount_cents: row.amount_cents,
            method: parse_column(&row.method, "payments.method")?,
            status: parse_column(&row.status, "payments.status")?,
            transaction_id: row.transaction_id,
            details: row.details,
            created_at: row.created_at,
            paid_at: row.paid_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DeliveryRow {
    id: Uuid,
    order_id: Uuid,
    method: String,
    status: String,
    cost_cents: i64,
    estimated_time: Option<String>,
    details: Value,
    created_at: DateTime<Utc>,
    delivered_at: Option<DateTime<Utc>>,
}

impl TryFrom<DeliveryRow> for Delivery {
    type Error = StoreError;

    fn try_from(row: DeliveryRow) -> Result<Self, Self::Error> {
        Ok(Delivery {
            id: row.id,
            order_id: row.order_id,
            method: parse_column(&row.method, "deliveries.method")?,
            status: parse_column(&row.status, "deliveries.status")?,
            cost_cents: row.cost_cents,
            estimated_time: row.estimated_time,
            details: row.details,
            created_at: row.created_at,
            delivered_at: row.delivered_at,
        })
    }
}

const PAYMENT_COLUMNS: &str =
    "id, order_id, amount_cents, method, status, transaction_id, details, created_at, paid_at";

const DELIVERY_COLUMNS: &str =
    "id, order_id, method, status, cost_cents, estimated_time, details, created_at, delivered_at";

impl StorePaymentRepository {
    async fn payment_where(&self, column: &str, id: Uuid) -> Result<Option<Payment>, StoreError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE {} = $1",
            PAYMENT_COLUMNS, column
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Payment::try_from).transpose()
    }

    async fn delivery_where(&self, column: &str, id: Uuid) -> Result<Option<Delivery>, StoreError> {
        let row = sqlx::query_as::<_, DeliveryRow>(&format!(
            "SELECT {} FROM deliveries WHERE {} = $1",
            DELIVERY_COLUMNS, column
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Delivery::try_from).transpose()
    }
}

#[async_trait]
impl PaymentRepository for StorePaymentRepository {
    async fn insert_payment(&self, payment: &Payment) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, amount_cents, method, status, transaction_id, details, created_at, paid_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(payment.id)
        .bind(payment.order_id)
        .bind(payment.amount_cents)
        .bind(payment.method.as_str())
        .bind(payment.status.as_str())
        .bind(&payment.transaction_id)
        .bind(&payment.details)
        .bind(payment.created_at)
        .bind(payment.paid_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, StoreError> {
        self.payment_where("id", payment_id).await
    }

    async fn payment_for_order(&self, order_id: Uuid) -> Result<Option<Payment>, StoreError> {
        self.payment_where("order_id", order_id).await
    }

    async fn mark_processing(&self, payment_id: Uuid) -> Result<Payment, OrderError> {
        let claimed = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            UPDATE payments SET status = 'processing'
            WHERE id = $1 AND status NOT IN ('completed', 'processing')
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        if let Some(row) = claimed {
            return Ok(Payment::try_from(row)?);
        }

        // Nothing claimed: report why
        match self.get_payment(payment_id).await? {
            None => Err(OrderError::PaymentNotFound(payment_id)),
            Some(p) if p.status == PaymentStatus::Completed => {
                Err(OrderError::Validation("Payment has already been completed".into()))
            }
            Some(_) => Err(OrderError::Validation("Payment is already being processed".into())),
        }
    }

    async fn settle_payment(&self, settlement: &PaymentSettlement) -> Result<Payment, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            UPDATE payments SET status = $2, transaction_id = $3, details = $4, paid_at = $5
            WHERE id = $1
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(settlement.payment_id)
        .bind(settlement.status.as_str())
        .bind(&settlement.transaction_id)
        .bind(&settlement.details)
        .bind(settlement.paid_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| StoreError::Backend(format!("no payment {}", settlement.payment_id)))?;

        if settlement.status == PaymentStatus::Completed {
            sqlx::query("UPDATE orders SET is_paid = TRUE, updated_at = NOW() WHERE id = $1")
                .bind(settlement.order_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Payment::try_from(row)
    }
}

#[async_trait]
impl DeliveryRepository for StorePaymentRepository {
    async fn insert_delivery(&self, delivery: &Delivery) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO deliveries (id, order_id, method, status, cost_cents, estimated_time, details, created_at, delivered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(delivery.id)
        .bind(delivery.order_id)
        .bind(delivery.method.as_str())
        .bind(delivery.status.as_str())
        .bind(delivery.cost_cents)
        .bind(&delivery.estimated_time)
        .bind(&delivery.details)
        .bind(delivery.created_at)
        .bind(delivery.delivered_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_delivery(&self, delivery_id: Uuid) -> Result<Option<Delivery>, StoreError> {
        self.delivery_where("id", delivery_id).await
    }

    async fn delivery_for_order(&self, order_id: Uuid) -> Result<Option<Delivery>, StoreError> {
        self.delivery_where("order_id", order_id).await
    }

    async fn apply_delivery(&self, delivery: &Delivery, totals: &OrderTotals) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r#"
            UPDATE deliveries SET status = $2, cost_cents = $3, estimated_time = $4, details = $5
            WHERE id = $1
            "#,
        )
        .bind(delivery.id)
        .bind(delivery.status.as_str())
        .bind(delivery.cost_cents)
        .bind(&delivery.estimated_time)
        .bind(&delivery.details)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let b = &totals.breakdown;
        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET subtotal_cents = $2, discount_cents = $3, delivery_cents = $4, total_cents = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(totals.order_id)
        .bind(b.subtotal_cents)
        .bind(b.discount_cents)
        .bind(b.delivery_cents)
        .bind(b.total_cents)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::Backend(format!("no order {}", totals.order_id)));
        }
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }
}
