use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pharmacy_core::StoreError;
use pharmacy_order::{
    Cart, CartLine, CartRepository, LineItem, Order, OrderError, OrderRepository, OrderStatus, StatusWrite,
};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::database::{db_err, parse_column, to_u32};

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Row types; enums are stored as their snake_case codes
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    owner_id: Uuid,
    order_type: String,
    status: String,
    pharmacy_id: Option<Uuid>,
    subtotal_cents: i64,
    discount_cents: i64,
    delivery_cents: i64,
    total_cents: i64,
    delivery_address: Option<String>,
    payment_method: String,
    comment: Option<String>,
    is_paid: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct LineItemRow {
    id: Uuid,
    order_id: Uuid,
    medication_id: Uuid,
    product_name: String,
    quantity: i64,
    unit_price_cents: i64,
}

impl TryFrom<LineItemRow> for LineItem {
    type Error = StoreError;

    fn try_from(row: LineItemRow) -> Result<Self, Self::Error> {
        Ok(LineItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.medication_id,
            product_name: row.product_name,
            quantity: to_u32(row.quantity, "order_items.quantity")?,
            unit_price_cents: row.unit_price_cents,
        })
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<LineItemRow>) -> Result<Order, StoreError> {
        Ok(Order {
            id: self.id,
            owner_id: self.owner_id,
            order_type: parse_column(&self.order_type, "order_type")?,
            status: parse_column(&self.status, "status")?,
            pharmacy_id: self.pharmacy_id,
            subtotal_cents: self.subtotal_cents,
            discount_cents: self.discount_cents,
            delivery_cents: self.delivery_cents,
            total_cents: self.total_cents,
            delivery_address: self.delivery_address,
            payment_method: parse_column(&self.payment_method, "payment_method")?,
            comment: self.comment,
            is_paid: self.is_paid,
            items: items.into_iter().map(LineItem::try_from).collect::<Result<_, _>>()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, owner_id, order_type, status, pharmacy_id, subtotal_cents, discount_cents, \
    delivery_cents, total_cents, delivery_address, payment_method, comment, is_paid, created_at, updated_at";

async fn insert_order_rows(conn: &mut PgConnection, order: &Order) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, owner_id, order_type, status, pharmacy_id, subtotal_cents, discount_cents,
                            delivery_cents, total_cents, delivery_address, payment_method, comment, is_paid,
                            created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        "#,
    )
    .bind(order.id)
    .bind(order.owner_id)
    .bind(order.order_type.as_str())
    .bind(order.status.as_str())
    .bind(order.pharmacy_id)
    .bind(order.subtotal_cents)
    .bind(order.discount_cents)
    .bind(order.delivery_cents)
    .bind(order.total_cents)
    .bind(&order.delivery_address)
    .bind(order.payment_method.as_str())
    .bind(&order.comment)
    .bind(order.is_paid)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;

    for (position, item) in order.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, position, medication_id, product_name, quantity, unit_price_cents)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id)
        .bind(order.id)
        .bind(position as i32)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(i64::from(item.quantity))
        .bind(item.unit_price_cents)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;
    }
    Ok(())
}

async fn fetch_order(conn: &mut PgConnection, order_id: Uuid) -> Result<Option<Order>, StoreError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, LineItemRow>(
        r#"
        SELECT id, order_id, medication_id, product_name, quantity, unit_price_cents
        FROM order_items
        WHERE order_id = $1
        ORDER BY position
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;

    row.into_order(items).map(Some)
}

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        insert_order_rows(&mut tx, order).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn insert_order_clearing_cart(&self, order: &Order, checked_out: &[(Uuid, u32)]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        insert_order_rows(&mut tx, order).await?;

        // Lines fully consumed go; lines that grew since the read keep the
        // difference. quantity >= 1 is a table constraint.
        for (product_id, quantity) in checked_out {
            sqlx::query("DELETE FROM cart_items WHERE owner_id = $1 AND medication_id = $2 AND quantity <= $3")
                .bind(order.owner_id)
                .bind(product_id)
                .bind(i64::from(*quantity))
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            sqlx::query("UPDATE cart_items SET quantity = quantity - $3 WHERE owner_id = $1 AND medication_id = $2")
                .bind(order.owner_id)
                .bind(product_id)
                .bind(i64::from(*quantity))
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_order(&mut conn, order_id).await
    }

    async fn list_orders(&self, owner_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE owner_id = $1 ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let item_rows = sqlx::query_as::<_, LineItemRow>(
            r#"
            SELECT id, order_id, medication_id, product_name, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut items_by_order: HashMap<Uuid, Vec<LineItemRow>> = HashMap::new();
        for item in item_rows {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }

    async fn write_status(&self, order_id: Uuid, status: OrderStatus) -> Result<StatusWrite, OrderError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Row lock serializes concurrent writers on this order
        let current: Option<(String,)> = sqlx::query_as("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
        let (current,) = current.ok_or(OrderError::NotFound(order_id))?;
        let previous: OrderStatus = parse_column(&current, "status")?;

        previous.check_transition(status)?;
        if previous != status {
            sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(order_id)
                .bind(status.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        let order = fetch_order(&mut tx, order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;
        tx.commit().await.map_err(db_err)?;

        debug!(order_id = %order_id, from = %previous, to = %status, "status written");
        Ok(StatusWrite { previous, order })
    }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    medication_id: Uuid,
    quantity: i64,
    added_at: DateTime<Utc>,
}

async fn fetch_cart(conn: &mut PgConnection, owner_id: Uuid) -> Result<Cart, StoreError> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        "SELECT medication_id, quantity, added_at FROM cart_items WHERE owner_id = $1 ORDER BY added_at, medication_id",
    )
    .bind(owner_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;

    let lines = rows
        .into_iter()
        .map(|row| {
            Ok(CartLine {
                product_id: row.medication_id,
                quantity: to_u32(row.quantity, "cart_items.quantity")?,
                added_at: row.added_at,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    Ok(Cart { owner_id, lines })
}

/// Additive upsert; concurrent merges on the same line both land.
async fn merge_line(conn: &mut PgConnection, owner_id: Uuid, product_id: Uuid, quantity: u32) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO cart_items (owner_id, medication_id, quantity, added_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (owner_id, medication_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        "#,
    )
    .bind(owner_id)
    .bind(product_id)
    .bind(i64::from(quantity))
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;
    Ok(())
}

#[async_trait]
impl CartRepository for StoreOrderRepository {
    async fn cart(&self, owner_id: Uuid) -> Result<Cart, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_cart(&mut conn, owner_id).await
    }

    async fn merge_item(&self, owner_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        merge_line(&mut tx, owner_id, product_id, quantity).await?;
        let cart = fetch_cart(&mut tx, owner_id).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(cart)
    }

    async fn merge_items(&self, owner_id: Uuid, items: &[(Uuid, u32)]) -> Result<Cart, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for (product_id, quantity) in items {
            merge_line(&mut tx, owner_id, *product_id, *quantity).await?;
        }
        let cart = fetch_cart(&mut tx, owner_id).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(cart)
    }

    async fn remove_item(&self, owner_id: Uuid, product_id: Uuid) -> Result<Cart, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query("DELETE FROM cart_items WHERE owner_id = $1 AND medication_id = $2")
            .bind(owner_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let cart = fetch_cart(&mut tx, owner_id).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(cart)
    }

    async fn clear(&self, owner_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM cart_items WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
