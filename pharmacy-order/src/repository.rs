use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pharmacy_catalog::PriceBreakdown;
use pharmacy_core::StoreError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::Cart;
use crate::delivery::Delivery;
use crate::error::OrderError;
use crate::models::{Order, OrderStatus};
use crate::payment::{Payment, PaymentStatus};

/// Outcome of a status write: the stored status read under the same lock
/// (or row lock) as the write, and the order after it.
#[derive(Debug, Clone)]
pub struct StatusWrite {
    pub previous: OrderStatus,
    pub order: Order,
}

impl StatusWrite {
    pub fn changed(&self) -> bool {
        self.previous != self.order.status
    }
}

/// New price columns for one order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderTotals {
    pub order_id: Uuid,
    pub breakdown: PriceBreakdown,
}

/// Final state of a processed payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSettlement {
    pub payment_id: Uuid,
    pub order_id: Uuid,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub details: serde_json::Value,
    pub paid_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist an order with its line items in one transaction.
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError>;

    /// Same as `insert_order`, and take the checked-out `(product, quantity)`
    /// lines out of the owner's cart in the same transaction. Only those
    /// quantities are subtracted; lines left at zero are dropped and anything
    /// added since the cart was read stays.
    async fn insert_order_clearing_cart(&self, order: &Order, checked_out: &[(Uuid, u32)]) -> Result<(), StoreError>;

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Newest first
    async fn list_orders(&self, owner_id: Uuid) -> Result<Vec<Order>, StoreError>;

    /// Read the current status and write `status` atomically.
    ///
    /// Fails with `TerminalState` when the stored order is completed or
    /// cancelled and with `NotFound` when there is no such order.
    async fn write_status(&self, order_id: Uuid, status: OrderStatus) -> Result<StatusWrite, OrderError>;
}

/// One cart per owner. Merges add to the stored quantity atomically per
/// (owner, product).
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Empty cart when the owner has none yet.
    async fn cart(&self, owner_id: Uuid) -> Result<Cart, StoreError>;

    async fn merge_item(&self, owner_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart, StoreError>;

    /// Merge several lines in one transaction.
    async fn merge_items(&self, owner_id: Uuid, items: &[(Uuid, u32)]) -> Result<Cart, StoreError>;

    async fn remove_item(&self, owner_id: Uuid, product_id: Uuid) -> Result<Cart, StoreError>;

    async fn clear(&self, owner_id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// `Conflict` when the order already has a payment.
    async fn insert_payment(&self, payment: &Payment) -> Result<(), StoreError>;

    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, StoreError>;

    async fn payment_for_order(&self, order_id: Uuid) -> Result<Option<Payment>, StoreError>;

    /// Claim the payment for processing.
    ///
    /// Fails with a validation error when it is already completed or being
    /// processed, so two concurrent attempts cannot both charge.
    async fn mark_processing(&self, payment_id: Uuid) -> Result<Payment, OrderError>;

    /// Write the final payment state and, on success, flag the order as paid,
    /// in one transaction.
    async fn settle_payment(&self, settlement: &PaymentSettlement) -> Result<Payment, StoreError>;
}

#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    /// `Conflict` when the order already has a delivery.
    async fn insert_delivery(&self, delivery: &Delivery) -> Result<(), StoreError>;

    async fn get_delivery(&self, delivery_id: Uuid) -> Result<Option<Delivery>, StoreError>;

    async fn delivery_for_order(&self, order_id: Uuid) -> Result<Option<Delivery>, StoreError>;

    /// Store the organised delivery and the order's new price columns in one
    /// transaction. Status and the other order columns are left alone.
    async fn apply_delivery(&self, delivery: &Delivery, totals: &OrderTotals) -> Result<(), StoreError>;
}
