use chrono::{DateTime, Utc};
use pharmacy_core::{AccountDirectory, CardTier};
use pharmacy_order::{BonusAward, Order, OrderBuilder, OrderError, OrderStatus, OrderType, PaymentMethod};
use pharmacy_shared::Cents;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildOrderRequest {
    pub order_type: Option<OrderType>,
    pub pharmacy_id: Option<Uuid>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    pub delivery_address: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub total_cents: Cents,
    pub items_count: u32,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_type: order.order_type,
            status: order.status,
            total_cents: order.total_cents,
            items_count: order.items_count(),
            is_paid: order.is_paid,
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BonusInfo {
    pub bonus_points: i64,
    pub tier: CardTier,
    pub discount_percent: u32,
    pub orders_count: usize,
    /// Sum over completed orders only.
    pub total_spent_cents: Cents,
}

// ============================================================================
// Operations
// ============================================================================

pub async fn build_order(state: &AppState, owner_id: Uuid, req: BuildOrderRequest) -> Result<Order, ServiceError> {
    let mut builder = OrderBuilder::new(owner_id);
    if let Some(order_type) = req.order_type {
        builder = builder.order_type(order_type);
    }
    if let Some(pharmacy_id) = req.pharmacy_id {
        builder = builder.pharmacy(pharmacy_id);
    }
    for item in &req.items {
        builder = builder.add_medication(item.product_id, item.quantity);
    }
    if let Some(address) = req.delivery_address {
        builder = builder.delivery_address(address);
    }
    if let Some(method) = req.payment_method {
        builder = builder.payment_method(method);
    }
    if let Some(comment) = req.comment {
        builder = builder.comment(comment);
    }

    Ok(builder.build(&state.build).await?)
}

/// Staff-side status change. Any status may follow a non-terminal one.
pub async fn transition_status(state: &AppState, order_id: Uuid, status: OrderStatus) -> Result<Order, ServiceError> {
    Ok(state.lifecycle.transition_status(order_id, status).await?)
}

/// Customer-side cancellation of their own order.
pub async fn cancel_order(state: &AppState, owner_id: Uuid, order_id: Uuid) -> Result<Order, ServiceError> {
    owned_order(state, owner_id, order_id).await?;
    let order = state.lifecycle.cancel(order_id).await?;
    info!(order_id = %order_id, owner_id = %owner_id, "order cancelled by customer");
    Ok(order)
}

/// Newest first.
pub async fn my_orders(state: &AppState, owner_id: Uuid) -> Result<Vec<OrderSummary>, ServiceError> {
    let orders = state.repos.orders.list_orders(owner_id).await?;
    Ok(orders.iter().map(OrderSummary::from).collect())
}

pub async fn get_order(state: &AppState, owner_id: Uuid, order_id: Uuid) -> Result<Order, ServiceError> {
    owned_order(state, owner_id, order_id).await
}

/// Staff-side bonus credit for a completed order.
pub async fn award_bonus(state: &AppState, order_id: Uuid) -> Result<BonusAward, ServiceError> {
    Ok(state.lifecycle.award_bonus(order_id).await?)
}

pub async fn bonus_info(state: &AppState, owner_id: Uuid) -> Result<BonusInfo, ServiceError> {
    let account = state.repos.accounts.require_account(owner_id).await?;
    let orders = state.repos.orders.list_orders(owner_id).await?;

    Ok(BonusInfo {
        bonus_points: account.bonus_points,
        tier: account.tier,
        discount_percent: account.tier.discount_percent(),
        orders_count: orders.len(),
        total_spent_cents: orders
            .iter()
            .filter(|order| order.status == OrderStatus::Completed)
            .map(|order| order.total_cents)
            .sum(),
    })
}

/// Someone else's order reads as missing.
async fn owned_order(state: &AppState, owner_id: Uuid, order_id: Uuid) -> Result<Order, ServiceError> {
    let order = state
        .repos
        .orders
        .get_order(order_id)
        .await?
        .filter(|order| order.owner_id == owner_id)
        .ok_or(OrderError::NotFound(order_id))?;
    Ok(order)
}
