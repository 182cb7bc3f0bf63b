use chrono::{DateTime, Utc};
use pharmacy_catalog::{PriceBreakdown, Priced, PricingEngine};
use pharmacy_shared::Cents;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::OrderError;
use crate::payment::PaymentMethod;

/// Order status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    InDelivery,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::InDelivery => "in_delivery",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Terminal orders accept no further status writes, not even a repeat
    /// of the current status.
    pub fn check_transition(self, to: OrderStatus) -> Result<(), OrderError> {
        if self.is_terminal() {
            tracing::debug!(from = %self, to = %to, "rejected write on terminal order");
            return Err(OrderError::TerminalState(self));
        }
        Ok(())
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending" => OrderStatus::Pending,
            "confirmed" => OrderStatus::Confirmed,
            "preparing" => OrderStatus::Preparing,
            "ready" => OrderStatus::Ready,
            "in_delivery" => OrderStatus::InDelivery,
            "completed" => OrderStatus::Completed,
            "cancelled" => OrderStatus::Cancelled,
            other => return Err(OrderError::Validation(format!("Unknown order status: {}", other))),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Delivery,
    Pickup,
}

impl OrderType {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderType::Delivery => "delivery",
            OrderType::Pickup => "pickup",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivery" => Ok(OrderType::Delivery),
            "pickup" => Ok(OrderType::Pickup),
            other => Err(OrderError::Validation(format!("Unknown order type: {}", other))),
        }
    }
}

/// A customer's purchase. Totals always satisfy
/// `total = subtotal - discount + delivery`; call [`Order::recompute`] after
/// touching the items or the delivery cost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub pharmacy_id: Option<Uuid>,
    pub subtotal_cents: Cents,
    pub discount_cents: Cents,
    pub delivery_cents: Cents,
    pub total_cents: Cents,
    pub delivery_address: Option<String>,
    pub payment_method: PaymentMethod,
    pub comment: Option<String>,
    pub is_paid: bool,
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Bare order with no items. Use [`crate::OrderFactory`] rather than
    /// calling this directly; it enforces the per-type preconditions.
    pub(crate) fn draft(
        owner_id: Uuid,
        order_type: OrderType,
        pharmacy_id: Option<Uuid>,
        delivery_cents: Cents,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            order_type,
            status: OrderStatus::Pending,
            pharmacy_id,
            subtotal_cents: 0,
            discount_cents: 0,
            delivery_cents,
            total_cents: delivery_cents,
            delivery_address: None,
            payment_method: PaymentMethod::default(),
            comment: None,
            is_paid: false,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_item(&mut self, product_id: Uuid, product_name: String, quantity: u32, unit_price_cents: Cents) {
        self.items.push(LineItem {
            id: Uuid::new_v4(),
            order_id: self.id,
            product_id,
            product_name,
            quantity,
            unit_price_cents,
        });
        self.updated_at = Utc::now();
    }

    /// Re-price from the line item snapshots and the current delivery cost.
    pub fn recompute(&mut self, discount_percent: u32) -> PriceBreakdown {
        let breakdown = PricingEngine::compute(&self.items, discount_percent, self.delivery_cents);
        self.apply_breakdown(&breakdown);
        breakdown
    }

    pub fn apply_breakdown(&mut self, breakdown: &PriceBreakdown) {
        self.subtotal_cents = breakdown.subtotal_cents;
        self.discount_cents = breakdown.discount_cents;
        self.delivery_cents = breakdown.delivery_cents;
        self.total_cents = breakdown.total_cents;
        self.updated_at = Utc::now();
    }

    pub fn breakdown(&self) -> PriceBreakdown {
        PriceBreakdown {
            subtotal_cents: self.subtotal_cents,
            discount_cents: self.discount_cents,
            delivery_cents: self.delivery_cents,
            total_cents: self.total_cents,
        }
    }

    pub fn items_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// One product within an order. The price is frozen when the line is
/// created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: Cents,
}

impl Priced for LineItem {
    fn unit_price_cents(&self) -> Cents {
        self.unit_price_cents
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmacy_shared::money::cents;

    #[test]
    fn test_recompute_keeps_total_invariant() {
        let mut order = Order::draft(Uuid::new_v4(), OrderType::Delivery, None, cents(50, 0));
        order.add_item(Uuid::new_v4(), "Aspirin".into(), 2, cents(45, 50));
        order.add_item(Uuid::new_v4(), "Vitamin C".into(), 1, cents(85, 0));

        order.recompute(5);
        assert_eq!(order.subtotal_cents, 17600);
        assert_eq!(order.discount_cents, 880);
        assert_eq!(order.total_cents, 17600 - 880 + 5000);

        order.delivery_cents = 0;
        order.recompute(5);
        assert_eq!(order.total_cents, order.subtotal_cents - order.discount_cents);
        assert_eq!(order.items_count(), 3);
    }

    #[test]
    fn test_terminal_statuses_reject_writes() {
        for terminal in [OrderStatus::Completed, OrderStatus::Cancelled] {
            for to in [OrderStatus::Pending, OrderStatus::Cancelled, terminal] {
                assert!(matches!(
                    terminal.check_transition(to),
                    Err(OrderError::TerminalState(s)) if s == terminal
                ));
            }
        }
        assert!(OrderStatus::Ready.check_transition(OrderStatus::Cancelled).is_ok());
        assert!(OrderStatus::Pending.check_transition(OrderStatus::Pending).is_ok());
    }

    #[test]
    fn test_status_codes_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::InDelivery,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
