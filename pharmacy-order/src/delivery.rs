use chrono::{DateTime, Utc};
use pharmacy_catalog::{DeliveryTariff, Pharmacy};
use pharmacy_core::{AccountDirectory, CardTier, StoreError};
use pharmacy_shared::money::percent_of;
use pharmacy_shared::Cents;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::OrderError;
use crate::repository::{DeliveryRepository, OrderRepository, OrderTotals};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Courier,
    Express,
    Pickup,
}

impl DeliveryMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryMethod::Courier => "courier",
            DeliveryMethod::Express => "express",
            DeliveryMethod::Pickup => "pickup",
        }
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "courier" => Ok(DeliveryMethod::Courier),
            "express" => Ok(DeliveryMethod::Express),
            "pickup" => Ok(DeliveryMethod::Pickup),
            other => Err(OrderError::Validation(format!("Unknown delivery method: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Preparing,
    OnWay,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Preparing => "preparing",
            DeliveryStatus::OnWay => "on_way",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending" => DeliveryStatus::Pending,
            "preparing" => DeliveryStatus::Preparing,
            "on_way" => DeliveryStatus::OnWay,
            "delivered" => DeliveryStatus::Delivered,
            "cancelled" => DeliveryStatus::Cancelled,
            other => return Err(StoreError::Corrupt(format!("delivery status {}", other))),
        })
    }
}

/// Delivery record, one per order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Delivery {
    pub id: Uuid,
    pub order_id: Uuid,
    pub method: DeliveryMethod,
    pub status: DeliveryStatus,
    pub cost_cents: Cents,
    pub estimated_time: Option<String>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Delivery {
    pub fn pending(order_id: Uuid, method: DeliveryMethod) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            method,
            status: DeliveryStatus::Pending,
            cost_cents: 0,
            estimated_time: None,
            details: serde_json::Value::Null,
            created_at: Utc::now(),
            delivered_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryResult {
    pub method: DeliveryMethod,
    pub cost_cents: Cents,
    pub estimated_time: String,
    pub details: serde_json::Value,
}

/// How an order reaches the customer.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryStrategy {
    Courier {
        address: String,
        delivery_time: Option<String>,
    },
    Express {
        address: String,
    },
    SelfPickup {
        pharmacy: Pharmacy,
    },
}

impl DeliveryStrategy {
    pub fn method(&self) -> DeliveryMethod {
        match self {
            DeliveryStrategy::Courier { .. } => DeliveryMethod::Courier,
            DeliveryStrategy::Express { .. } => DeliveryMethod::Express,
            DeliveryStrategy::SelfPickup { .. } => DeliveryMethod::Pickup,
        }
    }

    /// Premium card holders get free courier delivery. Other courier orders
    /// above the large-order threshold pay the reduced share.
    pub fn calculate_cost(&self, tier: CardTier, subtotal: Cents, tariff: &DeliveryTariff) -> Cents {
        match self {
            DeliveryStrategy::Courier { .. } => {
                if tier == CardTier::Premium {
                    0
                } else if subtotal > tariff.large_order_threshold_cents {
                    percent_of(tariff.courier_base_cents, tariff.large_order_courier_percent)
                } else {
                    tariff.courier_base_cents
                }
            }
            DeliveryStrategy::Express { .. } => {
                if tier == CardTier::Premium {
                    tariff.express_base_cents
                        - percent_of(tariff.express_base_cents, tariff.express_premium_discount_percent)
                } else {
                    tariff.express_base_cents
                }
            }
            DeliveryStrategy::SelfPickup { .. } => 0,
        }
    }

    pub fn estimated_time(&self) -> String {
        match self {
            DeliveryStrategy::Courier { delivery_time, .. } => {
                delivery_time.clone().unwrap_or_else(|| "2-3 hours".to_string())
            }
            DeliveryStrategy::Express { .. } => "60 minutes".to_string(),
            DeliveryStrategy::SelfPickup { .. } => "30 minutes".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), OrderError> {
        match self {
            DeliveryStrategy::Courier { address, .. } | DeliveryStrategy::Express { address } => {
                if address.trim().is_empty() {
                    return Err(OrderError::Validation("Delivery address is required".into()));
                }
                Ok(())
            }
            DeliveryStrategy::SelfPickup { pharmacy } => {
                if !pharmacy.is_active {
                    return Err(OrderError::Validation(format!("Pharmacy {} is closed", pharmacy.name)));
                }
                Ok(())
            }
        }
    }

    pub fn deliver(&self, tier: CardTier, subtotal: Cents, tariff: &DeliveryTariff) -> DeliveryResult {
        let cost_cents = self.calculate_cost(tier, subtotal, tariff);
        let estimated_time = self.estimated_time();
        let details = match self {
            DeliveryStrategy::Courier { address, .. } => json!({
                "address": address,
                "courier_assigned": true,
            }),
            DeliveryStrategy::Express { address } => json!({
                "address": address,
                "priority": "high",
            }),
            DeliveryStrategy::SelfPickup { pharmacy } => json!({
                "pharmacy": pharmacy.name,
                "address": pharmacy.address,
                "ready_for_pickup": false,
            }),
        };

        DeliveryResult {
            method: self.method(),
            cost_cents,
            estimated_time,
            details,
        }
    }
}

/// Opens deliveries and prices them into their orders.
#[derive(Clone)]
pub struct DeliveryCoordinator {
    deliveries: Arc<dyn DeliveryRepository>,
    orders: Arc<dyn OrderRepository>,
    accounts: Arc<dyn AccountDirectory>,
    tariff: DeliveryTariff,
}

impl DeliveryCoordinator {
    pub fn new(
        deliveries: Arc<dyn DeliveryRepository>,
        orders: Arc<dyn OrderRepository>,
        accounts: Arc<dyn AccountDirectory>,
        tariff: DeliveryTariff,
    ) -> Self {
        Self { deliveries, orders, accounts, tariff }
    }

    pub async fn open_delivery(&self, order_id: Uuid, method: DeliveryMethod) -> Result<Delivery, OrderError> {
        let order = self.orders.get_order(order_id).await?.ok_or(OrderError::NotFound(order_id))?;
        if order.status.is_terminal() {
            return Err(OrderError::TerminalState(order.status));
        }
        if self.deliveries.delivery_for_order(order_id).await?.is_some() {
            return Err(OrderError::Validation("Order already has a delivery".into()));
        }

        let delivery = Delivery::pending(order_id, method);
        self.deliveries.insert_delivery(&delivery).await?;
        info!(delivery_id = %delivery.id, order_id = %order_id, method = %method, "delivery opened");
        Ok(delivery)
    }

    pub async fn get_delivery(&self, delivery_id: Uuid) -> Result<Delivery, OrderError> {
        self.deliveries
            .get_delivery(delivery_id)
            .await?
            .ok_or(OrderError::DeliveryNotFound(delivery_id))
    }

    /// Price the delivery with `strategy` and carry the cost into the order
    /// totals; both rows are written together.
    pub async fn organize_delivery(
        &self,
        delivery_id: Uuid,
        strategy: &DeliveryStrategy,
    ) -> Result<DeliveryResult, OrderError> {
        let mut delivery = self.get_delivery(delivery_id).await?;
        if strategy.method() != delivery.method {
            return Err(OrderError::Validation(format!(
                "Delivery expects {} but {} was given",
                delivery.method,
                strategy.method()
            )));
        }
        strategy.validate()?;

        let mut order = self
            .orders
            .get_order(delivery.order_id)
            .await?
            .ok_or(OrderError::NotFound(delivery.order_id))?;
        if order.status.is_terminal() {
            return Err(OrderError::TerminalState(order.status));
        }

        let account = self.accounts.require_account(order.owner_id).await?;
        let result = strategy.deliver(account.tier, order.subtotal_cents, &self.tariff);

        delivery.cost_cents = result.cost_cents;
        delivery.estimated_time = Some(result.estimated_time.clone());
        delivery.details = json!({
            "method": result.method,
            "cost_cents": result.cost_cents,
            "estimated_time": result.estimated_time,
            "details": result.details,
        });

        order.delivery_cents = result.cost_cents;
        let breakdown = order.recompute(account.tier.discount_percent());
        self.deliveries
            .apply_delivery(&delivery, &OrderTotals { order_id: order.id, breakdown })
            .await?;

        info!(
            delivery_id = %delivery_id,
            order_id = %order.id,
            cost_cents = result.cost_cents,
            total_cents = breakdown.total_cents,
            "delivery organised"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmacy_shared::money::cents;

    fn courier() -> DeliveryStrategy {
        DeliveryStrategy::Courier { address: "Khreshchatyk 22, Kyiv".into(), delivery_time: None }
    }

    #[test]
    fn test_courier_cost_rules() {
        let tariff = DeliveryTariff::default();
        let strategy = courier();

        assert_eq!(strategy.calculate_cost(CardTier::Premium, cents(900, 0), &tariff), 0);
        assert_eq!(strategy.calculate_cost(CardTier::Premium, cents(10, 0), &tariff), 0);
        assert_eq!(strategy.calculate_cost(CardTier::Standard, cents(500, 1), &tariff), cents(25, 0));
        assert_eq!(strategy.calculate_cost(CardTier::Social, cents(500, 0), &tariff), cents(50, 0));
        assert_eq!(strategy.calculate_cost(CardTier::Standard, cents(120, 0), &tariff), cents(50, 0));
    }

    #[test]
    fn test_express_and_pickup_cost() {
        let tariff = DeliveryTariff::default();
        let express = DeliveryStrategy::Express { address: "Lviv".into() };
        assert_eq!(express.calculate_cost(CardTier::Premium, 0, &tariff), cents(80, 0));
        assert_eq!(express.calculate_cost(CardTier::Social, cents(900, 0), &tariff), cents(100, 0));
        assert_eq!(express.estimated_time(), "60 minutes");

        let pickup = DeliveryStrategy::SelfPickup { pharmacy: Pharmacy::new("Apteka #1", "Shevchenka 5", "Kyiv") };
        assert_eq!(pickup.calculate_cost(CardTier::Standard, cents(10, 0), &tariff), 0);
        assert_eq!(pickup.deliver(CardTier::Standard, 0, &tariff).details["pharmacy"], "Apteka #1");
    }

    #[test]
    fn test_estimated_time_override() {
        let strategy = DeliveryStrategy::Courier {
            address: "Odesa".into(),
            delivery_time: Some("18:00-20:00".into()),
        };
        assert_eq!(strategy.estimated_time(), "18:00-20:00");
        assert_eq!(courier().estimated_time(), "2-3 hours");
    }

    #[test]
    fn test_validation() {
        let blank = DeliveryStrategy::Express { address: "  ".into() };
        assert!(matches!(blank.validate(), Err(OrderError::Validation(_))));

        let mut closed = Pharmacy::new("Apteka #2", "Franka 3", "Lviv");
        closed.is_active = false;
        assert!(DeliveryStrategy::SelfPickup { pharmacy: closed }.validate().is_err());
        assert!(courier().validate().is_ok());
    }
}
