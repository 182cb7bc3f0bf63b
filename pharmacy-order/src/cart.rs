use chrono::{DateTime, Utc};
use pharmacy_catalog::{CatalogError, Medication, StockLedger};
use pharmacy_shared::Cents;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::builder::{BuildContext, OrderBuilder};
use crate::error::OrderError;
use crate::models::{Order, OrderType};
use crate::payment::PaymentMethod;
use crate::repository::CartRepository;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

/// Pending items of one customer, one line per product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cart {
    pub owner_id: Uuid,
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn empty(owner_id: Uuid) -> Self {
        Self { owner_id, lines: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Units across all lines.
    pub fn items_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn quantity_of(&self, product_id: Uuid) -> u32 {
        self.lines
            .iter()
            .find(|line| line.product_id == product_id)
            .map(|line| line.quantity)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartViewLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price_cents: Cents,
    pub quantity: u32,
    pub line_total_cents: Cents,
    pub is_available: bool,
}

/// Cart priced at live catalog prices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartView {
    pub owner_id: Uuid,
    pub lines: Vec<CartViewLine>,
    pub total_cents: Cents,
    pub items_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub order_type: OrderType,
    pub pharmacy_id: Option<Uuid>,
    pub delivery_address: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub comment: Option<String>,
}

impl CheckoutRequest {
    pub fn delivery(address: impl Into<String>) -> Self {
        Self {
            order_type: OrderType::Delivery,
            pharmacy_id: None,
            delivery_address: Some(address.into()),
            payment_method: None,
            comment: None,
        }
    }

    pub fn pickup(pharmacy_id: Uuid) -> Self {
        Self {
            order_type: OrderType::Pickup,
            pharmacy_id: Some(pharmacy_id),
            delivery_address: None,
            payment_method: None,
            comment: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RepeatOutcome {
    /// Nothing was added. Names follow the order's line items.
    Unavailable { names: Vec<String> },
    /// Units in the cart after the merge.
    Added { cart_items_count: u32 },
}

/// Cart operations and checkout.
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartRepository>,
    stock: StockLedger,
    ctx: BuildContext,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartRepository>, stock: StockLedger, ctx: BuildContext) -> Self {
        Self { carts, stock, ctx }
    }

    pub async fn add_item(&self, owner_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity(product_id));
        }
        let medication = self.ctx.catalog.medication(product_id).await?;
        if !medication.is_available {
            return Err(OrderError::Validation(format!("{} is not available", medication.name)));
        }

        let cart = self.carts.merge_item(owner_id, product_id, quantity).await?;
        info!(owner_id = %owner_id, product_id = %product_id, quantity, "added to cart");
        Ok(cart)
    }

    pub async fn remove_item(&self, owner_id: Uuid, product_id: Uuid) -> Result<Cart, OrderError> {
        Ok(self.carts.remove_item(owner_id, product_id).await?)
    }

    pub async fn clear(&self, owner_id: Uuid) -> Result<(), OrderError> {
        Ok(self.carts.clear(owner_id).await?)
    }

    pub async fn view(&self, owner_id: Uuid) -> Result<CartView, OrderError> {
        let cart = self.carts.cart(owner_id).await?;
        let mut lines = Vec::with_capacity(cart.lines.len());

        for line in &cart.lines {
            let Some(medication) = self.lookup(line.product_id).await? else {
                warn!(owner_id = %owner_id, product_id = %line.product_id, "cart line for unknown product");
                continue;
            };
            lines.push(CartViewLine {
                product_id: line.product_id,
                name: medication.name,
                unit_price_cents: medication.price_cents,
                quantity: line.quantity,
                line_total_cents: medication.price_cents * Cents::from(line.quantity),
                is_available: medication.is_available,
            });
        }

        Ok(CartView {
            owner_id,
            total_cents: lines.iter().map(|line| line.line_total_cents).sum(),
            items_count: lines.iter().map(|line| line.quantity).sum(),
            lines,
        })
    }

    /// Turn the cart into an order. The order is stored and the checked-out
    /// lines leave the cart in one transaction; a failed checkout leaves the
    /// cart as it was. Stock is not re-checked here.
    pub async fn checkout(&self, owner_id: Uuid, request: CheckoutRequest) -> Result<Order, OrderError> {
        let cart = self.carts.cart(owner_id).await?;
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let mut builder = OrderBuilder::new(owner_id).order_type(request.order_type);
        if let Some(pharmacy_id) = request.pharmacy_id {
            builder = builder.pharmacy(pharmacy_id);
        }
        if let Some(address) = request.delivery_address {
            builder = builder.delivery_address(address);
        }
        if let Some(method) = request.payment_method {
            builder = builder.payment_method(method);
        }
        if let Some(comment) = request.comment {
            builder = builder.comment(comment);
        }
        for line in &cart.lines {
            builder = builder.add_medication(line.product_id, line.quantity);
        }

        let checked_out: Vec<(Uuid, u32)> = cart.lines.iter().map(|line| (line.product_id, line.quantity)).collect();
        let order = builder.assemble(&self.ctx).await?;
        self.ctx.orders.insert_order_clearing_cart(&order, &checked_out).await?;
        self.ctx.lifecycle.announce_created(&order).await;
        Ok(order)
    }

    /// Put the items of an earlier order back into the cart, all or nothing.
    pub async fn repeat_order(&self, owner_id: Uuid, order_id: Uuid) -> Result<RepeatOutcome, OrderError> {
        let order = self
            .ctx
            .orders
            .get_order(order_id)
            .await?
            .filter(|order| order.owner_id == owner_id)
            .ok_or(OrderError::NotFound(order_id))?;

        let mut unavailable = Vec::new();
        for item in &order.items {
            let listed = match self.lookup(item.product_id).await? {
                Some(medication) => medication.is_available,
                None => false,
            };
            if !listed || !self.stock.is_available(item.product_id, None).await? {
                unavailable.push(item.product_name.clone());
            }
        }
        if !unavailable.is_empty() {
            info!(owner_id = %owner_id, order_id = %order_id, count = unavailable.len(), "repeat order blocked");
            return Ok(RepeatOutcome::Unavailable { names: unavailable });
        }

        let items: Vec<(Uuid, u32)> = order.items.iter().map(|item| (item.product_id, item.quantity)).collect();
        let cart = self.carts.merge_items(owner_id, &items).await?;
        Ok(RepeatOutcome::Added { cart_items_count: cart.items_count() })
    }

    async fn lookup(&self, product_id: Uuid) -> Result<Option<Medication>, OrderError> {
        match self.ctx.catalog.medication(product_id).await {
            Ok(medication) => Ok(Some(medication)),
            Err(CatalogError::MedicationNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_counts() {
        let owner = Uuid::new_v4();
        let aspirin = Uuid::new_v4();
        let mut cart = Cart::empty(owner);
        assert!(cart.is_empty());

        cart.lines.push(CartLine { product_id: aspirin, quantity: 2, added_at: Utc::now() });
        cart.lines.push(CartLine { product_id: Uuid::new_v4(), quantity: 1, added_at: Utc::now() });

        assert_eq!(cart.items_count(), 3);
        assert_eq!(cart.quantity_of(aspirin), 2);
        assert_eq!(cart.quantity_of(Uuid::new_v4()), 0);
    }

    #[test]
    fn test_repeat_outcome_shape() {
        let outcome = RepeatOutcome::Unavailable { names: vec!["Aspirin".into()] };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["outcome"], "unavailable");
        assert_eq!(value["names"][0], "Aspirin");
    }
}
