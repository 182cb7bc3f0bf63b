use pharmacy_catalog::Catalog;
use pharmacy_core::AccountDirectory;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::OrderError;
use crate::factory::OrderFactory;
use crate::lifecycle::OrderLifecycle;
use crate::models::{Order, OrderType};
use crate::payment::PaymentMethod;
use crate::repository::OrderRepository;

/// Services an [`OrderBuilder`] needs to turn its draft into an order.
#[derive(Clone)]
pub struct BuildContext {
    pub catalog: Catalog,
    pub accounts: Arc<dyn AccountDirectory>,
    pub orders: Arc<dyn OrderRepository>,
    pub factory: OrderFactory,
    pub lifecycle: OrderLifecycle,
}

/// Step-by-step order draft.
///
/// ```ignore
/// let order = OrderBuilder::new(owner)
///     .order_type(OrderType::Pickup)
///     .pharmacy(pharmacy_id)
///     .add_medication(aspirin_id, 2)
///     .build(&ctx)
///     .await?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBuilder {
    owner_id: Uuid,
    order_type: Option<OrderType>,
    pharmacy_id: Option<Uuid>,
    items: Vec<(Uuid, u32)>,
    delivery_address: Option<String>,
    payment_method: Option<PaymentMethod>,
    comment: Option<String>,
}

impl OrderBuilder {
    pub fn new(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            order_type: None,
            pharmacy_id: None,
            items: Vec::new(),
            delivery_address: None,
            payment_method: None,
            comment: None,
        }
    }

    pub fn order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = Some(order_type);
        self
    }

    pub fn pharmacy(mut self, pharmacy_id: Uuid) -> Self {
        self.pharmacy_id = Some(pharmacy_id);
        self
    }

    /// Adding the same product twice adds up the quantities.
    pub fn add_medication(mut self, product_id: Uuid, quantity: u32) -> Self {
        match self.items.iter_mut().find(|(id, _)| *id == product_id) {
            Some((_, existing)) => *existing = existing.saturating_add(quantity),
            None => self.items.push((product_id, quantity)),
        }
        self
    }

    pub fn delivery_address(mut self, address: impl Into<String>) -> Self {
        self.delivery_address = non_blank(address.into());
        self
    }

    pub fn payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = non_blank(comment.into());
        self
    }

    /// Drop everything but the owner.
    pub fn reset(self) -> Self {
        Self::new(self.owner_id)
    }

    pub fn validate(&self) -> Result<OrderType, OrderError> {
        let order_type = self.order_type.ok_or(OrderError::MissingOrderType)?;
        if self.items.is_empty() {
            return Err(OrderError::NoItems);
        }
        if let Some((product_id, _)) = self.items.iter().find(|(_, qty)| *qty == 0) {
            return Err(OrderError::InvalidQuantity(*product_id));
        }
        Ok(order_type)
    }

    /// Priced order in memory, not yet persisted.
    ///
    /// Each line copies the catalog price at this moment.
    pub async fn assemble(&self, ctx: &BuildContext) -> Result<Order, OrderError> {
        let order_type = self.validate()?;
        let mut order = ctx.factory.create(order_type, self.owner_id, self.pharmacy_id)?;

        if let Some(pharmacy_id) = self.pharmacy_id {
            let pharmacy = ctx.catalog.pharmacy(pharmacy_id).await?;
            if !pharmacy.is_active {
                return Err(OrderError::Validation(format!("Pharmacy {} is closed", pharmacy.name)));
            }
        }

        if let Some(address) = &self.delivery_address {
            order.delivery_address = Some(address.clone());
        }
        if let Some(method) = self.payment_method {
            order.payment_method = method;
        }
        if let Some(comment) = &self.comment {
            order.comment = Some(comment.clone());
        }

        for (product_id, quantity) in &self.items {
            let medication = ctx.catalog.medication(*product_id).await?;
            order.add_item(medication.id, medication.name, *quantity, medication.price_cents);
        }

        let discount_percent = ctx.accounts.discount_percent(self.owner_id).await?;
        let breakdown = order.recompute(discount_percent);
        debug!(order_id = %order.id, ?breakdown, "order assembled");
        Ok(order)
    }

    /// Assemble, persist in one transaction, and announce the new order.
    pub async fn build(&self, ctx: &BuildContext) -> Result<Order, OrderError> {
        let order = self.assemble(ctx).await?;
        ctx.orders.insert_order(&order).await?;
        ctx.lifecycle.announce_created(&order).await;
        Ok(order)
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
