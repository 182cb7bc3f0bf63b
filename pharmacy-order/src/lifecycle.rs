use chrono::Utc;
use pharmacy_core::AccountDirectory;
use pharmacy_notify::{ChannelOutcome, NotificationDispatcher, NotifyEvent, Recipient};
use pharmacy_shared::models::events::{BonusAddedEvent, OrderCreatedEvent, OrderStatusChangedEvent};
use pharmacy_shared::money::whole_units;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::OrderError;
use crate::models::{Order, OrderStatus};
use crate::repository::OrderRepository;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct BonusAward {
    pub order_id: Uuid,
    pub owner_id: Uuid,
    pub points: i64,
    pub balance: i64,
}

/// Status state machine for persisted orders.
///
/// Every successful create announces `order_created` once. Every status
/// write whose stored value actually changed announces
/// `order_status_changed` once; writing the current status again is a no-op
/// for notifications. Bonus points are credited separately, through
/// [`OrderLifecycle::award_bonus`].
#[derive(Clone)]
pub struct OrderLifecycle {
    orders: Arc<dyn OrderRepository>,
    accounts: Arc<dyn AccountDirectory>,
    dispatcher: NotificationDispatcher,
}

impl OrderLifecycle {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        accounts: Arc<dyn AccountDirectory>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self { orders, accounts, dispatcher }
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// Called once, right after the order was first persisted.
    pub async fn announce_created(&self, order: &Order) -> Vec<ChannelOutcome> {
        info!(order_id = %order.id, owner_id = %order.owner_id, total_cents = order.total_cents, "order created");
        let event = NotifyEvent::OrderCreated(OrderCreatedEvent {
            order_id: order.id,
            owner_id: order.owner_id,
            total_cents: order.total_cents,
            timestamp: Utc::now().timestamp(),
        });
        self.notify(order.owner_id, &event).await
    }

    pub async fn transition_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Order, OrderError> {
        let write = self.orders.write_status(order_id, status).await?;
        if !write.changed() {
            debug!(order_id = %order_id, status = %status, "status unchanged");
            return Ok(write.order);
        }

        let order = write.order;
        info!(order_id = %order.id, from = %write.previous, to = %order.status, "order status changed");

        let event = NotifyEvent::OrderStatusChanged(OrderStatusChangedEvent {
            order_id: order.id,
            owner_id: order.owner_id,
            from_status: write.previous.to_string(),
            to_status: order.status.to_string(),
            timestamp: Utc::now().timestamp(),
        });
        self.notify(order.owner_id, &event).await;
        Ok(order)
    }

    pub async fn cancel(&self, order_id: Uuid) -> Result<Order, OrderError> {
        self.transition_status(order_id, OrderStatus::Cancelled).await
    }

    /// Credit the owner one point per whole currency unit of a completed
    /// order's total and announce it.
    pub async fn award_bonus(&self, order_id: Uuid) -> Result<BonusAward, OrderError> {
        let order = self.orders.get_order(order_id).await?.ok_or(OrderError::NotFound(order_id))?;
        if order.status != OrderStatus::Completed {
            return Err(OrderError::Validation(format!(
                "Bonus points are awarded for completed orders only, order is {}",
                order.status
            )));
        }

        let points = whole_units(order.total_cents);
        if points <= 0 {
            let balance = self.accounts.bonus_balance(order.owner_id).await?;
            return Ok(BonusAward { order_id, owner_id: order.owner_id, points: 0, balance });
        }

        let balance = self.accounts.add_bonus_points(order.owner_id, points).await?;
        info!(owner_id = %order.owner_id, order_id = %order_id, points, balance, "bonus points credited");

        let event = NotifyEvent::BonusAdded(BonusAddedEvent {
            owner_id: order.owner_id,
            points,
            reason: format!("order #{}", order.id),
            balance,
            timestamp: Utc::now().timestamp(),
        });
        self.notify(order.owner_id, &event).await;

        Ok(BonusAward { order_id, owner_id: order.owner_id, points, balance })
    }

    async fn notify(&self, owner_id: Uuid, event: &NotifyEvent) -> Vec<ChannelOutcome> {
        match self.accounts.account(owner_id).await {
            Ok(Some(account)) => self.dispatcher.dispatch(&Recipient::from(&account), event, None).await,
            Ok(None) => {
                warn!(owner_id = %owner_id, event = event.name(), "no account to notify");
                Vec::new()
            }
            Err(e) => {
                error!(owner_id = %owner_id, event = event.name(), "account lookup failed: {}", e);
                Vec::new()
            }
        }
    }
}
