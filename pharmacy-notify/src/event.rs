use pharmacy_shared::models::events::{
    BonusAddedEvent, MedicationAvailableEvent, OrderCreatedEvent, OrderStatusChangedEvent,
    PromotionEvent,
};
use pharmacy_shared::money::format_cents;
use serde::{Deserialize, Serialize};

use crate::models::{Channel, NotificationKind};

/// A logical event that a customer should hear about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotifyEvent {
    OrderCreated(OrderCreatedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    BonusAdded(BonusAddedEvent),
    MedicationAvailable(MedicationAvailableEvent),
    Promotion(PromotionEvent),
}

impl NotifyEvent {
    pub fn name(&self) -> &'static str {
        match self {
            NotifyEvent::OrderCreated(_) => "order_created",
            NotifyEvent::OrderStatusChanged(_) => "order_status_changed",
            NotifyEvent::BonusAdded(_) => "bonus_added",
            NotifyEvent::MedicationAvailable(_) => "medication_available",
            NotifyEvent::Promotion(_) => "promotion",
        }
    }

    /// Channels used when the caller does not pick them.
    pub fn default_channels(&self) -> &'static [Channel] {
        match self {
            // The in-app record is enough; the customer is looking at the UI.
            NotifyEvent::OrderCreated(_) => &[Channel::Push],
            NotifyEvent::OrderStatusChanged(_) | NotifyEvent::MedicationAvailable(_) => {
                &[Channel::Email, Channel::Sms, Channel::Push]
            }
            NotifyEvent::BonusAdded(_) | NotifyEvent::Promotion(_) => {
                &[Channel::Email, Channel::Push]
            }
        }
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            NotifyEvent::OrderCreated(_) => NotificationKind::OrderCreated,
            NotifyEvent::OrderStatusChanged(e) => match e.to_status.as_str() {
                "confirmed" => NotificationKind::OrderConfirmed,
                "ready" | "in_delivery" => NotificationKind::OrderReady,
                "completed" => NotificationKind::OrderDelivered,
                "cancelled" => NotificationKind::OrderCancelled,
                _ => NotificationKind::Info,
            },
            NotifyEvent::BonusAdded(_) => NotificationKind::BonusAdded,
            NotifyEvent::MedicationAvailable(_) => NotificationKind::MedicationAvailable,
            NotifyEvent::Promotion(_) => NotificationKind::Promotion,
        }
    }

    /// Customer-facing copy, shared by every channel.
    pub fn message(&self) -> String {
        match self {
            NotifyEvent::OrderCreated(e) => format!(
                "Thank you for your order! Order number: #{}. We will let you know when its status changes.",
                e.order_id
            ),
            NotifyEvent::OrderStatusChanged(e) => match e.to_status.as_str() {
                "confirmed" => format!("Your order #{} has been confirmed and is being prepared.", e.order_id),
                "ready" => format!("Your order #{} is ready for pickup!", e.order_id),
                "in_delivery" => format!("Your order #{} has been handed over to the courier.", e.order_id),
                "completed" => format!("Your order #{} has been delivered. Thank you!", e.order_id),
                "cancelled" => format!("Your order #{} has been cancelled.", e.order_id),
                _ => format!("The status of order #{} has changed.", e.order_id),
            },
            NotifyEvent::BonusAdded(e) => format!(
                "Congratulations! You have earned {} bonus points for {}. Your balance is now {} points. Use them on your next order!",
                e.points, e.reason, e.balance
            ),
            NotifyEvent::MedicationAvailable(e) => format!(
                "Back in stock: {} ({}). Price: {} UAH. Order it while it lasts!",
                e.name,
                e.manufacturer,
                format_cents(e.price_cents)
            ),
            NotifyEvent::Promotion(e) => e.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_change(to: &str) -> NotifyEvent {
        NotifyEvent::OrderStatusChanged(OrderStatusChangedEvent {
            order_id: Uuid::nil(),
            owner_id: Uuid::nil(),
            from_status: "pending".into(),
            to_status: to.into(),
            timestamp: 0,
        })
    }

    #[test]
    fn test_fan_out_policy() {
        let created = NotifyEvent::OrderCreated(OrderCreatedEvent {
            order_id: Uuid::nil(),
            owner_id: Uuid::nil(),
            total_cents: 0,
            timestamp: 0,
        });
        assert_eq!(created.default_channels(), &[Channel::Push]);
        assert_eq!(
            status_change("ready").default_channels(),
            &[Channel::Email, Channel::Sms, Channel::Push]
        );

        let promo = NotifyEvent::Promotion(PromotionEvent { text: "-20% on vitamins".into(), timestamp: 0 });
        assert_eq!(promo.default_channels(), &[Channel::Email, Channel::Push]);
        assert_eq!(promo.message(), "-20% on vitamins");
    }

    #[test]
    fn test_status_copy_is_distinct() {
        let copies: Vec<String> = ["confirmed", "ready", "in_delivery", "completed", "cancelled"]
            .iter()
            .map(|s| status_change(s).message())
            .collect();
        for (i, a) in copies.iter().enumerate() {
            for b in copies.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_unmapped_status_falls_back() {
        let preparing = status_change("preparing");
        assert_eq!(preparing.kind(), NotificationKind::Info);
        assert!(preparing.message().starts_with("The status of order"));
        assert_eq!(status_change("in_delivery").kind(), NotificationKind::OrderReady);
    }
}
