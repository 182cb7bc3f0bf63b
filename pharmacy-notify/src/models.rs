use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderCreated,
    OrderConfirmed,
    OrderReady,
    OrderDelivered,
    OrderCancelled,
    Promotion,
    BonusAdded,
    MedicationAvailable,
    Info,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::OrderCreated => "order_created",
            NotificationKind::OrderConfirmed => "order_confirmed",
            NotificationKind::OrderReady => "order_ready",
            NotificationKind::OrderDelivered => "order_delivered",
            NotificationKind::OrderCancelled => "order_cancelled",
            NotificationKind::Promotion => "promotion",
            NotificationKind::BonusAdded => "bonus_added",
            NotificationKind::MedicationAvailable => "medication_available",
            NotificationKind::Info => "info",
        }
    }

    /// Email subject line
    pub fn subject(self) -> &'static str {
        match self {
            NotificationKind::OrderCreated => "Order created",
            NotificationKind::OrderConfirmed => "Order confirmed",
            NotificationKind::OrderReady => "Order ready",
            NotificationKind::OrderDelivered => "Order delivered",
            NotificationKind::Promotion => "Special offer",
            NotificationKind::BonusAdded => "Bonus points added",
            NotificationKind::MedicationAvailable => "Medication back in stock",
            NotificationKind::OrderCancelled | NotificationKind::Info => {
                "Message from your online pharmacy"
            }
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "order_created" => NotificationKind::OrderCreated,
            "order_confirmed" => NotificationKind::OrderConfirmed,
            "order_ready" => NotificationKind::OrderReady,
            "order_delivered" => NotificationKind::OrderDelivered,
            "order_cancelled" => NotificationKind::OrderCancelled,
            "promotion" => NotificationKind::Promotion,
            "bonus_added" => NotificationKind::BonusAdded,
            "medication_available" => NotificationKind::MedicationAvailable,
            "info" => NotificationKind::Info,
            other => return Err(format!("unknown notification kind: {}", other)),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    Push,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Push => "push",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Channel::Email),
            "sms" => Ok(Channel::Sms),
            "push" => Ok(Channel::Push),
            other => Err(format!("unknown channel: {}", other)),
        }
    }
}

/// Stored in-app notification. Only push deliveries produce one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: NotificationKind,
    pub channel: Channel,
    pub message: String,
    pub is_sent: bool,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn push(owner_id: Uuid, kind: NotificationKind, message: String, is_sent: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            kind,
            channel: Channel::Push,
            message,
            is_sent,
            is_read: false,
            created_at: now,
            sent_at: is_sent.then_some(now),
        }
    }
}
