use uuid::Uuid;

use crate::money::Cents;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct OrderCreatedEvent {
    pub order_id: Uuid,
    pub owner_id: Uuid,
    pub total_cents: Cents,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct OrderStatusChangedEvent {
    pub order_id: Uuid,
    pub owner_id: Uuid,
    /// Status codes as stored, e.g. `pending`, `in_delivery`.
    pub from_status: String,
    pub to_status: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct BonusAddedEvent {
    pub owner_id: Uuid,
    pub points: i64,
    pub reason: String,
    pub balance: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct MedicationAvailableEvent {
    pub medication_id: Uuid,
    pub name: String,
    pub manufacturer: String,
    pub price_cents: Cents,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct PromotionEvent {
    pub text: String,
    pub timestamp: i64,
}
