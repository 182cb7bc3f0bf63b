use chrono::Utc;
use pharmacy_core::AccountDirectory;
use pharmacy_notify::{Channel, ChannelOutcome, InboxPage, NotifyEvent, Recipient};
use pharmacy_shared::models::events::{MedicationAvailableEvent, PromotionEvent};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct MarkReadResponse {
    pub marked: u64,
}

/// Send `event` to one customer. `channels` overrides the event's default
/// fan-out. Per-channel failures come back as `delivered: false`.
pub async fn dispatch_notification(
    state: &AppState,
    owner_id: Uuid,
    event: &NotifyEvent,
    channels: Option<&[Channel]>,
) -> Result<Vec<ChannelOutcome>, ServiceError> {
    let account = state.repos.accounts.require_account(owner_id).await?;
    let recipient = Recipient::from(&account);
    Ok(state.lifecycle.dispatcher().dispatch(&recipient, event, channels).await)
}

/// Latest page of the in-app feed plus the unread count.
pub async fn my_notifications(state: &AppState, owner_id: Uuid) -> Result<InboxPage, ServiceError> {
    Ok(state.inbox.latest(owner_id).await?)
}

/// Mark the listed notifications read, or all of them when `ids` is empty.
pub async fn mark_notifications_read(
    state: &AppState,
    owner_id: Uuid,
    ids: &[Uuid],
) -> Result<MarkReadResponse, ServiceError> {
    let marked = state.inbox.mark_read(owner_id, ids).await?;
    Ok(MarkReadResponse { marked })
}

pub async fn notify_medication_available(
    state: &AppState,
    owner_id: Uuid,
    medication_id: Uuid,
) -> Result<Vec<ChannelOutcome>, ServiceError> {
    let medication = state.catalog.medication(medication_id).await?;
    let event = NotifyEvent::MedicationAvailable(MedicationAvailableEvent {
        medication_id: medication.id,
        name: medication.name,
        manufacturer: medication.manufacturer,
        price_cents: medication.price_cents,
        timestamp: Utc::now().timestamp(),
    });
    dispatch_notification(state, owner_id, &event, None).await
}

/// Broadcast a promotion. Unknown customers are skipped; returns how many
/// were reached on at least one channel.
pub async fn notify_promotion(state: &AppState, owner_ids: &[Uuid], text: &str) -> Result<usize, ServiceError> {
    let event = NotifyEvent::Promotion(PromotionEvent {
        text: text.to_string(),
        timestamp: Utc::now().timestamp(),
    });

    let mut reached = 0;
    for owner_id in owner_ids {
        let Some(account) = state.repos.accounts.account(*owner_id).await? else {
            warn!(owner_id = %owner_id, "promotion recipient not found");
            continue;
        };
        let outcomes = state
            .lifecycle
            .dispatcher()
            .dispatch(&Recipient::from(&account), &event, None)
            .await;
        if outcomes.iter().any(|outcome| outcome.delivered) {
            reached += 1;
        }
    }

    info!(recipients = owner_ids.len(), reached, "promotion sent");
    Ok(reached)
}
