use async_trait::async_trait;
use pharmacy_core::StoreError;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::Notification;

/// Durable notification log
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError>;

    /// Newest first
    async fn recent_notifications(
        &self,
        owner_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Notification>, StoreError>;

    async fn unread_count(&self, owner_id: Uuid) -> Result<u64, StoreError>;

    /// Mark the owner's notifications read: the listed ids, or all of them.
    /// Ids belonging to someone else are ignored. Returns rows changed.
    async fn mark_read(&self, owner_id: Uuid, ids: Option<&[Uuid]>) -> Result<u64, StoreError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct InboxPage {
    pub unread_count: u64,
    pub notifications: Vec<Notification>,
}

/// In-app notification feed for one customer at a time.
#[derive(Clone)]
pub struct Inbox {
    store: Arc<dyn NotificationRepository>,
}

impl Inbox {
    pub const PAGE_SIZE: usize = 20;

    pub fn new(store: Arc<dyn NotificationRepository>) -> Self {
        Self { store }
    }

    pub async fn latest(&self, owner_id: Uuid) -> Result<InboxPage, StoreError> {
        let notifications = self.store.recent_notifications(owner_id, Self::PAGE_SIZE).await?;
        let unread_count = self.store.unread_count(owner_id).await?;
        Ok(InboxPage { unread_count, notifications })
    }

    /// An empty id list means "everything".
    pub async fn mark_read(&self, owner_id: Uuid, ids: &[Uuid]) -> Result<u64, StoreError> {
        let ids = if ids.is_empty() { None } else { Some(ids) };
        self.store.mark_read(owner_id, ids).await
    }
}
