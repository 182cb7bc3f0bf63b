use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{CoreError, CoreResult, StoreError};

/// Loyalty card held by a customer. Drives the order discount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum CardTier {
    #[default]
    Standard,
    Premium,
    Social,
}

impl CardTier {
    pub fn discount_percent(self) -> u32 {
        match self {
            CardTier::Standard => 0,
            CardTier::Premium => 10,
            CardTier::Social => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CardTier::Standard => "standard",
            CardTier::Premium => "premium",
            CardTier::Social => "social",
        }
    }
}

impl fmt::Display for CardTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(CardTier::Standard),
            "premium" => Ok(CardTier::Premium),
            "social" => Ok(CardTier::Social),
            other => Err(CoreError::ValidationError(format!("Unknown card tier: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub tier: CardTier,
    pub bonus_points: i64,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(username: impl Into<String>, email: impl Into<String>, tier: CardTier) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            phone: None,
            tier,
            bonus_points: 0,
            email_notifications: true,
            sms_notifications: false,
            created_at: Utc::now(),
        }
    }
}

/// Account service consumed by the order pipeline.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn account(&self, owner_id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Credit bonus points and return the new balance.
    async fn add_bonus_points(&self, owner_id: Uuid, points: i64) -> Result<i64, StoreError>;

    async fn require_account(&self, owner_id: Uuid) -> CoreResult<Account> {
        self.account(owner_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("account {}", owner_id)))
    }

    async fn discount_percent(&self, owner_id: Uuid) -> CoreResult<u32> {
        Ok(self.require_account(owner_id).await?.tier.discount_percent())
    }

    async fn bonus_balance(&self, owner_id: Uuid) -> CoreResult<i64> {
        Ok(self.require_account(owner_id).await?.bonus_points)
    }
}
