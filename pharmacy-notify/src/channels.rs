use async_trait::async_trait;
use pharmacy_core::Account;
use pharmacy_shared::Masked;
use tracing::info;
use uuid::Uuid;

use crate::models::Channel;

/// Who a notification is for, and how they can be reached.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub owner_id: Uuid,
    pub username: String,
    pub email: Masked<String>,
    pub phone: Option<Masked<String>>,
    pub email_opt_in: bool,
    pub sms_opt_in: bool,
}

impl From<&Account> for Recipient {
    fn from(account: &Account) -> Self {
        Self {
            owner_id: account.id,
            username: account.username.clone(),
            email: Masked::new(account.email.clone()),
            phone: account
                .phone
                .as_ref()
                .filter(|p| !p.trim().is_empty())
                .map(|p| Masked::new(p.clone())),
            email_opt_in: account.email_notifications,
            sms_opt_in: account.sms_notifications,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Outbound gateway for one channel (mail relay, SMS API, push service).
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// Returns `false` when the message could not be handed over.
    async fn send(&self, contact: &str, message: &RenderedMessage) -> bool;
}

/// Sender that only writes to the log. Used where no real gateway is wired.
#[derive(Debug, Clone)]
pub struct LogSender {
    channel: Channel,
    enabled: bool,
}

impl LogSender {
    pub fn new(channel: Channel) -> Self {
        Self { channel, enabled: true }
    }

    pub fn disabled(channel: Channel) -> Self {
        Self { channel, enabled: false }
    }
}

#[async_trait]
impl ChannelSender for LogSender {
    async fn send(&self, contact: &str, message: &RenderedMessage) -> bool {
        if !self.enabled {
            info!(channel = %self.channel, "channel disabled, dropping message");
            return false;
        }
        // Contacts are PII; log the length only.
        info!(
            channel = %self.channel,
            contact_len = contact.len(),
            subject = %message.subject,
            "sent: {}",
            message.body
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmacy_core::CardTier;

    #[test]
    fn test_recipient_drops_blank_phone() {
        let mut account = Account::new("ivan_petrov", "ivan@example.com", CardTier::Standard);
        account.phone = Some("  ".into());
        account.sms_notifications = true;

        let recipient = Recipient::from(&account);
        assert!(recipient.phone.is_none());
        assert!(recipient.sms_opt_in);
        assert_eq!(format!("{:?}", recipient.email), "********");
    }

    #[tokio::test]
    async fn test_disabled_sender_reports_failure() {
        let message = RenderedMessage { subject: "s".into(), body: "b".into() };
        assert!(LogSender::new(Channel::Email).send("a@b.c", &message).await);
        assert!(!LogSender::disabled(Channel::Sms).send("+380", &message).await);
    }
}
