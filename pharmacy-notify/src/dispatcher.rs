use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::channels::{ChannelSender, LogSender, Recipient, RenderedMessage};
use crate::event::NotifyEvent;
use crate::inbox::NotificationRepository;
use crate::models::{Channel, Notification};

/// One gateway per channel.
#[derive(Clone)]
pub struct ChannelSenders {
    pub email: Arc<dyn ChannelSender>,
    pub sms: Arc<dyn ChannelSender>,
    pub push: Arc<dyn ChannelSender>,
}

impl ChannelSenders {
    /// Log-only gateways for every channel
    pub fn logging() -> Self {
        Self {
            email: Arc::new(LogSender::new(Channel::Email)),
            sms: Arc::new(LogSender::new(Channel::Sms)),
            push: Arc::new(LogSender::new(Channel::Push)),
        }
    }

    fn get(&self, channel: Channel) -> &dyn ChannelSender {
        match channel {
            Channel::Email => self.email.as_ref(),
            Channel::Sms => self.sms.as_ref(),
            Channel::Push => self.push.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ChannelOutcome {
    pub channel: Channel,
    pub delivered: bool,
}

/// Fans one event out to a recipient's channels.
///
/// Holds no subscriptions: the channel list is resolved on every call.
/// Channels are attempted independently and failures are reported as
/// `delivered: false`, never as errors. Push is the only channel that writes
/// a [`Notification`] row, so each event leaves exactly one stored record.
/// Sends are not retried or queued.
#[derive(Clone)]
pub struct NotificationDispatcher {
    senders: ChannelSenders,
    store: Arc<dyn NotificationRepository>,
}

impl NotificationDispatcher {
    pub fn new(senders: ChannelSenders, store: Arc<dyn NotificationRepository>) -> Self {
        Self { senders, store }
    }

    /// `channels` overrides the event's default fan-out. Duplicates are
    /// attempted once.
    pub async fn dispatch(
        &self,
        recipient: &Recipient,
        event: &NotifyEvent,
        channels: Option<&[Channel]>,
    ) -> Vec<ChannelOutcome> {
        let requested = channels.unwrap_or_else(|| event.default_channels());
        let mut seen: Vec<Channel> = Vec::with_capacity(requested.len());
        for channel in requested {
            if !seen.contains(channel) {
                seen.push(*channel);
            }
        }

        let kind = event.kind();
        let message = RenderedMessage {
            subject: kind.subject().to_string(),
            body: event.message(),
        };

        let mut outcomes = Vec::with_capacity(seen.len());
        for channel in seen {
            let delivered = match channel {
                Channel::Email => self.send_email(recipient, &message).await,
                Channel::Sms => self.send_sms(recipient, &message).await,
                Channel::Push => self.send_push(recipient, event, &message).await,
            };
            outcomes.push(ChannelOutcome { channel, delivered });
        }

        info!(
            owner_id = %recipient.owner_id,
            event = event.name(),
            delivered = outcomes.iter().filter(|o| o.delivered).count(),
            attempted = outcomes.len(),
            "notification dispatched"
        );
        outcomes
    }

    async fn send_email(&self, recipient: &Recipient, message: &RenderedMessage) -> bool {
        if !recipient.email_opt_in || recipient.email.expose().trim().is_empty() {
            return false;
        }
        let sent = self.senders.get(Channel::Email).send(recipient.email.expose(), message).await;
        if !sent {
            warn!(owner_id = %recipient.owner_id, "email delivery failed");
        }
        sent
    }

    async fn send_sms(&self, recipient: &Recipient, message: &RenderedMessage) -> bool {
        let phone = match (&recipient.phone, recipient.sms_opt_in) {
            (Some(phone), true) => phone,
            _ => return false,
        };
        let sent = self.senders.get(Channel::Sms).send(phone.expose(), message).await;
        if !sent {
            warn!(owner_id = %recipient.owner_id, "sms delivery failed");
        }
        sent
    }

    async fn send_push(&self, recipient: &Recipient, event: &NotifyEvent, message: &RenderedMessage) -> bool {
        let sent = self.senders.get(Channel::Push).send(&recipient.username, message).await;
        let record = Notification::push(recipient.owner_id, event.kind(), message.body.clone(), sent);

        match self.store.insert_notification(&record).await {
            Ok(()) => sent,
            Err(e) => {
                error!(owner_id = %recipient.owner_id, "failed to store notification: {}", e);
                false
            }
        }
    }
}
