pub mod models;
pub mod event;
pub mod channels;
pub mod dispatcher;
pub mod inbox;

pub use models::{Channel, Notification, NotificationKind};
pub use event::NotifyEvent;
pub use channels::{ChannelSender, LogSender, Recipient, RenderedMessage};
pub use dispatcher::{ChannelOutcome, ChannelSenders, NotificationDispatcher};
pub use inbox::{Inbox, InboxPage, NotificationRepository};
