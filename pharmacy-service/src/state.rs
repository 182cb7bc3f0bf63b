use pharmacy_catalog::{Catalog, DeliveryTariff, StockLedger};
use pharmacy_notify::{Channel, ChannelSenders, Inbox, LogSender, NotificationDispatcher};
use pharmacy_order::{
    BuildContext, CartService, DeliveryCoordinator, OrderFactory, OrderLifecycle, PaymentProcessor,
};
use pharmacy_store::app_config::{Config, NotificationConfig};
use pharmacy_store::Repositories;
use std::sync::Arc;

/// Everything a request needs, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub catalog: Catalog,
    pub stock: StockLedger,
    pub build: BuildContext,
    pub lifecycle: OrderLifecycle,
    pub carts: CartService,
    pub payments: PaymentProcessor,
    pub deliveries: DeliveryCoordinator,
    pub inbox: Inbox,
}

impl AppState {
    pub fn new(repos: Repositories, config: &Config) -> Self {
        Self::with_senders(
            repos,
            config.business_rules.tariff(),
            channel_senders(&config.notifications),
        )
    }

    pub fn with_senders(repos: Repositories, tariff: DeliveryTariff, senders: ChannelSenders) -> Self {
        let catalog = Catalog::new(repos.catalog.clone());
        let stock = StockLedger::new(repos.inventory.clone());
        let dispatcher = NotificationDispatcher::new(senders, repos.notifications.clone());
        let lifecycle = OrderLifecycle::new(repos.orders.clone(), repos.accounts.clone(), dispatcher);

        let build = BuildContext {
            catalog: catalog.clone(),
            accounts: repos.accounts.clone(),
            orders: repos.orders.clone(),
            factory: OrderFactory::new(tariff.clone()),
            lifecycle: lifecycle.clone(),
        };

        Self {
            carts: CartService::new(repos.carts.clone(), stock.clone(), build.clone()),
            payments: PaymentProcessor::new(repos.payments.clone(), repos.orders.clone()),
            deliveries: DeliveryCoordinator::new(
                repos.deliveries.clone(),
                repos.orders.clone(),
                repos.accounts.clone(),
                tariff,
            ),
            inbox: Inbox::new(repos.notifications.clone()),
            catalog,
            stock,
            build,
            lifecycle,
            repos,
        }
    }
}

/// Log-only gateways; channels switched off in config report every send as
/// failed.
pub fn channel_senders(config: &NotificationConfig) -> ChannelSenders {
    let sender = |channel: Channel, enabled: bool| -> Arc<LogSender> {
        if enabled {
            Arc::new(LogSender::new(channel))
        } else {
            Arc::new(LogSender::disabled(channel))
        }
    };

    ChannelSenders {
        email: sender(Channel::Email, config.email_enabled),
        sms: sender(Channel::Sms, config.sms_enabled),
        push: sender(Channel::Push, config.push_enabled),
    }
}
