pub mod app_config;
pub mod database;
pub mod admin;
pub mod memory;
pub mod catalog_repo;
pub mod account_repo;
pub mod order_repo;
pub mod payment_repo;
pub mod notification_repo;

pub use admin::{StoreAdmin, StoreAdminRepository};
pub use database::DbClient;
pub use memory::MemoryStore;
pub use catalog_repo::StoreCatalogRepository;
pub use account_repo::StoreAccountRepository;
pub use order_repo::StoreOrderRepository;
pub use payment_repo::StorePaymentRepository;
pub use notification_repo::StoreNotificationRepository;

use pharmacy_catalog::CatalogRepository;
use pharmacy_core::{AccountDirectory, InventorySource};
use pharmacy_notify::NotificationRepository;
use pharmacy_order::{CartRepository, DeliveryRepository, OrderRepository, PaymentRepository};
use sqlx::PgPool;
use std::sync::Arc;

/// Every persistence seam the service needs, backed by one store.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountDirectory>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub inventory: Arc<dyn InventorySource>,
    pub orders: Arc<dyn OrderRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub deliveries: Arc<dyn DeliveryRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub admin: Arc<dyn StoreAdmin>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            accounts: store.clone(),
            catalog: store.clone(),
            inventory: store.clone(),
            orders: store.clone(),
            carts: store.clone(),
            payments: store.clone(),
            deliveries: store.clone(),
            notifications: store.clone(),
            admin: store,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let catalog = Arc::new(StoreCatalogRepository::new(pool.clone()));
        let orders = Arc::new(StoreOrderRepository::new(pool.clone()));
        let payments = Arc::new(StorePaymentRepository::new(pool.clone()));

        Self {
            accounts: Arc::new(StoreAccountRepository::new(pool.clone())),
            catalog: catalog.clone(),
            inventory: catalog,
            orders: orders.clone(),
            carts: orders,
            payments: payments.clone(),
            deliveries: payments,
            notifications: Arc::new(StoreNotificationRepository::new(pool.clone())),
            admin: Arc::new(StoreAdminRepository::new(pool)),
        }
    }
}
