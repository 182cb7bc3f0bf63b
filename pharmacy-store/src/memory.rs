use async_trait::async_trait;
use chrono::Utc;
use pharmacy_catalog::{CatalogRepository, Medication, Pharmacy};
use pharmacy_core::{Account, AccountDirectory, InventorySource, StockEntry, StoreError};
use pharmacy_notify::{Notification, NotificationRepository};
use pharmacy_order::{
    Cart, CartLine, CartRepository, Delivery, DeliveryRepository, Order, OrderError, OrderRepository,
    OrderStatus, OrderTotals, Payment, PaymentRepository, PaymentSettlement, PaymentStatus, StatusWrite,
};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::admin::StoreAdmin;

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    medications: HashMap<Uuid, Medication>,
    pharmacies: HashMap<Uuid, Pharmacy>,
    stock: HashMap<(Uuid, Uuid), StockEntry>,
    orders: HashMap<Uuid, Order>,
    carts: HashMap<Uuid, Cart>,
    payments: HashMap<Uuid, Payment>,
    deliveries: HashMap<Uuid, Delivery>,
    notifications: Vec<Notification>,
}

impl Tables {
    fn cart_mut(&mut self, owner_id: Uuid) -> &mut Cart {
        self.carts.entry(owner_id).or_insert_with(|| Cart::empty(owner_id))
    }

    fn merge(&mut self, owner_id: Uuid, product_id: Uuid, quantity: u32) {
        let cart = self.cart_mut(owner_id);
        match cart.lines.iter_mut().find(|line| line.product_id == product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => cart.lines.push(CartLine { product_id, quantity, added_at: Utc::now() }),
        }
    }

    fn take_out(&mut self, owner_id: Uuid, checked_out: &[(Uuid, u32)]) {
        let Some(cart) = self.carts.get_mut(&owner_id) else {
            return;
        };
        for (product_id, quantity) in checked_out {
            if let Some(line) = cart.lines.iter_mut().find(|line| line.product_id == *product_id) {
                line.quantity = line.quantity.saturating_sub(*quantity);
            }
        }
        cart.lines.retain(|line| line.quantity > 0);
        if cart.lines.is_empty() {
            self.carts.remove(&owner_id);
        }
    }

    fn cart(&self, owner_id: Uuid) -> Cart {
        self.carts.get(&owner_id).cloned().unwrap_or_else(|| Cart::empty(owner_id))
    }
}

/// Process-local store for development and tests.
///
/// All tables sit behind one lock, so every trait method is a transaction.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountDirectory for MemoryStore {
    async fn account(&self, owner_id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.tables.lock().await.accounts.get(&owner_id).cloned())
    }

    async fn add_bonus_points(&self, owner_id: Uuid, points: i64) -> Result<i64, StoreError> {
        let mut tables = self.tables.lock().await;
        let account = tables
            .accounts
            .get_mut(&owner_id)
            .ok_or_else(|| StoreError::Backend(format!("no account {}", owner_id)))?;
        account.bonus_points += points;
        Ok(account.bonus_points)
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn medication(&self, id: Uuid) -> Result<Option<Medication>, StoreError> {
        Ok(self.tables.lock().await.medications.get(&id).cloned())
    }

    async fn pharmacy(&self, id: Uuid) -> Result<Option<Pharmacy>, StoreError> {
        Ok(self.tables.lock().await.pharmacies.get(&id).cloned())
    }

    async fn pharmacies(&self) -> Result<Vec<Pharmacy>, StoreError> {
        let mut pharmacies: Vec<Pharmacy> = self.tables.lock().await.pharmacies.values().cloned().collect();
        pharmacies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(pharmacies)
    }
}

#[async_trait]
impl InventorySource for MemoryStore {
    async fn stock_entry(&self, product_id: Uuid, pharmacy_id: Uuid) -> Result<Option<StockEntry>, StoreError> {
        Ok(self.tables.lock().await.stock.get(&(pharmacy_id, product_id)).cloned())
    }

    async fn stock_entries(&self, product_id: Uuid) -> Result<Vec<StockEntry>, StoreError> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<StockEntry> = tables
            .stock
            .values()
            .filter(|entry| entry.product_id == product_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.pharmacy_id);
        Ok(entries)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!("order {}", order.id)));
        }
        tables.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn insert_order_clearing_cart(&self, order: &Order, checked_out: &[(Uuid, u32)]) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!("order {}", order.id)));
        }
        tables.orders.insert(order.id, order.clone());
        tables.take_out(order.owner_id, checked_out);
        Ok(())
    }

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.tables.lock().await.orders.get(&order_id).cloned())
    }

    async fn list_orders(&self, owner_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let tables = self.tables.lock().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|order| order.owner_id == owner_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn write_status(&self, order_id: Uuid, status: OrderStatus) -> Result<StatusWrite, OrderError> {
        let mut tables = self.tables.lock().await;
        let order = tables.orders.get_mut(&order_id).ok_or(OrderError::NotFound(order_id))?;

        let previous = order.status;
        previous.check_transition(status)?;
        if previous != status {
            order.status = status;
            order.updated_at = Utc::now();
        }
        Ok(StatusWrite { previous, order: order.clone() })
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn cart(&self, owner_id: Uuid) -> Result<Cart, StoreError> {
        Ok(self.tables.lock().await.cart(owner_id))
    }

    async fn merge_item(&self, owner_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.merge(owner_id, product_id, quantity);
        Ok(tables.cart(owner_id))
    }

    async fn merge_items(&self, owner_id: Uuid, items: &[(Uuid, u32)]) -> Result<Cart, StoreError> {
        let mut tables = self.tables.lock().await;
        for (product_id, quantity) in items {
            tables.merge(owner_id, *product_id, *quantity);
        }
        Ok(tables.cart(owner_id))
    }

    async fn remove_item(&self, owner_id: Uuid, product_id: Uuid) -> Result<Cart, StoreError> {
        let mut tables = self.tables.lock().await;
        if let Some(cart) = tables.carts.get_mut(&owner_id) {
            cart.lines.retain(|line| line.product_id != product_id);
        }
        Ok(tables.cart(owner_id))
    }

    async fn clear(&self, owner_id: Uuid) -> Result<(), StoreError> {
        self.tables.lock().await.carts.remove(&owner_id);
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn insert_payment(&self, payment: &Payment) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.payments.values().any(|p| p.order_id == payment.order_id) {
            return Err(StoreError::Conflict(format!("payment for order {}", payment.order_id)));
        }
        tables.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, StoreError> {
        Ok(self.tables.lock().await.payments.get(&payment_id).cloned())
    }

    async fn payment_for_order(&self, order_id: Uuid) -> Result<Option<Payment>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .payments
            .values()
            .find(|p| p.order_id == order_id)
            .cloned())
    }

    async fn mark_processing(&self, payment_id: Uuid) -> Result<Payment, OrderError> {
        let mut tables = self.tables.lock().await;
        let payment = tables
            .payments
            .get_mut(&payment_id)
            .ok_or(OrderError::PaymentNotFound(payment_id))?;

        match payment.status {
            PaymentStatus::Completed => Err(OrderError::Validation("Payment has already been completed".into())),
            PaymentStatus::Processing => Err(OrderError::Validation("Payment is already being processed".into())),
            _ => {
                payment.status = PaymentStatus::Processing;
                Ok(payment.clone())
            }
        }
    }

    async fn settle_payment(&self, settlement: &PaymentSettlement) -> Result<Payment, StoreError> {
        let mut tables = self.tables.lock().await;
        let payment = tables
            .payments
            .get_mut(&settlement.payment_id)
            .ok_or_else(|| StoreError::Backend(format!("no payment {}", settlement.payment_id)))?;

        payment.status = settlement.status;
        payment.transaction_id = settlement.transaction_id.clone();
        payment.details = settlement.details.clone();
        payment.paid_at = settlement.paid_at;
        let payment = payment.clone();

        if settlement.status == PaymentStatus::Completed {
            if let Some(order) = tables.orders.get_mut(&settlement.order_id) {
                order.is_paid = true;
                order.updated_at = Utc::now();
            }
        }
        Ok(payment)
    }
}

#[async_trait]
impl DeliveryRepository for MemoryStore {
    async fn insert_delivery(&self, delivery: &Delivery) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.deliveries.values().any(|d| d.order_id == delivery.order_id) {
            return Err(StoreError::Conflict(format!("delivery for order {}", delivery.order_id)));
        }
        tables.deliveries.insert(delivery.id, delivery.clone());
        Ok(())
    }

    async fn get_delivery(&self, delivery_id: Uuid) -> Result<Option<Delivery>, StoreError> {
        Ok(self.tables.lock().await.deliveries.get(&delivery_id).cloned())
    }

    async fn delivery_for_order(&self, order_id: Uuid) -> Result<Option<Delivery>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .deliveries
            .values()
            .find(|d| d.order_id == order_id)
            .cloned())
    }

    async fn apply_delivery(&self, delivery: &Delivery, totals: &OrderTotals) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.orders.contains_key(&totals.order_id) {
            return Err(StoreError::Backend(format!("no order {}", totals.order_id)));
        }
        tables.deliveries.insert(delivery.id, delivery.clone());
        if let Some(order) = tables.orders.get_mut(&totals.order_id) {
            order.apply_breakdown(&totals.breakdown);
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        self.tables.lock().await.notifications.push(notification.clone());
        Ok(())
    }

    async fn recent_notifications(&self, owner_id: Uuid, limit: usize) -> Result<Vec<Notification>, StoreError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| n.owner_id == owner_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps; reverse it.
        rows.reverse();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn unread_count(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.owner_id == owner_id && !n.is_read)
            .count() as u64)
    }

    async fn mark_read(&self, owner_id: Uuid, ids: Option<&[Uuid]>) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;
        let mut changed = 0;
        for n in tables.notifications.iter_mut() {
            let selected = ids.map_or(true, |ids| ids.contains(&n.id));
            if n.owner_id == owner_id && !n.is_read && selected {
                n.is_read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl StoreAdmin for MemoryStore {
    async fn account_count(&self) -> Result<u64, StoreError> {
        Ok(self.tables.lock().await.accounts.len() as u64)
    }

    async fn account_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.accounts.values().any(|a| a.username == account.username) {
            return Err(StoreError::Conflict(format!("username {}", account.username)));
        }
        tables.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn insert_medication(&self, medication: &Medication) -> Result<(), StoreError> {
        self.tables.lock().await.medications.insert(medication.id, medication.clone());
        Ok(())
    }

    async fn insert_pharmacy(&self, pharmacy: &Pharmacy) -> Result<(), StoreError> {
        self.tables.lock().await.pharmacies.insert(pharmacy.id, pharmacy.clone());
        Ok(())
    }

    async fn set_stock(&self, pharmacy_id: Uuid, product_id: Uuid, quantity: i64) -> Result<(), StoreError> {
        if quantity < 0 {
            return Err(StoreError::Conflict(format!("negative stock {} for {}", quantity, product_id)));
        }
        self.tables.lock().await.stock.insert(
            (pharmacy_id, product_id),
            StockEntry { pharmacy_id, product_id, quantity, last_updated: Utc::now() },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmacy_notify::NotificationKind;

    #[tokio::test]
    async fn test_cart_merges_quantities() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let aspirin = Uuid::new_v4();

        store.merge_item(owner, aspirin, 2).await.unwrap();
        let cart = store.merge_items(owner, &[(aspirin, 1), (Uuid::new_v4(), 4)]).await.unwrap();

        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.quantity_of(aspirin), 3);

        let cart = store.remove_item(owner, aspirin).await.unwrap();
        assert_eq!(cart.items_count(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_adds_do_not_lose_updates() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let product = Uuid::new_v4();

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.merge_item(owner, product, 1).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.cart(owner).await.unwrap().quantity_of(product), 20);
    }

    #[tokio::test]
    async fn test_checkout_keeps_lines_added_after_read() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let aspirin = Uuid::new_v4();
        let iodine = Uuid::new_v4();

        store.merge_item(owner, aspirin, 2).await.unwrap();
        let snapshot = store.cart(owner).await.unwrap();
        let checked_out: Vec<(Uuid, u32)> = snapshot.lines.iter().map(|l| (l.product_id, l.quantity)).collect();

        // Lands between the cart read and the order insert.
        store.merge_items(owner, &[(aspirin, 1), (iodine, 3)]).await.unwrap();

        let factory = pharmacy_order::OrderFactory::new(pharmacy_catalog::DeliveryTariff::default());
        let order = factory.delivery(owner, None);
        store.insert_order_clearing_cart(&order, &checked_out).await.unwrap();

        let cart = store.cart(owner).await.unwrap();
        assert_eq!(cart.quantity_of(aspirin), 1);
        assert_eq!(cart.quantity_of(iodine), 3);
        assert!(store.get_order(order.id).await.unwrap().is_some());

        let rest: Vec<(Uuid, u32)> = cart.lines.iter().map(|l| (l.product_id, l.quantity)).collect();
        store.insert_order_clearing_cart(&factory.delivery(owner, None), &rest).await.unwrap();
        assert!(store.cart(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_scopes_to_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mine = Notification::push(owner, NotificationKind::Info, "a".into(), true);
        let theirs = Notification::push(other, NotificationKind::Info, "b".into(), true);
        store.insert_notification(&mine).await.unwrap();
        store.insert_notification(&theirs).await.unwrap();
        store
            .insert_notification(&Notification::push(owner, NotificationKind::Promotion, "c".into(), true))
            .await
            .unwrap();

        assert_eq!(store.mark_read(owner, Some(&[mine.id, theirs.id][..])).await.unwrap(), 1);
        assert_eq!(store.unread_count(owner).await.unwrap(), 1);
        assert_eq!(store.unread_count(other).await.unwrap(), 1);

        assert_eq!(store.mark_read(owner, None).await.unwrap(), 1);
        assert_eq!(store.unread_count(owner).await.unwrap(), 0);

        let recent = store.recent_notifications(owner, 20).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "c");
    }

    #[tokio::test]
    async fn test_negative_stock_rejected() {
        let store = MemoryStore::new();
        assert!(store.set_stock(Uuid::new_v4(), Uuid::new_v4(), -1).await.is_err());
    }
}
