use pharmacy_catalog::DeliveryTariff;
use uuid::Uuid;

use crate::error::OrderError;
use crate::models::{Order, OrderType};

/// Creates bare orders with the rules of their order type.
#[derive(Debug, Clone, Default)]
pub struct OrderFactory {
    tariff: DeliveryTariff,
}

impl OrderFactory {
    pub fn new(tariff: DeliveryTariff) -> Self {
        Self { tariff }
    }

    pub fn tariff(&self) -> &DeliveryTariff {
        &self.tariff
    }

    /// Home delivery. A pharmacy is optional (the dispatching branch); the
    /// cost starts at the courier fee until a delivery is organised.
    pub fn delivery(&self, owner_id: Uuid, pharmacy_id: Option<Uuid>) -> Order {
        Order::draft(owner_id, OrderType::Delivery, pharmacy_id, self.tariff.courier_base_cents)
    }

    pub fn pickup(&self, owner_id: Uuid, pharmacy_id: Option<Uuid>) -> Result<Order, OrderError> {
        let pharmacy_id = pharmacy_id.ok_or(OrderError::PickupWithoutPharmacy)?;
        Ok(Order::draft(owner_id, OrderType::Pickup, Some(pharmacy_id), 0))
    }

    pub fn create(
        &self,
        order_type: OrderType,
        owner_id: Uuid,
        pharmacy_id: Option<Uuid>,
    ) -> Result<Order, OrderError> {
        match order_type {
            OrderType::Delivery => Ok(self.delivery(owner_id, pharmacy_id)),
            OrderType::Pickup => self.pickup(owner_id, pharmacy_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;

    #[test]
    fn test_delivery_never_needs_pharmacy() {
        let factory = OrderFactory::default();
        let order = factory.create(OrderType::Delivery, Uuid::new_v4(), None).unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.delivery_cents, 5000);
        assert_eq!(order.total_cents, 5000);
        assert!(order.pharmacy_id.is_none());
    }

    #[test]
    fn test_pickup_requires_pharmacy() {
        let factory = OrderFactory::default();
        let owner = Uuid::new_v4();

        let missing = factory.create(OrderType::Pickup, owner, None);
        assert!(matches!(missing, Err(OrderError::PickupWithoutPharmacy)));

        let pharmacy = Uuid::new_v4();
        let order = factory.pickup(owner, Some(pharmacy)).unwrap();
        assert_eq!(order.pharmacy_id, Some(pharmacy));
        assert_eq!(order.delivery_cents, 0);
    }

    #[test]
    fn test_configured_courier_fee() {
        let tariff = DeliveryTariff { courier_base_cents: 4500, ..Default::default() };
        let order = OrderFactory::new(tariff).delivery(Uuid::new_v4(), None);
        assert_eq!(order.delivery_cents, 4500);
    }
}
