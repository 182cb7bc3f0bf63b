use pharmacy_shared::money::{cents, percent_of};
use pharmacy_shared::Cents;
use serde::{Deserialize, Serialize};

/// Anything that contributes `unit_price × quantity` to a subtotal.
pub trait Priced {
    /// Price frozen when the line was created, never the live catalog price.
    fn unit_price_cents(&self) -> Cents;

    fn quantity(&self) -> u32;

    fn line_total_cents(&self) -> Cents {
        self.unit_price_cents() * Cents::from(self.quantity())
    }
}

impl Priced for (Cents, u32) {
    fn unit_price_cents(&self) -> Cents {
        self.0
    }

    fn quantity(&self) -> u32 {
        self.1
    }
}

/// Result of a pricing pass over an order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PriceBreakdown {
    pub subtotal_cents: Cents,
    pub discount_cents: Cents,
    pub delivery_cents: Cents,
    pub total_cents: Cents,
}

/// Order pricing. Stateless: call it again after every change to the line
/// items or to the delivery cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine;

impl PricingEngine {
    pub fn compute<P: Priced>(
        line_items: &[P],
        discount_percent: u32,
        delivery_cents: Cents,
    ) -> PriceBreakdown {
        let subtotal_cents: Cents = line_items.iter().map(Priced::line_total_cents).sum();
        let discount_cents = percent_of(subtotal_cents, discount_percent);

        PriceBreakdown {
            subtotal_cents,
            discount_cents,
            delivery_cents,
            total_cents: subtotal_cents - discount_cents + delivery_cents,
        }
    }
}

/// Delivery fees. Defaults match the chain's published tariff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryTariff {
    /// Courier fee, also the default cost of a fresh delivery order.
    pub courier_base_cents: Cents,

    pub express_base_cents: Cents,

    /// Courier orders with a subtotal strictly above this pay a reduced fee.
    pub large_order_threshold_cents: Cents,

    /// Share of the courier fee charged for large orders.
    pub large_order_courier_percent: u32,

    /// Express discount for premium card holders.
    pub express_premium_discount_percent: u32,
}

impl Default for DeliveryTariff {
    fn default() -> Self {
        Self {
            courier_base_cents: cents(50, 0),
            express_base_cents: cents(100, 0),
            large_order_threshold_cents: cents(500, 0),
            large_order_courier_percent: 50,
            express_premium_discount_percent: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premium_basket() {
        // Aspirin 45.50 x2 + Vitamin C 85.00 x1, premium card, courier waived
        let items = [(cents(45, 50), 2), (cents(85, 0), 1)];
        let breakdown = PricingEngine::compute(&items, 10, 0);

        assert_eq!(breakdown.subtotal_cents, 17600);
        assert_eq!(breakdown.discount_cents, 1760);
        assert_eq!(breakdown.delivery_cents, 0);
        assert_eq!(breakdown.total_cents, 15840);
    }

    #[test]
    fn test_total_invariant_across_tiers() {
        let items = [(cents(12, 99), 3), (cents(7, 15), 4)];
        for percent in [0, 5, 10] {
            for delivery in [0, cents(50, 0)] {
                let b = PricingEngine::compute(&items, percent, delivery);
                assert_eq!(b.subtotal_cents, 3897 + 2860);
                assert_eq!(b.discount_cents, b.subtotal_cents * percent as i64 / 100);
                assert_eq!(b.total_cents, b.subtotal_cents - b.discount_cents + delivery);
            }
        }
    }

    #[test]
    fn test_discount_truncates_toward_zero() {
        // 5% of 10.99 is 0.5495
        let b = PricingEngine::compute(&[(1099, 1)], 5, 0);
        assert_eq!(b.discount_cents, 54);
        assert_eq!(b.total_cents, 1045);
    }

    #[test]
    fn test_empty_items() {
        let items: [(Cents, u32); 0] = [];
        let b = PricingEngine::compute(&items, 10, 5000);
        assert_eq!(b.subtotal_cents, 0);
        assert_eq!(b.total_cents, 5000);
    }
}
