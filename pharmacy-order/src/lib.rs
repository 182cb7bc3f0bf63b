pub mod error;
pub mod models;
pub mod repository;
pub mod factory;
pub mod lifecycle;
pub mod builder;
pub mod payment;
pub mod delivery;
pub mod cart;

pub use error::OrderError;
pub use models::{LineItem, Order, OrderStatus, OrderType};
pub use repository::{
    CartRepository, DeliveryRepository, OrderRepository, OrderTotals, PaymentRepository,
    PaymentSettlement, StatusWrite,
};
pub use factory::OrderFactory;
pub use lifecycle::{BonusAward, OrderLifecycle};
pub use builder::{BuildContext, OrderBuilder};
pub use payment::{
    Payment, PaymentMethod, PaymentProcessor, PaymentRejection, PaymentResult, PaymentStatus,
    PaymentStrategy,
};
pub use delivery::{
    Delivery, DeliveryCoordinator, DeliveryMethod, DeliveryResult, DeliveryStatus, DeliveryStrategy,
};
pub use cart::{Cart, CartLine, CartService, CartView, CartViewLine, CheckoutRequest, RepeatOutcome};
