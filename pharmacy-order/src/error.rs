use pharmacy_catalog::CatalogError;
use pharmacy_core::{CoreError, ErrorClass, StoreError};
use uuid::Uuid;

use crate::models::OrderStatus;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order type must be selected")]
    MissingOrderType,

    #[error("Order must contain at least one item")]
    NoItems,

    #[error("A pharmacy must be selected for pickup")]
    PickupWithoutPharmacy,

    #[error("Quantity of {0} must be at least 1")]
    InvalidQuantity(Uuid),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("{0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Payment not found: {0}")]
    PaymentNotFound(Uuid),

    #[error("Delivery not found: {0}")]
    DeliveryNotFound(Uuid),

    #[error("Cannot modify an order that is already {0}")]
    TerminalState(OrderStatus),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrderError {
    pub fn class(&self) -> ErrorClass {
        match self {
            OrderError::MissingOrderType
            | OrderError::NoItems
            | OrderError::PickupWithoutPharmacy
            | OrderError::InvalidQuantity(_)
            | OrderError::EmptyCart
            | OrderError::Validation(_) => ErrorClass::Validation,
            OrderError::NotFound(_)
            | OrderError::PaymentNotFound(_)
            | OrderError::DeliveryNotFound(_) => ErrorClass::NotFound,
            OrderError::TerminalState(_) => ErrorClass::TerminalState,
            OrderError::Catalog(e) => e.class(),
            OrderError::Core(e) => e.class(),
            OrderError::Store(_) => ErrorClass::Internal,
        }
    }
}
