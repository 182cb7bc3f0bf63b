use pharmacy_order::{
    Delivery, DeliveryMethod, DeliveryResult, DeliveryStrategy, Payment, PaymentMethod, PaymentResult,
    PaymentStrategy,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::state::AppState;

/// Payment parameters as they arrive from a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentRequest {
    Card {
        card_number: String,
        card_holder: String,
        cvv: String,
        expiry_date: String,
    },
    Cash {
        location: Option<String>,
    },
    Online {
        provider: String,
    },
}

impl PaymentRequest {
    pub fn into_strategy(self) -> PaymentStrategy {
        match self {
            PaymentRequest::Card { card_number, card_holder, cvv, expiry_date } => {
                PaymentStrategy::card(&card_number, &card_holder, &cvv, &expiry_date)
            }
            PaymentRequest::Cash { location } => PaymentStrategy::Cash { location },
            PaymentRequest::Online { provider } => PaymentStrategy::Online { provider },
        }
    }
}

/// Delivery parameters. Pickup names the pharmacy; it is looked up here.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DeliveryRequest {
    Courier {
        address: String,
        delivery_time: Option<String>,
    },
    Express {
        address: String,
    },
    Pickup {
        pharmacy_id: Uuid,
    },
}

pub async fn open_payment(state: &AppState, order_id: Uuid, method: PaymentMethod) -> Result<Payment, ServiceError> {
    Ok(state.payments.open_payment(order_id, method).await?)
}

/// A declined payment is `Ok` with `success: false`.
pub async fn process_payment(
    state: &AppState,
    payment_id: Uuid,
    request: PaymentRequest,
) -> Result<PaymentResult, ServiceError> {
    let strategy = request.into_strategy();
    Ok(state.payments.process_payment(payment_id, &strategy).await?)
}

pub async fn open_delivery(state: &AppState, order_id: Uuid, method: DeliveryMethod) -> Result<Delivery, ServiceError> {
    Ok(state.deliveries.open_delivery(order_id, method).await?)
}

pub async fn organize_delivery(
    state: &AppState,
    delivery_id: Uuid,
    request: DeliveryRequest,
) -> Result<DeliveryResult, ServiceError> {
    let strategy = match request {
        DeliveryRequest::Courier { address, delivery_time } => DeliveryStrategy::Courier { address, delivery_time },
        DeliveryRequest::Express { address } => DeliveryStrategy::Express { address },
        DeliveryRequest::Pickup { pharmacy_id } => DeliveryStrategy::SelfPickup {
            pharmacy: state.catalog.pharmacy(pharmacy_id).await?,
        },
    };
    Ok(state.deliveries.organize_delivery(delivery_id, &strategy).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payment_request_from_json() {
        let request: PaymentRequest = serde_json::from_value(json!({
            "method": "card",
            "card_number": "4111 1111 1111 1111",
            "card_holder": "IVAN PETROV",
            "cvv": "123",
            "expiry_date": "12/27"
        }))
        .unwrap();
        let strategy = request.into_strategy();
        assert_eq!(strategy.method(), PaymentMethod::Card);
        assert!(strategy.validate().is_ok());

        let request: PaymentRequest = serde_json::from_value(json!({ "method": "cash" })).unwrap();
        assert_eq!(request.into_strategy(), PaymentStrategy::Cash { location: None });
    }

    #[test]
    fn test_delivery_request_from_json() {
        let request: DeliveryRequest =
            serde_json::from_value(json!({ "method": "express", "address": "Kyiv, Khreshchatyk 1" })).unwrap();
        assert!(matches!(request, DeliveryRequest::Express { .. }));
        assert!(serde_json::from_value::<DeliveryRequest>(json!({ "method": "drone" })).is_err());
    }
}
