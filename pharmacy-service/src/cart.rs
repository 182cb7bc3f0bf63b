use pharmacy_order::{Cart, CartView, CheckoutRequest, Order, RepeatOutcome};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::state::AppState;

pub async fn add_to_cart(state: &AppState, owner_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart, ServiceError> {
    Ok(state.carts.add_item(owner_id, product_id, quantity).await?)
}

pub async fn remove_from_cart(state: &AppState, owner_id: Uuid, product_id: Uuid) -> Result<Cart, ServiceError> {
    Ok(state.carts.remove_item(owner_id, product_id).await?)
}

pub async fn clear_cart(state: &AppState, owner_id: Uuid) -> Result<(), ServiceError> {
    Ok(state.carts.clear(owner_id).await?)
}

pub async fn view_cart(state: &AppState, owner_id: Uuid) -> Result<CartView, ServiceError> {
    Ok(state.carts.view(owner_id).await?)
}

/// The cart is emptied only when an order comes out.
pub async fn checkout(state: &AppState, owner_id: Uuid, request: CheckoutRequest) -> Result<Order, ServiceError> {
    Ok(state.carts.checkout(owner_id, request).await?)
}

pub async fn repeat_order(state: &AppState, owner_id: Uuid, order_id: Uuid) -> Result<RepeatOutcome, ServiceError> {
    Ok(state.carts.repeat_order(owner_id, order_id).await?)
}
