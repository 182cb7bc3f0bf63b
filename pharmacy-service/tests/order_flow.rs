mod common;

use common::TestApp;
use pharmacy_core::ErrorClass;
use pharmacy_order::{CheckoutRequest, DeliveryMethod, OrderStatus, OrderType, PaymentMethod, PaymentStatus, RepeatOutcome};
use pharmacy_service::orders::{self, BuildOrderRequest, OrderItemRequest};
use pharmacy_service::payments::{self, DeliveryRequest, PaymentRequest};
use pharmacy_service::{cart, ServiceError};
use uuid::Uuid;

fn items(list: &[(Uuid, u32)]) -> Vec<OrderItemRequest> {
    list.iter()
        .map(|(product_id, quantity)| OrderItemRequest { product_id: *product_id, quantity: *quantity })
        .collect()
}

fn delivery_request(list: &[(Uuid, u32)]) -> BuildOrderRequest {
    BuildOrderRequest {
        order_type: Some(OrderType::Delivery),
        items: items(list),
        delivery_address: Some("Shevchenka St, 10".into()),
        ..Default::default()
    }
}

fn courier() -> DeliveryRequest {
    DeliveryRequest::Courier { address: "Shevchenka St, 10".into(), delivery_time: None }
}

fn card() -> PaymentRequest {
    PaymentRequest::Card {
        card_number: "4111 1111 1111 1111".into(),
        card_holder: "MARIA KOVAL".into(),
        cvv: "123".into(),
        expiry_date: "12/27".into(),
    }
}

#[tokio::test]
async fn test_premium_courier_order_totals() {
    let app = TestApp::start().await;
    let basket = [(app.medication_id("Aspirin"), 2), (app.medication_id("Vitamin C"), 1)];

    let order = orders::build_order(&app.state, app.maria().id, delivery_request(&basket)).await.unwrap();
    assert_eq!(order.subtotal_cents, 17_600);
    assert_eq!(order.discount_cents, 1_760);
    // Courier base fee until a delivery is organised.
    assert_eq!(order.delivery_cents, 5_000);
    assert_eq!(order.total_cents, order.subtotal_cents - order.discount_cents + order.delivery_cents);

    let delivery = payments::open_delivery(&app.state, order.id, DeliveryMethod::Courier).await.unwrap();
    let result = payments::organize_delivery(&app.state, delivery.id, courier()).await.unwrap();
    assert_eq!(result.cost_cents, 0);
    assert_eq!(result.estimated_time, "2-3 hours");

    let order = orders::get_order(&app.state, app.maria().id, order.id).await.unwrap();
    assert_eq!(order.delivery_cents, 0);
    assert_eq!(order.total_cents, 15_840);
}

#[tokio::test]
async fn test_tier_discounts() {
    let app = TestApp::start().await;
    let basket = [(app.medication_id("Aspirin"), 2)];

    let standard = orders::build_order(&app.state, app.ivan().id, delivery_request(&basket)).await.unwrap();
    assert_eq!(standard.discount_cents, 0);

    let social = orders::build_order(&app.state, app.olga().id, delivery_request(&basket)).await.unwrap();
    assert_eq!(social.subtotal_cents, 9_100);
    assert_eq!(social.discount_cents, 455);
    assert_eq!(social.total_cents, 9_100 - 455 + 5_000);
}

#[tokio::test]
async fn test_courier_and_express_pricing() {
    let app = TestApp::start().await;

    // 700.00 subtotal, standard card: half the courier fee
    let big = [(app.medication_id("Vitamin D3"), 2)];
    let order = orders::build_order(&app.state, app.ivan().id, delivery_request(&big)).await.unwrap();
    let delivery = payments::open_delivery(&app.state, order.id, DeliveryMethod::Courier).await.unwrap();
    let result = payments::organize_delivery(&app.state, delivery.id, courier()).await.unwrap();
    assert_eq!(result.cost_cents, 2_500);

    // exactly at the threshold is not a large order
    let edge = [(app.medication_id("Paracetamol"), 20)];
    let order = orders::build_order(&app.state, app.ivan().id, delivery_request(&edge)).await.unwrap();
    assert_eq!(order.subtotal_cents, 50_000);
    let delivery = payments::open_delivery(&app.state, order.id, DeliveryMethod::Courier).await.unwrap();
    let result = payments::organize_delivery(&app.state, delivery.id, courier()).await.unwrap();
    assert_eq!(result.cost_cents, 5_000);

    let small = [(app.medication_id("Iodine"), 1)];
    let order = orders::build_order(&app.state, app.maria().id, delivery_request(&small)).await.unwrap();
    let delivery = payments::open_delivery(&app.state, order.id, DeliveryMethod::Express).await.unwrap();
    let result = payments::organize_delivery(
        &app.state,
        delivery.id,
        DeliveryRequest::Express { address: "Shevchenka St, 10".into() },
    )
    .await
    .unwrap();
    assert_eq!(result.cost_cents, 8_000);
    assert_eq!(result.estimated_time, "60 minutes");

    let order = orders::get_order(&app.state, app.maria().id, order.id).await.unwrap();
    assert_eq!(order.total_cents, 1_550 - 155 + 8_000);
}

#[tokio::test]
async fn test_build_validation() {
    let app = TestApp::start().await;
    let aspirin = app.medication_id("Aspirin");

    let pickup_without_pharmacy = BuildOrderRequest {
        order_type: Some(OrderType::Pickup),
        items: items(&[(aspirin, 1)]),
        ..Default::default()
    };
    let err = orders::build_order(&app.state, app.ivan().id, pickup_without_pharmacy).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);

    // delivery never needs a pharmacy
    let order = orders::build_order(&app.state, app.ivan().id, delivery_request(&[(aspirin, 1)])).await.unwrap();
    assert!(order.pharmacy_id.is_none());

    let no_items = BuildOrderRequest {
        order_type: Some(OrderType::Pickup),
        pharmacy_id: Some(app.pharmacy_id()),
        payment_method: Some(PaymentMethod::Card),
        ..Default::default()
    };
    let err = orders::build_order(&app.state, app.ivan().id, no_items).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let no_type = BuildOrderRequest { items: items(&[(aspirin, 1)]), ..Default::default() };
    let err = orders::build_order(&app.state, app.ivan().id, no_type).await.unwrap_err();
    assert_eq!(err.to_string(), "Order type must be selected");

    let unknown = delivery_request(&[(Uuid::new_v4(), 1)]);
    let err = orders::build_order(&app.state, app.ivan().id, unknown).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);

    assert!(orders::my_orders(&app.state, app.ivan().id).await.unwrap().len() == 1);
}

#[tokio::test]
async fn test_checkout_clears_cart_only_on_success() {
    let app = TestApp::start().await;
    let owner = app.ivan().id;
    let aspirin = app.medication_id("Aspirin");

    let err = cart::checkout(&app.state, owner, CheckoutRequest::delivery("Shevchenka St, 10")).await.unwrap_err();
    assert_eq!(err.to_string(), "Cart is empty");

    cart::add_to_cart(&app.state, owner, aspirin, 1).await.unwrap();
    let merged = cart::add_to_cart(&app.state, owner, aspirin, 2).await.unwrap();
    assert_eq!(merged.quantity_of(aspirin), 3);

    let mut bad = CheckoutRequest::delivery("Shevchenka St, 10");
    bad.order_type = OrderType::Pickup;
    assert!(cart::checkout(&app.state, owner, bad).await.is_err());
    assert_eq!(cart::view_cart(&app.state, owner).await.unwrap().items_count, 3);

    let order = cart::checkout(&app.state, owner, CheckoutRequest::pickup(app.pharmacy_id())).await.unwrap();
    assert_eq!(order.subtotal_cents, 13_650);
    assert_eq!(order.delivery_cents, 0);
    assert!(cart::view_cart(&app.state, owner).await.unwrap().lines.is_empty());
}

#[tokio::test]
async fn test_cart_view_and_remove() {
    let app = TestApp::start().await;
    let owner = app.olga().id;
    let aspirin = app.medication_id("Aspirin");
    let iodine = app.medication_id("Iodine");

    cart::add_to_cart(&app.state, owner, aspirin, 2).await.unwrap();
    cart::add_to_cart(&app.state, owner, iodine, 1).await.unwrap();
    let view = cart::view_cart(&app.state, owner).await.unwrap();
    assert_eq!(view.total_cents, 9_100 + 1_550);
    assert_eq!(view.items_count, 3);

    cart::remove_from_cart(&app.state, owner, aspirin).await.unwrap();
    let view = cart::view_cart(&app.state, owner).await.unwrap();
    assert_eq!(view.lines.len(), 1);

    let err = cart::add_to_cart(&app.state, owner, iodine, 0).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);
    let err = cart::add_to_cart(&app.state, owner, Uuid::new_v4(), 1).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);

    cart::clear_cart(&app.state, owner).await.unwrap();
    assert!(cart::view_cart(&app.state, owner).await.unwrap().lines.is_empty());
}

#[tokio::test]
async fn test_terminal_orders_reject_transitions() {
    let app = TestApp::start().await;
    let basket = [(app.medication_id("Aspirin"), 1)];

    let order = orders::build_order(&app.state, app.ivan().id, delivery_request(&basket)).await.unwrap();
    orders::transition_status(&app.state, order.id, OrderStatus::Completed).await.unwrap();
    for status in [OrderStatus::Pending, OrderStatus::Completed, OrderStatus::Cancelled] {
        let err = orders::transition_status(&app.state, order.id, status).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::TerminalState);
    }

    let order = orders::build_order(&app.state, app.ivan().id, delivery_request(&basket)).await.unwrap();
    orders::cancel_order(&app.state, app.ivan().id, order.id).await.unwrap();
    let err = orders::cancel_order(&app.state, app.ivan().id, order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::TerminalState(_)));
    let err = payments::open_payment(&app.state, order.id, PaymentMethod::Cash).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::TerminalState);
}

#[tokio::test]
async fn test_orders_are_private_to_owner() {
    let app = TestApp::start().await;
    let basket = [(app.medication_id("Aspirin"), 1)];
    let order = orders::build_order(&app.state, app.ivan().id, delivery_request(&basket)).await.unwrap();

    let err = orders::get_order(&app.state, app.olga().id, order.id).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
    let err = orders::cancel_order(&app.state, app.olga().id, order.id).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
    let err = cart::repeat_order(&app.state, app.olga().id, order.id).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);

    let still_pending = orders::get_order(&app.state, app.ivan().id, order.id).await.unwrap();
    assert_eq!(still_pending.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_repeat_order() {
    let app = TestApp::start().await;
    let owner = app.ivan().id;
    let aspirin = app.medication_id("Aspirin");
    let amoxicillin = app.medication_id("Amoxicillin");
    let basket = [(aspirin, 2), (amoxicillin, 1)];
    let order = orders::build_order(&app.state, owner, delivery_request(&basket)).await.unwrap();

    // The count is units in the cart, not distinct products.
    let outcome = cart::repeat_order(&app.state, owner, order.id).await.unwrap();
    assert_eq!(outcome, RepeatOutcome::Added { cart_items_count: 3 });
    let again = cart::repeat_order(&app.state, owner, order.id).await.unwrap();
    assert_eq!(again, RepeatOutcome::Added { cart_items_count: 6 });
    assert_eq!(cart::view_cart(&app.state, owner).await.unwrap().items_count, 6);

    cart::clear_cart(&app.state, owner).await.unwrap();
    for pharmacy in &app.demo.pharmacies {
        app.state.repos.admin.set_stock(pharmacy.id, amoxicillin, 0).await.unwrap();
        app.state.repos.admin.set_stock(pharmacy.id, aspirin, 0).await.unwrap();
    }

    let outcome = cart::repeat_order(&app.state, owner, order.id).await.unwrap();
    assert_eq!(
        outcome,
        RepeatOutcome::Unavailable { names: vec!["Aspirin".to_string(), "Amoxicillin".to_string()] }
    );
    assert!(cart::view_cart(&app.state, owner).await.unwrap().lines.is_empty());
}

#[tokio::test]
async fn test_bonus_award_for_completed_order() {
    let app = TestApp::start().await;
    let maria = app.maria().id;
    let basket = [(app.medication_id("Aspirin"), 2), (app.medication_id("Vitamin C"), 1)];

    let order = orders::build_order(&app.state, maria, delivery_request(&basket)).await.unwrap();
    let delivery = payments::open_delivery(&app.state, order.id, DeliveryMethod::Courier).await.unwrap();
    payments::organize_delivery(&app.state, delivery.id, courier()).await.unwrap();

    let err = orders::award_bonus(&app.state, order.id).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);

    for status in [OrderStatus::Confirmed, OrderStatus::InDelivery, OrderStatus::Completed] {
        orders::transition_status(&app.state, order.id, status).await.unwrap();
    }
    // Completing alone does not credit anything.
    assert_eq!(orders::bonus_info(&app.state, maria).await.unwrap().bonus_points, 500);

    let award = orders::award_bonus(&app.state, order.id).await.unwrap();
    assert_eq!(award.points, 158);
    assert_eq!(award.balance, 500 + 158);

    let info = orders::bonus_info(&app.state, maria).await.unwrap();
    assert_eq!(info.bonus_points, 500 + 158);
    assert_eq!(info.discount_percent, 10);
    assert_eq!(info.orders_count, 1);
    assert_eq!(info.total_spent_cents, 15_840);
}

#[tokio::test]
async fn test_payment_flow() {
    let app = TestApp::start().await;
    let basket = [(app.medication_id("Aspirin"), 1)];
    let order = orders::build_order(&app.state, app.maria().id, delivery_request(&basket)).await.unwrap();

    let payment = payments::open_payment(&app.state, order.id, PaymentMethod::Card).await.unwrap();
    assert_eq!(payment.amount_cents, order.total_cents);
    assert!(payments::open_payment(&app.state, order.id, PaymentMethod::Card).await.is_err());

    let err = payments::process_payment(&app.state, payment.id, PaymentRequest::Cash { location: None })
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);

    let declined = PaymentRequest::Card {
        card_number: "4111 1111 1111 1111".into(),
        card_holder: "MARIA KOVAL".into(),
        cvv: "12".into(),
        expiry_date: "12/27".into(),
    };
    let result = payments::process_payment(&app.state, payment.id, declined).await.unwrap();
    assert!(!result.success);
    assert_eq!(result.message, "Invalid CVV code");
    let stored = app.state.payments.get_payment(payment.id).await.unwrap();
    assert_eq!(stored.status, PaymentStatus::Failed);

    let result = payments::process_payment(&app.state, payment.id, card()).await.unwrap();
    assert!(result.success);
    let transaction_id = result.transaction_id.unwrap();
    assert_eq!(transaction_id.len(), 12);
    assert_eq!(result.extra["details"], "**** **** **** 1111");

    let order = orders::get_order(&app.state, app.maria().id, order.id).await.unwrap();
    assert!(order.is_paid);

    let err = payments::process_payment(&app.state, payment.id, card()).await.unwrap_err();
    assert_eq!(err.to_string(), "Payment has already been completed");
}

#[tokio::test]
async fn test_pickup_delivery_needs_open_pharmacy() {
    let app = TestApp::start().await;
    let basket = [(app.medication_id("Aspirin"), 1)];
    let request = BuildOrderRequest {
        order_type: Some(OrderType::Pickup),
        pharmacy_id: Some(app.pharmacy_id()),
        items: items(&basket),
        ..Default::default()
    };
    let order = orders::build_order(&app.state, app.ivan().id, request).await.unwrap();
    assert_eq!(order.delivery_cents, 0);

    let delivery = payments::open_delivery(&app.state, order.id, DeliveryMethod::Pickup).await.unwrap();
    let err = payments::organize_delivery(&app.state, delivery.id, courier()).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);

    let result = payments::organize_delivery(
        &app.state,
        delivery.id,
        DeliveryRequest::Pickup { pharmacy_id: app.pharmacy_id() },
    )
    .await
    .unwrap();
    assert_eq!(result.cost_cents, 0);
    assert_eq!(result.estimated_time, "30 minutes");

    let err = payments::organize_delivery(
        &app.state,
        delivery.id,
        DeliveryRequest::Pickup { pharmacy_id: Uuid::new_v4() },
    )
    .await
    .unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
}
