use anyhow::{anyhow, Context};
use pharmacy_order::{CheckoutRequest, DeliveryMethod, OrderStatus, OrderType, PaymentMethod};
use pharmacy_service::orders::{BuildOrderRequest, OrderItemRequest};
use pharmacy_service::payments::{DeliveryRequest, PaymentRequest};
use pharmacy_service::seed::{seed_demo_data, DemoData};
use pharmacy_service::{cart, orders, payments, AppState};
use pharmacy_shared::money::format_cents;
use pharmacy_store::app_config::Config;
use pharmacy_store::{DbClient, Repositories};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pharmacy_service=debug,pharmacy_order=debug,pharmacy_notify=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;

    let repos = match &config.database.url {
        Some(url) => {
            tracing::info!("Using Postgres store");
            let db = DbClient::new(url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Repositories::postgres(db.pool.clone())
        }
        None => {
            tracing::info!("No database url configured, using in-memory store");
            Repositories::in_memory()
        }
    };

    let Some(demo) = seed_demo_data(repos.admin.as_ref()).await? else {
        tracing::info!("Demo data already present, nothing to run");
        return Ok(());
    };

    let state = AppState::new(repos, &config);
    run_demo(&state, &demo).await
}

/// Premium customer, courier delivery: 45.50 x 2 + 85.00 with 10% off and
/// free courier comes to 158.40.
async fn run_demo(state: &AppState, demo: &DemoData) -> anyhow::Result<()> {
    let maria = demo.account("maria_koval").ok_or_else(|| anyhow!("demo account missing"))?;
    let aspirin = demo.medication("Aspirin").ok_or_else(|| anyhow!("demo medication missing"))?;
    let vitamin_c = demo.medication("Vitamin C").ok_or_else(|| anyhow!("demo medication missing"))?;

    let order = orders::build_order(
        state,
        maria.id,
        BuildOrderRequest {
            order_type: Some(OrderType::Delivery),
            items: vec![
                OrderItemRequest { product_id: aspirin.id, quantity: 2 },
                OrderItemRequest { product_id: vitamin_c.id, quantity: 1 },
            ],
            delivery_address: Some("Shevchenka St, 10, apt 5".into()),
            payment_method: Some(PaymentMethod::Card),
            comment: Some("Deliver before 18:00".into()),
            ..Default::default()
        },
    )
    .await?;

    let delivery = payments::open_delivery(state, order.id, DeliveryMethod::Courier).await?;
    payments::organize_delivery(
        state,
        delivery.id,
        DeliveryRequest::Courier { address: "Shevchenka St, 10, apt 5".into(), delivery_time: None },
    )
    .await?;

    let order = orders::get_order(state, maria.id, order.id).await?;
    tracing::info!(
        order_id = %order.id,
        subtotal = %format_cents(order.subtotal_cents),
        discount = %format_cents(order.discount_cents),
        delivery = %format_cents(order.delivery_cents),
        total = %format_cents(order.total_cents),
        "demo order priced"
    );

    let payment = payments::open_payment(state, order.id, PaymentMethod::Card).await?;
    let result = payments::process_payment(
        state,
        payment.id,
        PaymentRequest::Card {
            card_number: "4111 1111 1111 1111".into(),
            card_holder: "MARIA KOVAL".into(),
            cvv: "123".into(),
            expiry_date: "12/27".into(),
        },
    )
    .await?;
    tracing::info!(success = result.success, "{}", result.message);

    for status in [OrderStatus::Confirmed, OrderStatus::InDelivery, OrderStatus::Completed] {
        orders::transition_status(state, order.id, status).await?;
    }
    let award = orders::award_bonus(state, order.id).await?;
    tracing::info!(points = award.points, "bonus awarded");
    let bonus = orders::bonus_info(state, maria.id).await?;
    tracing::info!(points = bonus.bonus_points, spent = %format_cents(bonus.total_spent_cents), "bonus balance");

    // Same basket again, this time through the cart.
    cart::repeat_order(state, maria.id, order.id).await?;
    let pickup_from = demo.pharmacies.first().ok_or_else(|| anyhow!("demo pharmacy missing"))?;
    let second = cart::checkout(state, maria.id, CheckoutRequest::pickup(pickup_from.id)).await?;
    tracing::info!(order_id = %second.id, total = %format_cents(second.total_cents), "pickup order placed");

    Ok(())
}
