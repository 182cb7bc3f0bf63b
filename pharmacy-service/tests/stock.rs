mod common;

use common::TestApp;
use pharmacy_core::ErrorClass;
use pharmacy_service::stock;
use uuid::Uuid;

#[tokio::test]
async fn test_check_medication_in_pharmacy() {
    let app = TestApp::start().await;
    let pharmacy = app.pharmacy_id();
    let aspirin = app.medication_id("Aspirin");

    let level = stock::check_medication(&app.state, pharmacy, aspirin).await.unwrap();
    assert!(level.available);
    assert!(level.quantity >= 5);

    app.state.repos.admin.set_stock(pharmacy, aspirin, 0).await.unwrap();
    let level = stock::check_medication(&app.state, pharmacy, aspirin).await.unwrap();
    assert!(!level.available);
    assert_eq!(level.quantity, 0);

    let err = stock::check_medication(&app.state, Uuid::new_v4(), aspirin).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
}

#[tokio::test]
async fn test_availability_across_pharmacies() {
    let app = TestApp::start().await;
    let iodine = app.medication_id("Iodine");
    let pharmacies: Vec<Uuid> = app.demo.pharmacies.iter().map(|p| p.id).collect();

    app.state.repos.admin.set_stock(pharmacies[0], iodine, 0).await.unwrap();
    app.state.repos.admin.set_stock(pharmacies[1], iodine, 7).await.unwrap();
    app.state.repos.admin.set_stock(pharmacies[2], iodine, 3).await.unwrap();

    let availability = stock::medication_availability(&app.state, iodine).await.unwrap();
    assert_eq!(availability.total_quantity, 10);
    assert!(availability.in_stock);
    assert_eq!(availability.pharmacies.len(), 2);
    assert!(availability.pharmacies.iter().all(|level| level.pharmacy_id != pharmacies[0]));

    let err = stock::medication_availability(&app.state, Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
}
