use pharmacy_catalog::{MedicationAvailability, PharmacyStockLevel};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::state::AppState;

/// Units of one medication in one pharmacy. Unknown ids are `NotFound`.
pub async fn check_medication(
    state: &AppState,
    pharmacy_id: Uuid,
    medication_id: Uuid,
) -> Result<PharmacyStockLevel, ServiceError> {
    state.catalog.pharmacy(pharmacy_id).await?;
    state.catalog.medication(medication_id).await?;
    Ok(state.stock.check_medication(pharmacy_id, medication_id).await?)
}

pub async fn medication_availability(
    state: &AppState,
    medication_id: Uuid,
) -> Result<MedicationAvailability, ServiceError> {
    state.catalog.medication(medication_id).await?;
    Ok(state.stock.availability(medication_id).await?)
}
