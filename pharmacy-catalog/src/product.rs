use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pharmacy_core::{ErrorClass, StoreError};
use pharmacy_shared::Cents;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Medication categories in the catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MedicationCategory {
    Analgesic,
    Antibiotic,
    Vitamin,
    Antiseptic,
    Cardiovascular,
    Gastrointestinal,
    Dermatological,
    Other,
}

impl MedicationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            MedicationCategory::Analgesic => "analgesic",
            MedicationCategory::Antibiotic => "antibiotic",
            MedicationCategory::Vitamin => "vitamin",
            MedicationCategory::Antiseptic => "antiseptic",
            MedicationCategory::Cardiovascular => "cardiovascular",
            MedicationCategory::Gastrointestinal => "gastrointestinal",
            MedicationCategory::Dermatological => "dermatological",
            MedicationCategory::Other => "other",
        }
    }
}

impl fmt::Display for MedicationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MedicationCategory {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "analgesic" => MedicationCategory::Analgesic,
            "antibiotic" => MedicationCategory::Antibiotic,
            "vitamin" => MedicationCategory::Vitamin,
            "antiseptic" => MedicationCategory::Antiseptic,
            "cardiovascular" => MedicationCategory::Cardiovascular,
            "gastrointestinal" => MedicationCategory::Gastrointestinal,
            "dermatological" => MedicationCategory::Dermatological,
            "other" => MedicationCategory::Other,
            unknown => return Err(CatalogError::UnknownCategory(unknown.to_string())),
        })
    }
}

/// A sellable medication. `price_cents` is the live catalog price; orders
/// copy it onto their line items at add-time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub manufacturer: String,
    pub category: MedicationCategory,
    pub price_cents: Cents,
    pub is_prescription: bool,
    pub active_ingredient: Option<String>,
    pub dosage: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl Medication {
    pub fn new(
        name: impl Into<String>,
        manufacturer: impl Into<String>,
        category: MedicationCategory,
        price_cents: Cents,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            manufacturer: manufacturer.into(),
            category,
            price_cents,
            is_prescription: false,
            active_ingredient: None,
            dosage: None,
            is_available: true,
            created_at: Utc::now(),
        }
    }
}

/// A branch of the pharmacy chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pharmacy {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub working_hours: String,
    pub is_active: bool,
}

impl Pharmacy {
    pub fn new(name: impl Into<String>, address: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            address: address.into(),
            city: city.into(),
            phone: String::new(),
            working_hours: "9:00-21:00".to_string(),
            is_active: true,
        }
    }
}

/// Read access to catalog records
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn medication(&self, id: Uuid) -> Result<Option<Medication>, StoreError>;

    async fn pharmacy(&self, id: Uuid) -> Result<Option<Pharmacy>, StoreError>;

    async fn pharmacies(&self) -> Result<Vec<Pharmacy>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Medication not found: {0}")]
    MedicationNotFound(Uuid),

    #[error("Pharmacy not found: {0}")]
    PharmacyNotFound(Uuid),

    #[error("Unknown medication category: {0}")]
    UnknownCategory(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CatalogError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CatalogError::MedicationNotFound(_) | CatalogError::PharmacyNotFound(_) => {
                ErrorClass::NotFound
            }
            CatalogError::UnknownCategory(_) => ErrorClass::Validation,
            CatalogError::Store(_) => ErrorClass::Internal,
        }
    }
}

/// Catalog lookups that turn missing records into `NotFound` errors.
#[derive(Clone)]
pub struct Catalog {
    repo: Arc<dyn CatalogRepository>,
}

impl Catalog {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    pub async fn medication(&self, id: Uuid) -> Result<Medication, CatalogError> {
        self.repo
            .medication(id)
            .await?
            .ok_or(CatalogError::MedicationNotFound(id))
    }

    pub async fn pharmacy(&self, id: Uuid) -> Result<Pharmacy, CatalogError> {
        self.repo
            .pharmacy(id)
            .await?
            .ok_or(CatalogError::PharmacyNotFound(id))
    }

    pub async fn pharmacies(&self) -> Result<Vec<Pharmacy>, CatalogError> {
        Ok(self.repo.pharmacies().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StaticCatalog {
        medications: HashMap<Uuid, Medication>,
    }

    #[async_trait]
    impl CatalogRepository for StaticCatalog {
        async fn medication(&self, id: Uuid) -> Result<Option<Medication>, StoreError> {
            Ok(self.medications.get(&id).cloned())
        }

        async fn pharmacy(&self, _id: Uuid) -> Result<Option<Pharmacy>, StoreError> {
            Ok(None)
        }

        async fn pharmacies(&self) -> Result<Vec<Pharmacy>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_category_codes() {
        for category in [
            MedicationCategory::Analgesic,
            MedicationCategory::Vitamin,
            MedicationCategory::Other,
        ] {
            assert_eq!(category.as_str().parse::<MedicationCategory>().unwrap(), category);
        }
        assert!(matches!(
            "homeopathy".parse::<MedicationCategory>(),
            Err(CatalogError::UnknownCategory(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_records_are_not_found() {
        let aspirin = Medication::new("Aspirin", "Bayer", MedicationCategory::Analgesic, 4550);
        let aspirin_id = aspirin.id;
        let catalog = Catalog::new(Arc::new(StaticCatalog {
            medications: HashMap::from([(aspirin_id, aspirin)]),
        }));

        assert_eq!(catalog.medication(aspirin_id).await.unwrap().price_cents, 4550);

        let err = catalog.pharmacy(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::NotFound);
    }
}
