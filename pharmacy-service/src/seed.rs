use pharmacy_catalog::{Medication, MedicationCategory, Pharmacy};
use pharmacy_core::{Account, CardTier, StoreError};
use pharmacy_shared::money::cents;
use pharmacy_store::StoreAdmin;
use tracing::info;

/// Records written by [`seed_demo_data`].
#[derive(Debug, Clone)]
pub struct DemoData {
    /// Standard, premium and social card holders, in that order.
    pub accounts: Vec<Account>,
    pub medications: Vec<Medication>,
    pub pharmacies: Vec<Pharmacy>,
}

impl DemoData {
    pub fn account(&self, username: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.username == username)
    }

    pub fn medication(&self, name: &str) -> Option<&Medication> {
        self.medications.iter().find(|m| m.name == name)
    }
}

fn account(username: &str, email: &str, phone: &str, tier: CardTier, bonus_points: i64, sms: bool) -> Account {
    let mut account = Account::new(username, email, tier);
    account.phone = Some(phone.to_string());
    account.bonus_points = bonus_points;
    account.sms_notifications = sms;
    account
}

#[allow(clippy::too_many_arguments)]
fn medication(
    name: &str,
    manufacturer: &str,
    category: MedicationCategory,
    price_cents: i64,
    prescription: bool,
    ingredient: &str,
    dosage: &str,
    description: &str,
) -> Medication {
    let mut medication = Medication::new(name, manufacturer, category, price_cents);
    medication.is_prescription = prescription;
    medication.active_ingredient = Some(ingredient.to_string());
    medication.dosage = Some(dosage.to_string());
    medication.description = Some(description.to_string());
    medication
}

fn pharmacy(name: &str, address: &str, phone: &str, hours: &str) -> Pharmacy {
    let mut pharmacy = Pharmacy::new(name, address, "Lviv");
    pharmacy.phone = phone.to_string();
    pharmacy.working_hours = hours.to_string();
    pharmacy
}

pub fn demo_data() -> DemoData {
    use MedicationCategory::*;

    DemoData {
        accounts: vec![
            account("ivan_petrov", "ivan@example.com", "+380671234567", CardTier::Standard, 100, true),
            account("maria_koval", "maria@example.com", "+380672345678", CardTier::Premium, 500, false),
            account("olga_shevchenko", "olga@example.com", "+380673456789", CardTier::Social, 50, true),
        ],
        medications: vec![
            medication("Aspirin", "Bayer", Analgesic, cents(45, 50), false, "Acetylsalicylic acid", "500 mg", "Pain and fever relief"),
            medication("Paracetamol", "Darnytsia", Analgesic, cents(25, 0), false, "Paracetamol", "500 mg", "Fever reducer and painkiller"),
            medication("Amoxicillin", "Sandoz", Antibiotic, cents(120, 0), true, "Amoxicillin", "500 mg", "Broad-spectrum antibiotic"),
            medication("Vitamin C", "Naturalis", Vitamin, cents(85, 0), false, "Ascorbic acid", "1000 mg", "Immune support"),
            medication("Vitamin D3", "Solgar", Vitamin, cents(350, 0), false, "Cholecalciferol", "2000 IU", "Bones and immunity"),
            medication("Iodine", "Farmak", Antiseptic, cents(15, 50), false, "Iodine solution", "5%", "Antiseptic"),
            medication("No-Spa", "Chinoin", Gastrointestinal, cents(95, 0), false, "Drotaverine", "40 mg", "Antispasmodic"),
            medication("Cardiomagnyl", "Takeda", Cardiovascular, cents(180, 0), true, "Acetylsalicylic acid + magnesium", "75 mg", "Cardiovascular prevention"),
        ],
        pharmacies: vec![
            pharmacy("Pharmacy #1 (Center)", "Horodotska St, 123", "+380322123456", "8:00-22:00"),
            pharmacy("Pharmacy #2 (Sykhiv)", "Naukova St, 45", "+380322234567", "9:00-21:00"),
            pharmacy("Pharmacy #3 (Frankivskyi)", "Pid Dubom St, 78", "+380322345678", "24/7"),
        ],
    }
}

/// Stock between 5 and 50 units, fixed per (pharmacy, medication) slot.
fn demo_quantity(pharmacy_idx: usize, medication_idx: usize) -> i64 {
    5 + ((pharmacy_idx * 17 + medication_idx * 29) % 46) as i64
}

/// Write the demo catalog, stock and accounts. Does nothing when accounts
/// already exist.
pub async fn seed_demo_data(admin: &dyn StoreAdmin) -> Result<Option<DemoData>, StoreError> {
    let existing = admin.account_count().await?;
    if existing > 0 {
        info!(accounts = existing, "store already populated, skipping seed");
        return Ok(None);
    }

    let data = demo_data();
    for account in &data.accounts {
        admin.insert_account(account).await?;
    }
    for pharmacy in &data.pharmacies {
        admin.insert_pharmacy(pharmacy).await?;
    }
    for medication in &data.medications {
        admin.insert_medication(medication).await?;
    }
    for (p, pharmacy) in data.pharmacies.iter().enumerate() {
        for (m, medication) in data.medications.iter().enumerate() {
            admin.set_stock(pharmacy.id, medication.id, demo_quantity(p, m)).await?;
        }
    }

    info!(
        accounts = data.accounts.len(),
        pharmacies = data.pharmacies.len(),
        medications = data.medications.len(),
        "demo data seeded"
    );
    Ok(Some(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmacy_store::MemoryStore;

    #[test]
    fn test_demo_quantities_in_range() {
        for p in 0..3 {
            for m in 0..8 {
                let q = demo_quantity(p, m);
                assert!((5..=50).contains(&q), "{} out of range", q);
            }
        }
    }

    #[tokio::test]
    async fn test_seed_runs_once() {
        let store = MemoryStore::new();
        let first = seed_demo_data(&store).await.unwrap();
        assert!(first.is_some());
        assert_eq!(store.account_count().await.unwrap(), 3);
        let maria = store.account_by_username("maria_koval").await.unwrap().unwrap();
        assert_eq!(maria.tier, CardTier::Premium);

        let second = seed_demo_data(&store).await.unwrap();
        assert!(second.is_none());
        assert_eq!(store.account_count().await.unwrap(), 3);
    }
}
