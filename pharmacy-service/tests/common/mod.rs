#![allow(dead_code)]

use async_trait::async_trait;
use pharmacy_catalog::DeliveryTariff;
use pharmacy_core::Account;
use pharmacy_notify::{ChannelSender, ChannelSenders, RenderedMessage};
use pharmacy_service::seed::{seed_demo_data, DemoData};
use pharmacy_service::AppState;
use pharmacy_store::Repositories;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Gateway double that remembers every message handed to it.
#[derive(Default)]
pub struct Recording {
    sent: Mutex<Vec<(String, RenderedMessage)>>,
}

impl Recording {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, m)| m.subject.clone()).collect()
    }
}

#[async_trait]
impl ChannelSender for Recording {
    async fn send(&self, contact: &str, message: &RenderedMessage) -> bool {
        self.sent.lock().unwrap().push((contact.to_string(), message.clone()));
        true
    }
}

pub struct TestApp {
    pub state: AppState,
    pub demo: DemoData,
    pub email: Arc<Recording>,
    pub sms: Arc<Recording>,
    pub push: Arc<Recording>,
}

impl TestApp {
    pub async fn start() -> Self {
        let repos = Repositories::in_memory();
        let demo = seed_demo_data(repos.admin.as_ref()).await.unwrap().unwrap();

        let email = Arc::new(Recording::default());
        let sms = Arc::new(Recording::default());
        let push = Arc::new(Recording::default());
        let senders = ChannelSenders { email: email.clone(), sms: sms.clone(), push: push.clone() };

        let state = AppState::with_senders(repos, DeliveryTariff::default(), senders);
        Self { state, demo, email, sms, push }
    }

    pub fn ivan(&self) -> &Account {
        self.demo.account("ivan_petrov").unwrap()
    }

    pub fn maria(&self) -> &Account {
        self.demo.account("maria_koval").unwrap()
    }

    pub fn olga(&self) -> &Account {
        self.demo.account("olga_shevchenko").unwrap()
    }

    pub fn medication_id(&self, name: &str) -> Uuid {
        self.demo.medication(name).unwrap().id
    }

    pub fn pharmacy_id(&self) -> Uuid {
        self.demo.pharmacies[0].id
    }
}
