use pharmacy_catalog::DeliveryTariff;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// No URL means the in-memory store.
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Delivery fees, all amounts in cents.
#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub courier_fee_cents: i64,
    pub express_fee_cents: i64,
    pub large_order_threshold_cents: i64,
    #[serde(default = "default_large_order_percent")]
    pub large_order_courier_percent: u32,
    #[serde(default = "default_express_premium_discount")]
    pub express_premium_discount_percent: u32,
}

fn default_large_order_percent() -> u32 {
    50
}

fn default_express_premium_discount() -> u32 {
    20
}

impl BusinessRules {
    pub fn tariff(&self) -> DeliveryTariff {
        DeliveryTariff {
            courier_base_cents: self.courier_fee_cents,
            express_base_cents: self.express_fee_cents,
            large_order_threshold_cents: self.large_order_threshold_cents,
            large_order_courier_percent: self.large_order_courier_percent,
            express_premium_discount_percent: self.express_premium_discount_percent,
        }
    }
}

/// Per-channel kill switches. A disabled channel reports every send as
/// failed.
#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    #[serde(default = "enabled")]
    pub email_enabled: bool,
    #[serde(default = "enabled")]
    pub sms_enabled: bool,
    #[serde(default = "enabled")]
    pub push_enabled: bool,
}

fn enabled() -> bool {
    true
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { email_enabled: true, sms_enabled: true, push_enabled: true }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Developer overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `PHARMACY__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("PHARMACY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    const SAMPLE: &str = r#"
        [database]
        max_connections = 8

        [business_rules]
        courier_fee_cents = 4500
        express_fee_cents = 9000
        large_order_threshold_cents = 60000
    "#;

    #[test]
    fn test_defaults_fill_gaps() {
        let cfg: Config = config::Config::builder()
            .add_source(File::from_str(SAMPLE, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(cfg.database.url.is_none());
        assert_eq!(cfg.database.max_connections, 8);
        assert!(cfg.notifications.sms_enabled);

        let tariff = cfg.business_rules.tariff();
        assert_eq!(tariff.courier_base_cents, 4500);
        assert_eq!(tariff.large_order_courier_percent, 50);
        assert_eq!(tariff.express_premium_discount_percent, 20);
    }
}
