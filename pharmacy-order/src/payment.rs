use chrono::{DateTime, Utc};
use pharmacy_core::StoreError;
use pharmacy_shared::money::format_cents;
use pharmacy_shared::{Cents, Masked};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::OrderError;
use crate::models::OrderStatus;
use crate::repository::{OrderRepository, PaymentRepository, PaymentSettlement};

/// Providers accepted for online payment.
pub const ONLINE_PROVIDERS: [&str; 3] = ["privat24", "liqpay", "wayforpay"];

const DEFAULT_CASH_LOCATION: &str = "on receipt";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    #[default]
    Cash,
    Online,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Online => "online",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "cash" => Ok(PaymentMethod::Cash),
            "online" => Ok(PaymentMethod::Online),
            other => Err(OrderError::Validation(format!("Unknown payment method: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending" => PaymentStatus::Pending,
            "processing" => PaymentStatus::Processing,
            "completed" => PaymentStatus::Completed,
            "failed" => PaymentStatus::Failed,
            "refunded" => PaymentStatus::Refunded,
            other => return Err(StoreError::Corrupt(format!("payment status {}", other))),
        })
    }
}

/// Payment record, one per order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount_cents: Cents,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    /// What the strategy reported, card data already masked.
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn pending(order_id: Uuid, amount_cents: Cents, method: PaymentMethod) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            amount_cents,
            method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            details: serde_json::Value::Null,
            created_at: Utc::now(),
            paid_at: None,
        }
    }
}

/// Why a strategy refused to charge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentRejection {
    #[error("Invalid card number")]
    CardNumber,
    #[error("Invalid CVV code")]
    Cvv,
    #[error("Invalid card holder name")]
    CardHolder,
    #[error("Unknown payment provider: {0}")]
    UnknownProvider(String),
}

/// What came back from a payment attempt. Business failures are reported
/// here with `success: false`; they are never errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentResult {
    pub success: bool,
    pub message: String,
    pub transaction_id: Option<String>,
    pub method: PaymentMethod,
    pub extra: serde_json::Value,
}

/// How the customer pays.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentStrategy {
    Card {
        number: Masked<String>,
        holder: String,
        cvv: Masked<String>,
        expiry: String,
    },
    Cash {
        location: Option<String>,
    },
    Online {
        provider: String,
    },
}

impl PaymentStrategy {
    pub fn card(number: &str, holder: &str, cvv: &str, expiry: &str) -> Self {
        PaymentStrategy::Card {
            number: Masked::new(number.to_string()),
            holder: holder.to_string(),
            cvv: Masked::new(cvv.to_string()),
            expiry: expiry.to_string(),
        }
    }

    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentStrategy::Card { .. } => PaymentMethod::Card,
            PaymentStrategy::Cash { .. } => PaymentMethod::Cash,
            PaymentStrategy::Online { .. } => PaymentMethod::Online,
        }
    }

    pub fn validate(&self) -> Result<(), PaymentRejection> {
        match self {
            PaymentStrategy::Card { number, holder, cvv, .. } => {
                let digits = card_digits(number);
                if digits.len() != 16 || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(PaymentRejection::CardNumber);
                }
                let cvv = cvv.expose();
                if cvv.len() != 3 || !cvv.chars().all(|c| c.is_ascii_digit()) {
                    return Err(PaymentRejection::Cvv);
                }
                if holder.trim().chars().count() < 3 {
                    return Err(PaymentRejection::CardHolder);
                }
                Ok(())
            }
            PaymentStrategy::Cash { .. } => Ok(()),
            PaymentStrategy::Online { provider } => {
                if ONLINE_PROVIDERS.contains(&provider.as_str()) {
                    Ok(())
                } else {
                    Err(PaymentRejection::UnknownProvider(provider.clone()))
                }
            }
        }
    }

    pub fn pay(&self, amount: Cents) -> PaymentResult {
        let method = self.method();
        if let Err(rejection) = self.validate() {
            return PaymentResult {
                success: false,
                message: rejection.to_string(),
                transaction_id: None,
                method,
                extra: serde_json::Value::Null,
            };
        }

        match self {
            PaymentStrategy::Card { .. } => PaymentResult {
                success: true,
                message: format!("Card payment of {} UAH succeeded", format_cents(amount)),
                transaction_id: Some(random_code(12).to_ascii_uppercase()),
                method,
                extra: self.payment_info(),
            },
            PaymentStrategy::Cash { .. } => PaymentResult {
                success: true,
                message: format!("Payment of {} UAH in cash on receipt", format_cents(amount)),
                transaction_id: None,
                method,
                extra: self.payment_info(),
            },
            PaymentStrategy::Online { provider } => {
                let session_id = random_code(16).to_ascii_lowercase();
                PaymentResult {
                    success: true,
                    message: format!("Redirecting to {}", provider),
                    transaction_id: Some(session_id.clone()),
                    method,
                    extra: json!({
                        "provider": provider,
                        "session_id": session_id,
                        "payment_url": format!("https://{}.com/pay/{}", provider, session_id),
                    }),
                }
            }
        }
    }

    /// Display details. Card numbers are reduced to the last four digits.
    pub fn payment_info(&self) -> serde_json::Value {
        match self {
            PaymentStrategy::Card { number, holder, .. } => json!({
                "method": "card",
                "details": format!("**** **** **** {}", Masked::new(card_digits(number)).tail(4)),
                "holder": holder,
            }),
            PaymentStrategy::Cash { location } => json!({
                "method": "cash",
                "details": location.as_deref().unwrap_or(DEFAULT_CASH_LOCATION),
            }),
            PaymentStrategy::Online { provider } => json!({
                "method": "online",
                "details": provider,
            }),
        }
    }
}

/// The card number without the spaces customers type between groups.
fn card_digits(number: &Masked<String>) -> String {
    number.expose().chars().filter(|c| !c.is_whitespace()).collect()
}

fn random_code(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Opens and settles order payments.
#[derive(Clone)]
pub struct PaymentProcessor {
    payments: Arc<dyn PaymentRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl PaymentProcessor {
    pub fn new(payments: Arc<dyn PaymentRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { payments, orders }
    }

    /// Pending payment for the order's current total.
    pub async fn open_payment(&self, order_id: Uuid, method: PaymentMethod) -> Result<Payment, OrderError> {
        let order = self.orders.get_order(order_id).await?.ok_or(OrderError::NotFound(order_id))?;
        if order.status == OrderStatus::Cancelled {
            return Err(OrderError::TerminalState(order.status));
        }
        if self.payments.payment_for_order(order_id).await?.is_some() {
            return Err(OrderError::Validation("Order already has a payment".into()));
        }

        let payment = Payment::pending(order_id, order.total_cents, method);
        self.payments.insert_payment(&payment).await?;
        info!(payment_id = %payment.id, order_id = %order_id, method = %method, "payment opened");
        Ok(payment)
    }

    pub async fn get_payment(&self, payment_id: Uuid) -> Result<Payment, OrderError> {
        self.payments
            .get_payment(payment_id)
            .await?
            .ok_or(OrderError::PaymentNotFound(payment_id))
    }

    /// pending -> processing -> completed | failed.
    ///
    /// The final payment row and the order's paid flag are written together.
    pub async fn process_payment(
        &self,
        payment_id: Uuid,
        strategy: &PaymentStrategy,
    ) -> Result<PaymentResult, OrderError> {
        let payment = self.get_payment(payment_id).await?;
        if payment.status == PaymentStatus::Completed {
            return Err(OrderError::Validation("Payment has already been completed".into()));
        }
        if strategy.method() != payment.method {
            return Err(OrderError::Validation(format!(
                "Payment expects {} but {} was given",
                payment.method,
                strategy.method()
            )));
        }

        let payment = self.payments.mark_processing(payment_id).await?;
        let result = strategy.pay(payment.amount_cents);

        let details = json!({
            "success": result.success,
            "message": result.message,
            "transaction_id": result.transaction_id,
            "method": result.method,
            "extra": result.extra,
        });
        let settlement = if result.success {
            PaymentSettlement {
                payment_id,
                order_id: payment.order_id,
                status: PaymentStatus::Completed,
                transaction_id: result.transaction_id.clone(),
                details,
                paid_at: Some(Utc::now()),
            }
        } else {
            PaymentSettlement {
                payment_id,
                order_id: payment.order_id,
                status: PaymentStatus::Failed,
                transaction_id: None,
                details,
                paid_at: None,
            }
        };
        self.payments.settle_payment(&settlement).await?;

        if result.success {
            info!(payment_id = %payment_id, order_id = %payment.order_id, "payment completed");
        } else {
            warn!(payment_id = %payment_id, reason = %result.message, "payment failed");
        }
        Ok(result)
    }
}
