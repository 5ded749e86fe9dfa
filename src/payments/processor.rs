use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::PaymentConfig,
    domain::{CardSummary, Payment, PaymentMetadata, PaymentMethod, PaymentStatus},
    error::{AppError, Result},
    payments::{crypto::CryptoCodec, transaction_id, validators},
    repository::PaymentRepository,
};

/// Fixed decline message from the simulated gateway.
pub const DECLINE_REASON: &str = "Payment declined by bank";

/// Raw card input from the caller. Only the last four digits and the
/// network survive into the (encrypted) record; the full number and CVV are
/// dropped after validation.
#[derive(Clone, Deserialize)]
pub struct CardDetails {
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
    pub card_network: Option<String>,
}

// Manual Debug so full card numbers and CVVs cannot end up in logs.
impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("card_number", &"****")
            .field("expiry_date", &self.expiry_date)
            .field("cvv", &"***")
            .field("card_network", &self.card_network)
            .finish()
    }
}

/// Method-specific credentials, matched exhaustively against the payment
/// method. Adding a method is a compile-time-checked change.
#[derive(Debug, Clone)]
pub enum PaymentCredentials {
    Card(CardDetails),
    Upi { upi_id: String },
    None,
}

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    pub amount: f64,
    pub payer_id: String,
    pub order_id: Option<String>,
    pub booking_id: Option<String>,
    pub credentials: PaymentCredentials,
    pub reference: Option<String>,
}

/// What the caller gets back. A declined settlement is not an error: the
/// request worked, the payment is on record as failed, and the caller
/// branches on `status`.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub success: bool,
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub amount: f64,
    pub message: String,
}

/// Simulated settlement: an awaitable artificial gateway round-trip that
/// succeeds with a configured probability.
#[derive(Debug, Clone)]
pub struct SettlementSimulator {
    success_rate: f64,
    delay: Duration,
}

impl SettlementSimulator {
    pub fn new(success_rate: f64, delay: Duration) -> Self {
        Self { success_rate, delay }
    }

    pub async fn settle(&self) -> bool {
        tokio::time::sleep(self.delay).await;
        rand::thread_rng().gen::<f64>() < self.success_rate
    }
}

pub struct PaymentProcessor {
    repo: Arc<dyn PaymentRepository>,
    codec: Arc<CryptoCodec>,
    settlement: SettlementSimulator,
    currency: String,
}

impl PaymentProcessor {
    pub fn new(
        repo: Arc<dyn PaymentRepository>,
        codec: Arc<CryptoCodec>,
        config: &PaymentConfig,
    ) -> Self {
        Self {
            repo,
            codec,
            settlement: SettlementSimulator::new(
                config.settlement_success_rate,
                Duration::from_millis(config.settlement_delay_ms),
            ),
            currency: config.currency.clone(),
        }
    }

    /// Runs one payment attempt end to end: validate, mint a transaction
    /// ID, build (and where needed encrypt) the metadata, persist the
    /// record in `processing`, settle, persist the terminal state.
    ///
    /// Everything before the record exists surfaces as an error; once the
    /// record is in `processing`, a declined settlement comes back as a
    /// normal result with `status = failed`.
    pub async fn process(&self, request: PaymentRequest) -> Result<PaymentOutcome> {
        if request.amount <= 0.0 || !request.amount.is_finite() {
            return Err(AppError::Validation("Invalid payment amount".to_string()));
        }

        let transaction_id = transaction_id::generate();
        let metadata = self.build_metadata(&request)?;

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            transaction_id: transaction_id.clone(),
            payer_id: request.payer_id,
            order_id: request.order_id,
            booking_id: request.booking_id,
            method: request.method,
            amount: request.amount,
            currency: self.currency.clone(),
            status: PaymentStatus::Processing,
            reference: request.reference,
            metadata,
            failure_reason: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            refunded_at: None,
            refund_amount: None,
        };

        self.repo.create(payment).await?;
        tracing::info!(
            transaction_id = %transaction_id,
            method = %request.method,
            amount = request.amount,
            "payment record created, settling"
        );

        let payment = if self.settlement.settle().await {
            self.repo.complete(&transaction_id).await?
        } else {
            tracing::warn!(transaction_id = %transaction_id, "settlement declined");
            self.repo.fail(&transaction_id, DECLINE_REASON).await?
        };

        let message = match payment.status {
            PaymentStatus::Completed => "Payment processed successfully".to_string(),
            _ => payment
                .failure_reason
                .clone()
                .unwrap_or_else(|| DECLINE_REASON.to_string()),
        };

        Ok(PaymentOutcome {
            success: true,
            transaction_id,
            status: payment.status,
            amount: payment.amount,
            message,
        })
    }

    /// Method-specific validation and metadata construction. Card details
    /// are validated then reduced to an encrypted `{last4, network}`
    /// envelope; the UPI handle is validated and stored as supplied (it is
    /// masked on egress instead).
    fn build_metadata(&self, request: &PaymentRequest) -> Result<PaymentMetadata> {
        match (request.method, &request.credentials) {
            (method, PaymentCredentials::Card(card)) if method.is_card() => {
                let validation =
                    validators::validate_card(&card.card_number, &card.expiry_date, &card.cvv);
                if let Some(error) = validation.error {
                    return Err(AppError::Validation(error));
                }

                let digits: String = card
                    .card_number
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                let summary = CardSummary {
                    last4: digits[digits.len() - 4..].to_string(),
                    network: card.card_network.clone(),
                };

                Ok(PaymentMetadata {
                    card: Some(self.codec.encrypt(&summary)?),
                    upi_id: None,
                })
            }
            (PaymentMethod::CreditCard | PaymentMethod::DebitCard, _) => Err(AppError::Validation(
                "Card details are required for card payments".to_string(),
            )),
            (PaymentMethod::Upi, PaymentCredentials::Upi { upi_id }) => {
                if !validators::validate_upi_id(upi_id) {
                    return Err(AppError::Validation("Invalid UPI ID".to_string()));
                }
                Ok(PaymentMetadata {
                    card: None,
                    upi_id: Some(upi_id.clone()),
                })
            }
            (PaymentMethod::Upi, _) => {
                Err(AppError::Validation("UPI ID is required".to_string()))
            }
            (
                PaymentMethod::Wallet | PaymentMethod::CashOnDelivery | PaymentMethod::BankTransfer,
                _,
            ) => Ok(PaymentMetadata::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_details_debug_masks_the_pan() {
        let card = CardDetails {
            card_number: "4111111111111111".to_string(),
            expiry_date: "12/30".to_string(),
            cvv: "123".to_string(),
            card_network: Some("visa".to_string()),
        };

        let debug = format!("{:?}", card);
        assert!(!debug.contains("4111111111111111"));
        assert!(!debug.contains("\"123\""));
        assert!(debug.contains("****"));
    }

    #[tokio::test]
    async fn settlement_respects_pinned_rates() {
        let always = SettlementSimulator::new(1.0, Duration::from_millis(0));
        let never = SettlementSimulator::new(0.0, Duration::from_millis(0));

        for _ in 0..50 {
            assert!(always.settle().await);
            assert!(!never.settle().await);
        }
    }
}
