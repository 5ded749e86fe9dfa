use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single payment attempt. Records are append-only: settlement and refund
/// update status fields in place, nothing ever deletes a row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    /// External correlation key, minted once at creation.
    pub transaction_id: String,
    pub payer_id: String,
    pub order_id: Option<String>,
    pub booking_id: Option<String>,
    pub method: PaymentMethod,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub reference: Option<String>,
    pub metadata: PaymentMetadata,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub refund_amount: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Upi,
    Wallet,
    CashOnDelivery,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }

    pub fn is_card(&self) -> bool {
        matches!(self, PaymentMethod::CreditCard | PaymentMethod::DebitCard)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// No automatic transition leaves these states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed
                | PaymentStatus::Failed
                | PaymentStatus::Cancelled
                | PaymentStatus::Refunded
        )
    }

    /// Valid edges of the payment state machine. Transitions never skip
    /// `processing`, and only completed payments can be refunded.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Processing)
                | (PaymentStatus::Processing, PaymentStatus::Completed)
                | (PaymentStatus::Processing, PaymentStatus::Failed)
                | (PaymentStatus::Processing, PaymentStatus::Cancelled)
                | (PaymentStatus::Completed, PaymentStatus::Refunded)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ciphertext plus the IV needed to decrypt it. Losing the IV loses the
/// data, so the pair is persisted together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    pub ciphertext: String,
    pub iv: String,
}

/// The plaintext that goes inside a card envelope. Only the last four
/// digits and the network survive validation; the full number and CVV are
/// dropped on the floor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardSummary {
    pub last4: String,
    pub network: Option<String>,
}

/// Method-specific extras on a payment record. Card details live inside an
/// encrypted envelope; the UPI handle is stored as supplied and masked on
/// the way out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub card: Option<EncryptedEnvelope>,
    pub upi_id: Option<String>,
}

impl Payment {
    pub fn is_refundable(&self) -> bool {
        self.status == PaymentStatus::Completed && self.refunded_at.is_none()
    }

    /// Display-safe projection: the card envelope never leaves the service
    /// and the UPI handle goes out masked.
    pub fn to_safe(&self) -> SafePayment {
        SafePayment {
            transaction_id: self.transaction_id.clone(),
            payer_id: self.payer_id.clone(),
            order_id: self.order_id.clone(),
            booking_id: self.booking_id.clone(),
            method: self.method,
            amount: self.amount,
            currency: self.currency.clone(),
            status: self.status,
            reference: self.reference.clone(),
            upi_id: self.metadata.upi_id.as_deref().map(mask_upi_handle),
            failure_reason: self.failure_reason.clone(),
            created_at: self.created_at,
            completed_at: self.completed_at,
            refunded_at: self.refunded_at,
            refund_amount: self.refund_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SafePayment {
    pub transaction_id: String,
    pub payer_id: String,
    pub order_id: Option<String>,
    pub booking_id: Option<String>,
    pub method: PaymentMethod,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub reference: Option<String>,
    pub upi_id: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub refund_amount: Option<f64>,
}

/// One row of the per-payer aggregation: how many payments sit in a status
/// and what they add up to.
#[derive(Debug, Clone, Serialize)]
pub struct StatusBucket {
    pub status: PaymentStatus,
    pub count: i64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentSummary {
    pub by_status: Vec<StatusBucket>,
    pub total_transactions: i64,
    /// Sum over completed payments only.
    pub total_spent: f64,
}

/// `alice@examplebank` becomes `al***@examplebank`.
pub fn mask_upi_handle(upi_id: &str) -> String {
    match upi_id.split_once('@') {
        Some((local, handle)) => {
            let prefix: String = local.chars().take(2).collect();
            format!("{}***@{}", prefix, handle)
        }
        None => "***".to_string(),
    }
}
