use async_trait::async_trait;

use crate::domain::{Payment, PaymentMethod, PaymentStatus, PaymentSummary};
use crate::error::Result;

pub mod payment_repository;

pub use payment_repository::SqlitePaymentRepository;

/// Query contract for payment history: payer-scoped, optionally narrowed by
/// status and method, newest first.
#[derive(Debug, Clone)]
pub struct PaymentListFilter {
    pub payer_id: String,
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone)]
pub struct PaymentPage {
    pub payments: Vec<Payment>,
    pub total: i64,
}

/// The payment store. Point lookups go through `transaction_id`; status
/// changes go through conditional updates so concurrent writers cannot
/// double-apply a transition. Records are never deleted.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: Payment) -> Result<Payment>;
    async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Payment>>;
    /// Settlement success: `processing -> completed`, stamping `completed_at`.
    /// Returns the record as it stands afterwards, whether or not this call
    /// won the transition.
    async fn complete(&self, transaction_id: &str) -> Result<Payment>;
    /// Settlement decline: `processing -> failed`, recording the reason.
    async fn fail(&self, transaction_id: &str, reason: &str) -> Result<Payment>;
    /// Atomic conditional status update. True if a row matched `from` and
    /// was moved to `to`; false (and no mutation) otherwise.
    async fn transition(
        &self,
        transaction_id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool>;
    /// Atomic `completed -> refunded`, stamping `refunded_at` and copying
    /// the amount into `refund_amount`. True if this call won the race.
    async fn refund(&self, transaction_id: &str) -> Result<bool>;
    async fn list(&self, filter: &PaymentListFilter) -> Result<PaymentPage>;
    async fn summarize(&self, payer_id: &str) -> Result<PaymentSummary>;
}
