use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    domain::{CardSummary, Payment, PaymentMethod, PaymentStatus, PaymentSummary, SafePayment},
    error::{AppError, Result},
    payments::{format_receipt, CryptoCodec, Receipt},
    repository::{PaymentListFilter, PaymentRepository},
};

/// Read and mutate persisted payments by transaction ID: refunds, caller
/// aborts, status lookups, history, aggregation, receipts.
pub struct PaymentService {
    repo: Arc<dyn PaymentRepository>,
    codec: Arc<CryptoCodec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundOutcome {
    pub success: bool,
    pub transaction_id: String,
    pub refund_amount: f64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusView {
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub amount: f64,
    pub method: PaymentMethod,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentHistory {
    pub payments: Vec<SafePayment>,
    pub pagination: Pagination,
}

impl PaymentService {
    pub fn new(repo: Arc<dyn PaymentRepository>, codec: Arc<CryptoCodec>) -> Self {
        Self { repo, codec }
    }

    /// Refund a completed payment. The store-level conditional update is
    /// what decides the race: whichever caller moves `completed ->
    /// refunded` wins, everyone else gets `InvalidState`.
    pub async fn refund(&self, transaction_id: &str) -> Result<RefundOutcome> {
        if self.repo.refund(transaction_id).await? {
            let payment = self.require(transaction_id).await?;
            tracing::info!(
                transaction_id = %transaction_id,
                amount = payment.amount,
                "payment refunded"
            );
            return Ok(RefundOutcome {
                success: true,
                transaction_id: transaction_id.to_string(),
                refund_amount: payment.refund_amount.unwrap_or(payment.amount),
                message: "Payment refunded successfully".to_string(),
            });
        }

        match self.repo.find_by_transaction_id(transaction_id).await? {
            None => Err(AppError::NotFound("Payment not found".to_string())),
            Some(_) => Err(AppError::InvalidState(
                "Only completed payments can be refunded".to_string(),
            )),
        }
    }

    /// Caller-initiated abort of a payment still awaiting settlement.
    pub async fn cancel(&self, transaction_id: &str) -> Result<Payment> {
        let cancelled = self
            .repo
            .transition(
                transaction_id,
                PaymentStatus::Processing,
                PaymentStatus::Cancelled,
            )
            .await?;

        if cancelled {
            tracing::info!(transaction_id = %transaction_id, "payment cancelled");
            return self.require(transaction_id).await;
        }

        match self.repo.find_by_transaction_id(transaction_id).await? {
            None => Err(AppError::NotFound("Payment not found".to_string())),
            Some(_) => Err(AppError::InvalidState(
                "Only payments awaiting settlement can be cancelled".to_string(),
            )),
        }
    }

    pub async fn status(&self, transaction_id: &str) -> Result<PaymentStatusView> {
        let payment = self.require(transaction_id).await?;

        Ok(PaymentStatusView {
            transaction_id: payment.transaction_id,
            status: payment.status,
            amount: payment.amount,
            method: payment.method,
            timestamp: payment.created_at,
        })
    }

    /// Masked, paginated payment history, newest first.
    pub async fn history(&self, filter: &PaymentListFilter) -> Result<PaymentHistory> {
        let page = self.repo.list(filter).await?;

        let limit = filter.limit.max(1);
        let pages = (page.total + limit - 1) / limit;

        Ok(PaymentHistory {
            payments: page.payments.iter().map(Payment::to_safe).collect(),
            pagination: Pagination {
                total: page.total,
                page: filter.page.max(1),
                limit,
                pages,
            },
        })
    }

    pub async fn summary(&self, payer_id: &str) -> Result<PaymentSummary> {
        self.repo.summarize(payer_id).await
    }

    /// Receipt projection. Card metadata is decrypted here, on the way out;
    /// the formatter itself only ever sees the masked summary.
    pub async fn receipt(&self, transaction_id: &str) -> Result<Receipt> {
        let payment = self.require(transaction_id).await?;

        let card: Option<CardSummary> = match &payment.metadata.card {
            Some(envelope) => Some(self.codec.decrypt(envelope)?),
            None => None,
        };

        Ok(format_receipt(&payment, card.as_ref()))
    }

    async fn require(&self, transaction_id: &str) -> Result<Payment> {
        self.repo
            .find_by_transaction_id(transaction_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))
    }
}
