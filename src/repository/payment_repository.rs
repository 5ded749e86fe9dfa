use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{
        Payment, PaymentMetadata, PaymentMethod, PaymentStatus, PaymentSummary, StatusBucket,
    },
    error::{AppError, Result},
    repository::{PaymentListFilter, PaymentPage, PaymentRepository},
};

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    transaction_id: String,
    payer_id: String,
    order_id: Option<String>,
    booking_id: Option<String>,
    method: String,
    amount: f64,
    currency: String,
    status: String,
    reference: Option<String>,
    metadata: String,
    failure_reason: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    completed_at: Option<NaiveDateTime>,
    refunded_at: Option<NaiveDateTime>,
    refund_amount: Option<f64>,
}

const PAYMENT_COLUMNS: &str = r#"
    id, transaction_id, payer_id, order_id, booking_id, method, amount,
    currency, status, reference, metadata, failure_reason,
    created_at, updated_at, completed_at, refunded_at, refund_amount
"#;

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        let metadata: PaymentMetadata = serde_json::from_str(&row.metadata)
            .map_err(|e| AppError::Database(format!("Invalid payment metadata: {}", e)))?;

        Ok(Payment {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            transaction_id: row.transaction_id,
            payer_id: row.payer_id,
            order_id: row.order_id,
            booking_id: row.booking_id,
            method: Self::parse_payment_method(&row.method)?,
            amount: row.amount,
            currency: row.currency,
            status: Self::parse_payment_status(&row.status)?,
            reference: row.reference,
            metadata,
            failure_reason: row.failure_reason,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
            completed_at: row
                .completed_at
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            refunded_at: row
                .refunded_at
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            refund_amount: row.refund_amount,
        })
    }

    fn parse_payment_status(s: &str) -> Result<PaymentStatus> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "processing" => Ok(PaymentStatus::Processing),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(AppError::Database(format!("Invalid payment status: {}", s))),
        }
    }

    fn parse_payment_method(s: &str) -> Result<PaymentMethod> {
        match s {
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "debit_card" => Ok(PaymentMethod::DebitCard),
            "upi" => Ok(PaymentMethod::Upi),
            "wallet" => Ok(PaymentMethod::Wallet),
            "cash_on_delivery" => Ok(PaymentMethod::CashOnDelivery),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            _ => Err(AppError::Database(format!("Invalid payment method: {}", s))),
        }
    }

    async fn fetch_required(&self, transaction_id: &str) -> Result<Payment> {
        self.find_by_transaction_id(transaction_id)
            .await?
            .ok_or_else(|| {
                AppError::Database(format!(
                    "Failed to retrieve payment {}",
                    transaction_id
                ))
            })
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn create(&self, payment: Payment) -> Result<Payment> {
        let metadata_json = serde_json::to_string(&payment.metadata)
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, transaction_id, payer_id, order_id, booking_id, method,
                amount, currency, status, reference, metadata, failure_reason,
                created_at, updated_at, completed_at, refunded_at, refund_amount
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payment.id.to_string())
        .bind(&payment.transaction_id)
        .bind(&payment.payer_id)
        .bind(&payment.order_id)
        .bind(&payment.booking_id)
        .bind(payment.method.as_str())
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(&payment.reference)
        .bind(&metadata_json)
        .bind(&payment.failure_reason)
        .bind(payment.created_at.naive_utc())
        .bind(payment.updated_at.naive_utc())
        .bind(payment.completed_at.map(|dt| dt.naive_utc()))
        .bind(payment.refunded_at.map(|dt| dt.naive_utc()))
        .bind(payment.refund_amount)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.fetch_required(&payment.transaction_id).await
    }

    async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Payment>> {
        let sql = format!(
            "SELECT {} FROM payments WHERE transaction_id = ?",
            PAYMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_payment(r)?)),
            None => Ok(None),
        }
    }

    async fn complete(&self, transaction_id: &str) -> Result<Payment> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE payments
            SET status = ?, completed_at = ?, updated_at = ?
            WHERE transaction_id = ? AND status = ?
            "#,
        )
        .bind(PaymentStatus::Completed.as_str())
        .bind(now)
        .bind(now)
        .bind(transaction_id)
        .bind(PaymentStatus::Processing.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.fetch_required(transaction_id).await
    }

    async fn fail(&self, transaction_id: &str, reason: &str) -> Result<Payment> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE payments
            SET status = ?, failure_reason = ?, updated_at = ?
            WHERE transaction_id = ? AND status = ?
            "#,
        )
        .bind(PaymentStatus::Failed.as_str())
        .bind(reason)
        .bind(now)
        .bind(transaction_id)
        .bind(PaymentStatus::Processing.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.fetch_required(transaction_id).await
    }

    async fn transition(
        &self,
        transaction_id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?, updated_at = ?
            WHERE transaction_id = ? AND status = ?
            "#,
        )
        .bind(to.as_str())
        .bind(now)
        .bind(transaction_id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn refund(&self, transaction_id: &str) -> Result<bool> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?, refunded_at = ?, refund_amount = amount, updated_at = ?
            WHERE transaction_id = ? AND status = ?
            "#,
        )
        .bind(PaymentStatus::Refunded.as_str())
        .bind(now)
        .bind(now)
        .bind(transaction_id)
        .bind(PaymentStatus::Completed.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn list(&self, filter: &PaymentListFilter) -> Result<PaymentPage> {
        let mut where_clause = String::from("WHERE payer_id = ?");
        if filter.status.is_some() {
            where_clause.push_str(" AND status = ?");
        }
        if filter.method.is_some() {
            where_clause.push_str(" AND method = ?");
        }

        let page = filter.page.max(1);
        let limit = filter.limit.max(1);
        let offset = (page - 1) * limit;

        let sql = format!(
            "SELECT {} FROM payments {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            PAYMENT_COLUMNS, where_clause
        );
        let mut query = sqlx::query_as::<_, PaymentRow>(&sql).bind(&filter.payer_id);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(method) = filter.method {
            query = query.bind(method.as_str());
        }
        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count_sql = format!("SELECT COUNT(*) FROM payments {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(&filter.payer_id);
        if let Some(status) = filter.status {
            count_query = count_query.bind(status.as_str());
        }
        if let Some(method) = filter.method {
            count_query = count_query.bind(method.as_str());
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let payments = rows
            .into_iter()
            .map(Self::row_to_payment)
            .collect::<Result<Vec<_>>>()?;

        Ok(PaymentPage { payments, total })
    }

    async fn summarize(&self, payer_id: &str) -> Result<PaymentSummary> {
        #[derive(FromRow)]
        struct SummaryRow {
            status: String,
            count: i64,
            total_amount: f64,
        }

        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT status, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total_amount
            FROM payments
            WHERE payer_id = ?
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(payer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let mut by_status = Vec::with_capacity(rows.len());
        let mut total_transactions = 0;
        let mut total_spent = 0.0;

        for row in rows {
            let status = Self::parse_payment_status(&row.status)?;
            total_transactions += row.count;
            if status == PaymentStatus::Completed {
                total_spent += row.total_amount;
            }
            by_status.push(StatusBucket {
                status,
                count: row.count,
                total_amount: row.total_amount,
            });
        }

        Ok(PaymentSummary {
            by_status,
            total_transactions,
            total_spent,
        })
    }
}
