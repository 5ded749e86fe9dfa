use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use tiffin_payments::{
    domain::{Payment, PaymentMetadata, PaymentMethod, PaymentStatus},
    error::AppError,
    repository::{PaymentListFilter, PaymentRepository, SqlitePaymentRepository},
};

async fn setup_repo() -> anyhow::Result<SqlitePaymentRepository> {
    // Create an in-memory SQLite database. One connection, so the whole
    // test sees the same database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(SqlitePaymentRepository::new(pool))
}

fn sample_payment(transaction_id: &str, payer_id: &str, status: PaymentStatus) -> Payment {
    let now = Utc::now();
    Payment {
        id: Uuid::new_v4(),
        transaction_id: transaction_id.to_string(),
        payer_id: payer_id.to_string(),
        order_id: Some("order-1".to_string()),
        booking_id: None,
        method: PaymentMethod::Upi,
        amount: 500.0,
        currency: "INR".to_string(),
        status,
        reference: Some("ref-1".to_string()),
        metadata: PaymentMetadata {
            card: None,
            upi_id: Some("alice@examplebank".to_string()),
        },
        failure_reason: None,
        created_at: now,
        updated_at: now,
        completed_at: None,
        refunded_at: None,
        refund_amount: None,
    }
}

#[tokio::test]
async fn test_create_and_find() -> anyhow::Result<()> {
    let repo = setup_repo().await?;

    let created = repo
        .create(sample_payment("TXN-1-AAAA0001", "payer-1", PaymentStatus::Processing))
        .await?;
    assert_eq!(created.transaction_id, "TXN-1-AAAA0001");
    assert_eq!(created.status, PaymentStatus::Processing);
    assert_eq!(created.amount, 500.0);
    assert_eq!(created.metadata.upi_id.as_deref(), Some("alice@examplebank"));

    let found = repo.find_by_transaction_id("TXN-1-AAAA0001").await?;
    assert!(found.is_some());
    assert_eq!(found.unwrap().payer_id, "payer-1");

    let missing = repo.find_by_transaction_id("TXN-0-MISSING0").await?;
    assert!(missing.is_none());

    Ok(())
}

#[tokio::test]
async fn test_transaction_id_is_unique() -> anyhow::Result<()> {
    let repo = setup_repo().await?;

    repo.create(sample_payment("TXN-2-BBBB0002", "payer-1", PaymentStatus::Processing))
        .await?;

    let duplicate = repo
        .create(sample_payment("TXN-2-BBBB0002", "payer-2", PaymentStatus::Processing))
        .await;
    assert!(matches!(duplicate, Err(AppError::Database(_))));

    Ok(())
}

#[tokio::test]
async fn test_complete_sets_completed_at_once() -> anyhow::Result<()> {
    let repo = setup_repo().await?;
    repo.create(sample_payment("TXN-3-CCCC0003", "payer-1", PaymentStatus::Processing))
        .await?;

    let completed = repo.complete("TXN-3-CCCC0003").await?;
    assert_eq!(completed.status, PaymentStatus::Completed);
    assert!(completed.completed_at.is_some());

    // A second call finds no row in `processing` and leaves the record
    // untouched.
    let again = repo.complete("TXN-3-CCCC0003").await?;
    assert_eq!(again.completed_at, completed.completed_at);

    Ok(())
}

#[tokio::test]
async fn test_fail_records_the_reason() -> anyhow::Result<()> {
    let repo = setup_repo().await?;
    repo.create(sample_payment("TXN-4-DDDD0004", "payer-1", PaymentStatus::Processing))
        .await?;

    let failed = repo.fail("TXN-4-DDDD0004", "Payment declined by bank").await?;
    assert_eq!(failed.status, PaymentStatus::Failed);
    assert_eq!(failed.failure_reason.as_deref(), Some("Payment declined by bank"));
    assert!(failed.completed_at.is_none());

    Ok(())
}

#[tokio::test]
async fn test_transition_is_conditional() -> anyhow::Result<()> {
    let repo = setup_repo().await?;
    repo.create(sample_payment("TXN-5-EEEE0005", "payer-1", PaymentStatus::Processing))
        .await?;

    // Wrong precondition: no mutation.
    let moved = repo
        .transition("TXN-5-EEEE0005", PaymentStatus::Completed, PaymentStatus::Refunded)
        .await?;
    assert!(!moved);
    let record = repo.find_by_transaction_id("TXN-5-EEEE0005").await?.unwrap();
    assert_eq!(record.status, PaymentStatus::Processing);

    // Matching precondition: exactly one winner.
    let cancelled = repo
        .transition("TXN-5-EEEE0005", PaymentStatus::Processing, PaymentStatus::Cancelled)
        .await?;
    assert!(cancelled);
    let cancelled_again = repo
        .transition("TXN-5-EEEE0005", PaymentStatus::Processing, PaymentStatus::Cancelled)
        .await?;
    assert!(!cancelled_again);

    Ok(())
}

#[tokio::test]
async fn test_refund_only_from_completed() -> anyhow::Result<()> {
    let repo = setup_repo().await?;
    repo.create(sample_payment("TXN-6-FFFF0006", "payer-1", PaymentStatus::Processing))
        .await?;

    assert!(!repo.refund("TXN-6-FFFF0006").await?);

    repo.complete("TXN-6-FFFF0006").await?;
    assert!(repo.refund("TXN-6-FFFF0006").await?);

    let refunded = repo.find_by_transaction_id("TXN-6-FFFF0006").await?.unwrap();
    assert_eq!(refunded.status, PaymentStatus::Refunded);
    assert!(refunded.refunded_at.is_some());
    assert_eq!(refunded.refund_amount, Some(500.0));

    // Double refund loses the compare-and-swap.
    assert!(!repo.refund("TXN-6-FFFF0006").await?);

    Ok(())
}

#[tokio::test]
async fn test_list_filters_and_paginates() -> anyhow::Result<()> {
    let repo = setup_repo().await?;

    for i in 0..5 {
        let mut payment = sample_payment(
            &format!("TXN-7-000000{:02}", i),
            "payer-7",
            PaymentStatus::Completed,
        );
        payment.created_at = Utc::now() - Duration::seconds(60 * (5 - i as i64));
        payment.updated_at = payment.created_at;
        if i == 4 {
            payment.status = PaymentStatus::Failed;
            payment.method = PaymentMethod::Wallet;
        }
        repo.create(payment).await?;
    }
    // Noise from another payer must not show up.
    repo.create(sample_payment("TXN-7-OTHER000", "payer-8", PaymentStatus::Completed))
        .await?;

    let all = repo
        .list(&PaymentListFilter {
            payer_id: "payer-7".to_string(),
            status: None,
            method: None,
            page: 1,
            limit: 10,
        })
        .await?;
    assert_eq!(all.total, 5);
    assert_eq!(all.payments.len(), 5);
    // Newest first.
    assert_eq!(all.payments[0].transaction_id, "TXN-7-00000004");

    let completed_only = repo
        .list(&PaymentListFilter {
            payer_id: "payer-7".to_string(),
            status: Some(PaymentStatus::Completed),
            method: None,
            page: 1,
            limit: 10,
        })
        .await?;
    assert_eq!(completed_only.total, 4);

    let by_method = repo
        .list(&PaymentListFilter {
            payer_id: "payer-7".to_string(),
            status: None,
            method: Some(PaymentMethod::Wallet),
            page: 1,
            limit: 10,
        })
        .await?;
    assert_eq!(by_method.total, 1);

    let second_page = repo
        .list(&PaymentListFilter {
            payer_id: "payer-7".to_string(),
            status: None,
            method: None,
            page: 2,
            limit: 2,
        })
        .await?;
    assert_eq!(second_page.total, 5);
    assert_eq!(second_page.payments.len(), 2);
    assert_eq!(second_page.payments[0].transaction_id, "TXN-7-00000002");

    Ok(())
}

#[tokio::test]
async fn test_summarize_buckets_by_status() -> anyhow::Result<()> {
    let repo = setup_repo().await?;

    for (i, status) in [
        PaymentStatus::Completed,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ]
    .iter()
    .enumerate()
    {
        let mut payment = sample_payment(
            &format!("TXN-8-000000{:02}", i),
            "payer-9",
            *status,
        );
        payment.amount = 100.0 * (i as f64 + 1.0);
        repo.create(payment).await?;
    }

    let summary = repo.summarize("payer-9").await?;
    assert_eq!(summary.total_transactions, 4);
    // Completed: 100 + 200.
    assert_eq!(summary.total_spent, 300.0);

    let bucket_count: i64 = summary.by_status.iter().map(|b| b.count).sum();
    assert_eq!(bucket_count, summary.total_transactions);

    let completed = summary
        .by_status
        .iter()
        .find(|b| b.status == PaymentStatus::Completed)
        .unwrap();
    assert_eq!(completed.count, 2);
    assert_eq!(completed.total_amount, 300.0);

    let empty = repo.summarize("nobody").await?;
    assert_eq!(empty.total_transactions, 0);
    assert_eq!(empty.total_spent, 0.0);
    assert!(empty.by_status.is_empty());

    Ok(())
}
