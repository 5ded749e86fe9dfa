pub mod payment_service;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::PaymentConfig;
use crate::error::Result;
use crate::payments::{CryptoCodec, PaymentProcessor};
use crate::repository::PaymentRepository;

pub use payment_service::{Pagination, PaymentHistory, PaymentService, PaymentStatusView, RefundOutcome};

pub struct ServiceContext {
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub processor: Arc<PaymentProcessor>,
    pub payment_service: Arc<PaymentService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        payment_repo: Arc<dyn PaymentRepository>,
        payment_config: &PaymentConfig,
        db_pool: SqlitePool,
    ) -> Result<Self> {
        let codec = Arc::new(CryptoCodec::new(&payment_config.encryption_passphrase)?);

        let processor = Arc::new(PaymentProcessor::new(
            payment_repo.clone(),
            codec.clone(),
            payment_config,
        ));
        let payment_service = Arc::new(PaymentService::new(payment_repo.clone(), codec));

        Ok(Self {
            payment_repo,
            processor,
            payment_service,
            db_pool,
        })
    }
}
