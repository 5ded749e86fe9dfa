pub mod crypto;
pub mod processor;
pub mod receipt;
pub mod transaction_id;
pub mod validators;

pub use crypto::CryptoCodec;
pub use processor::{
    CardDetails, PaymentCredentials, PaymentOutcome, PaymentProcessor, PaymentRequest,
    SettlementSimulator, DECLINE_REASON,
};
pub use receipt::{format_receipt, Receipt};
