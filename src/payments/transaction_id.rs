//! Transaction ID minting.

use chrono::Utc;

const PREFIX: &str = "TXN";

/// Mints a `TXN-<epoch millis>-<8 upper hex>` identifier. Sortable by
/// creation time, unique in practice from the timestamp plus 32 bits of
/// randomness; generation never fails and never blocks.
pub fn generate() -> String {
    let suffix: [u8; 4] = rand::random();
    format!(
        "{}-{}-{}",
        PREFIX,
        Utc::now().timestamp_millis(),
        hex::encode_upper(suffix)
    )
}
