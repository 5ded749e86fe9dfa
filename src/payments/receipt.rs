//! User-facing receipt projection.

use serde::Serialize;

use crate::domain::{CardSummary, Payment};

#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub transaction_id: String,
    pub date: String,
    pub time: String,
    pub method: String,
    pub amount: String,
    pub status: String,
    pub reference: Option<String>,
    pub last_digits: Option<String>,
}

/// Pure projection of an already-loaded payment. The card summary, if any,
/// must be decrypted by the caller first; this never touches the store or
/// the codec.
pub fn format_receipt(payment: &Payment, card: Option<&CardSummary>) -> Receipt {
    Receipt {
        transaction_id: payment.transaction_id.clone(),
        date: payment.created_at.format("%d/%m/%Y").to_string(),
        time: payment.created_at.format("%I:%M:%S %p").to_string(),
        method: payment.method.as_str().to_string(),
        amount: format_amount(payment.amount, &payment.currency),
        status: payment.status.as_str().to_uppercase(),
        reference: payment.reference.clone(),
        last_digits: card.map(|c| format!("****{}", c.last4)),
    }
}

fn format_amount(amount: f64, currency: &str) -> String {
    match currency {
        "INR" => format!("₹{:.2}", amount),
        _ => format!("{} {:.2}", currency, amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PaymentMetadata, PaymentMethod, PaymentStatus};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sample_payment() -> Payment {
        let created_at = Utc.with_ymd_and_hms(2026, 8, 7, 13, 30, 5).unwrap();
        Payment {
            id: Uuid::new_v4(),
            transaction_id: "TXN-1754573405000-ABCD1234".to_string(),
            payer_id: "payer-1".to_string(),
            order_id: Some("order-9".to_string()),
            booking_id: None,
            method: PaymentMethod::CreditCard,
            amount: 500.0,
            currency: "INR".to_string(),
            status: PaymentStatus::Completed,
            reference: Some("table-12".to_string()),
            metadata: PaymentMetadata::default(),
            failure_reason: None,
            created_at,
            updated_at: created_at,
            completed_at: Some(created_at),
            refunded_at: None,
            refund_amount: None,
        }
    }

    #[test]
    fn formats_a_card_receipt() {
        let payment = sample_payment();
        let card = CardSummary {
            last4: "1111".to_string(),
            network: Some("visa".to_string()),
        };

        let receipt = format_receipt(&payment, Some(&card));
        assert_eq!(receipt.transaction_id, payment.transaction_id);
        assert_eq!(receipt.date, "07/08/2026");
        assert_eq!(receipt.time, "01:30:05 PM");
        assert_eq!(receipt.amount, "₹500.00");
        assert_eq!(receipt.status, "COMPLETED");
        assert_eq!(receipt.reference.as_deref(), Some("table-12"));
        assert_eq!(receipt.last_digits.as_deref(), Some("****1111"));
    }

    #[test]
    fn non_card_receipt_has_no_last_digits() {
        let mut payment = sample_payment();
        payment.method = PaymentMethod::Upi;

        let receipt = format_receipt(&payment, None);
        assert_eq!(receipt.method, "upi");
        assert!(receipt.last_digits.is_none());
    }

    #[test]
    fn non_default_currency_falls_back_to_code() {
        assert_eq!(format_amount(12.5, "USD"), "USD 12.50");
    }
}
