//! Pure input validators for payment credentials.
//!
//! These run before any record is created, and are also exposed standalone
//! through the API for client-side pre-validation.

use serde::Serialize;

/// Result of a credential check. `error` carries the first failure found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationOutcome {
    fn ok() -> Self {
        Self { valid: true, error: None }
    }

    fn fail(error: &str) -> Self {
        Self { valid: false, error: Some(error.to_string()) }
    }
}

/// Luhn checksum over a digits-only string: double every second digit from
/// the right, subtract 9 when the double exceeds 9, and require the sum to
/// be a multiple of 10.
pub fn luhn_check(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in digits.chars().rev().enumerate() {
        let mut digit = match c.to_digit(10) {
            Some(d) => d,
            None => return false,
        };
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}

/// Structural card-number check: 13 to 19 digits after stripping whitespace,
/// passing the Luhn checksum.
pub fn validate_card_number(card_number: &str) -> ValidationOutcome {
    let digits: String = card_number.chars().filter(|c| !c.is_whitespace()).collect();

    if digits.len() < 13 || digits.len() > 19 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return ValidationOutcome::fail("Invalid card number");
    }

    if !luhn_check(&digits) {
        return ValidationOutcome::fail("Invalid card number");
    }

    ValidationOutcome::ok()
}

/// Expiry check against the local calendar date, `MM/YY` only.
pub fn validate_expiry(expiry: &str) -> ValidationOutcome {
    let today = chrono::Local::now().date_naive();
    use chrono::Datelike;
    validate_expiry_at(expiry, today.month(), today.year() as u32 % 100)
}

/// Two-digit years are resolved inside a 50-year sliding window: a year more
/// than 50 years "ahead" of the current one is taken to belong to the
/// previous century, so `12/99` seen from 2026 is an expired 1999 card.
fn validate_expiry_at(expiry: &str, current_month: u32, current_year: u32) -> ValidationOutcome {
    let parsed = expiry.split_once('/').and_then(|(m, y)| {
        let two_digits = |s: &str| s.len() == 2 && s.chars().all(|c| c.is_ascii_digit());
        if two_digits(m) && two_digits(y) {
            Some((m.parse::<u32>().ok()?, y.parse::<u32>().ok()?))
        } else {
            None
        }
    });

    let (month, year) = match parsed {
        Some(my) => my,
        None => return ValidationOutcome::fail("Invalid expiry date format (MM/YY)"),
    };

    let years_ahead = (year + 100 - current_year) % 100;
    let expired = years_ahead > 50 || (years_ahead == 0 && month < current_month);

    if expired {
        return ValidationOutcome::fail("Card has expired");
    }

    ValidationOutcome::ok()
}

/// CVV check: 3 or 4 decimal digits.
pub fn validate_cvv(cvv: &str) -> ValidationOutcome {
    if (cvv.len() == 3 || cvv.len() == 4) && cvv.chars().all(|c| c.is_ascii_digit()) {
        ValidationOutcome::ok()
    } else {
        ValidationOutcome::fail("Invalid CVV")
    }
}

/// Full card contract: number, then expiry, then CVV. The first failure
/// wins.
pub fn validate_card(card_number: &str, expiry: &str, cvv: &str) -> ValidationOutcome {
    let number = validate_card_number(card_number);
    if !number.valid {
        return number;
    }

    let expiry = validate_expiry(expiry);
    if !expiry.valid {
        return expiry;
    }

    validate_cvv(cvv)
}

/// UPI handle check: `localpart@handle`, where the local part is letters,
/// digits, `.`, `_` or `-`, and the handle is alphanumeric.
pub fn validate_upi_id(upi_id: &str) -> bool {
    let Some((local, handle)) = upi_id.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !handle.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        && handle.chars().all(|c| c.is_ascii_alphanumeric())
}
