//! Withdrawal form collection, masking, and presence validation.
//!
//! The form only collects and displays card data; nothing is transmitted.
//! Masking mirrors the original input filters: digits grouped for display,
//! everything else stripped.

use crate::error::SessionError;

/// Transient withdrawal request. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WithdrawalRequest {
    pub email: String,
    pub card_number: String,
    pub expiry: String,
    pub cvv: String,
    pub cardholder_name: String,
    pub phone_number: String,
}

impl WithdrawalRequest {
    /// Apply the input masks to the card fields.
    pub(crate) fn normalized(mut self) -> Self {
        self.card_number = mask_card_number(&self.card_number);
        self.expiry = mask_expiry(&self.expiry);
        self.cvv = mask_cvv(&self.cvv);
        self
    }

    /// All six fields are required; presence only, no cross-field checks.
    pub(crate) fn validate(&self) -> Result<(), SessionError> {
        for (value, name) in [
            (&self.email, "email"),
            (&self.card_number, "card number"),
            (&self.expiry, "expiry date"),
            (&self.cvv, "cvv"),
            (&self.cardholder_name, "cardholder name"),
            (&self.phone_number, "phone number"),
        ] {
            if value.trim().is_empty() {
                return Err(SessionError::Validation(format!("{} is required", name)));
            }
        }
        Ok(())
    }

    /// Last four digits of the card number, for receipts.
    pub fn card_last4(&self) -> String {
        let digits: Vec<char> = self.card_number.chars().filter(|c| c.is_ascii_digit()).collect();
        digits[digits.len().saturating_sub(4)..].iter().collect()
    }
}

/// Keep up to 16 digits, grouped in fours: `1234 5678 9012 3456`.
pub fn mask_card_number(input: &str) -> String {
    let digits: String = input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(16)
        .collect();
    let mut out = String::with_capacity(19);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && i % 4 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Keep up to 4 digits, slash after the month: `MM/YY`.
pub fn mask_expiry(input: &str) -> String {
    let digits: String = input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(4)
        .collect();
    if digits.len() > 2 {
        format!("{}/{}", &digits[..2], &digits[2..])
    } else {
        digits
    }
}

/// Keep up to 4 digits.
pub fn mask_cvv(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).take(4).collect()
}
