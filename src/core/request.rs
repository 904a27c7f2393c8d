//! Validation of conversion requests before they reach a backend.

use crate::core::error::CurrencyError;

pub const MIN_AMOUNT: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertRequest {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

impl ConvertRequest {
    pub fn new(amount: f64, from: &str, to: &str) -> Result<Self, CurrencyError> {
        if !amount.is_finite() || amount < MIN_AMOUNT {
            return Err(CurrencyError::InvalidRequest(format!(
                "amount must be at least {MIN_AMOUNT}, got {amount}"
            )));
        }
        Ok(Self {
            amount,
            from: normalize_code(from, "source")?,
            to: normalize_code(to, "target")?,
        })
    }
}

/// Currency codes are exactly three ASCII letters, stored uppercase.
pub fn normalize_code(code: &str, role: &str) -> Result<String, CurrencyError> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CurrencyError::InvalidRequest(format!(
            "{role} currency code must consist of 3 letters, got '{code}'"
        )));
    }
    Ok(code.to_ascii_uppercase())
}
