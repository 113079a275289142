//! Error types for petty-cash balance operations.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while mutating a petty-cash balance.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Credit and debit amounts must be strictly positive.
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    /// A debit would take the balance below zero.
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// The balance before the debit.
        balance: Decimal,
        /// The amount that was requested.
        requested: Decimal,
    },
}

impl AccountError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NonPositiveAmount(_) => 400,
            Self::InsufficientFunds { .. } => 422,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
        }
    }
}
