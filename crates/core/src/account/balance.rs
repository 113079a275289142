//! Balance mutation rules for the petty-cash account.
//!
//! The single invariant: the balance never goes negative. Credits come from
//! top-up disbursements; debits fund expense disbursements. Callers persist
//! the returned balance under a row lock so concurrent mutations cannot
//! produce lost updates.

use rust_decimal::Decimal;

use crate::account::error::AccountError;

/// Credits the balance.
///
/// # Errors
///
/// Returns `AccountError::NonPositiveAmount` if `amount <= 0`.
pub fn credit(balance: Decimal, amount: Decimal) -> Result<Decimal, AccountError> {
    if amount <= Decimal::ZERO {
        return Err(AccountError::NonPositiveAmount(amount));
    }
    Ok(balance + amount)
}

/// Debits the balance.
///
/// # Errors
///
/// * `AccountError::NonPositiveAmount` if `amount <= 0`
/// * `AccountError::InsufficientFunds` if the debit would go below zero
pub fn debit(balance: Decimal, amount: Decimal) -> Result<Decimal, AccountError> {
    if amount <= Decimal::ZERO {
        return Err(AccountError::NonPositiveAmount(amount));
    }
    if amount > balance {
        return Err(AccountError::InsufficientFunds {
            balance,
            requested: amount,
        });
    }
    Ok(balance - amount)
}

/// Amount needed to bring the balance back up to the threshold.
///
/// Returns `None` when the balance already meets the threshold; the
/// auto-replenishment check uses this to size the top-up it creates.
#[must_use]
pub fn replenishment_amount(balance: Decimal, threshold: Decimal) -> Option<Decimal> {
    if balance < threshold {
        Some(threshold - balance)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_credit_adds_amount() {
        assert_eq!(credit(dec!(100), dec!(600)).unwrap(), dec!(700));
    }

    #[test]
    fn test_credit_rejects_non_positive() {
        assert!(matches!(
            credit(dec!(100), dec!(0)),
            Err(AccountError::NonPositiveAmount(_))
        ));
        assert!(matches!(
            credit(dec!(100), dec!(-10)),
            Err(AccountError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn test_debit_subtracts_amount() {
        assert_eq!(debit(dec!(700), dec!(200)).unwrap(), dec!(500));
    }

    #[test]
    fn test_debit_to_exactly_zero_is_allowed() {
        assert_eq!(debit(dec!(500), dec!(500)).unwrap(), dec!(0));
    }

    #[test]
    fn test_debit_below_zero_fails() {
        assert!(matches!(
            debit(dec!(100), dec!(101)),
            Err(AccountError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_replenishment_below_threshold() {
        assert_eq!(replenishment_amount(dec!(100), dec!(500)), Some(dec!(400)));
    }

    #[test]
    fn test_replenishment_at_or_above_threshold() {
        assert_eq!(replenishment_amount(dec!(500), dec!(500)), None);
        assert_eq!(replenishment_amount(dec!(600), dec!(500)), None);
    }

    #[test]
    fn test_replenishment_from_zero_balance() {
        assert_eq!(replenishment_amount(dec!(0), dec!(500)), Some(dec!(500)));
    }
}
