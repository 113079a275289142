//! Property-based tests for petty-cash balance arithmetic.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::{credit, debit, replenishment_amount};
use super::error::AccountError;

/// Strategy to generate a non-negative balance (0.00 to 10,000,000.00).
fn balance_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a strictly positive amount (0.01 to 10,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Crediting a non-negative balance never produces a negative balance.
    #[test]
    fn prop_credit_keeps_balance_non_negative(
        balance in balance_strategy(),
        amount in positive_amount(),
    ) {
        let new_balance = credit(balance, amount).unwrap();
        prop_assert!(new_balance >= Decimal::ZERO);
        prop_assert_eq!(new_balance, balance + amount);
    }

    /// A debit either succeeds with a non-negative result or fails with
    /// `InsufficientFunds`; the balance can never be observed below zero.
    #[test]
    fn prop_debit_never_goes_negative(
        balance in balance_strategy(),
        amount in positive_amount(),
    ) {
        match debit(balance, amount) {
            Ok(new_balance) => {
                prop_assert!(new_balance >= Decimal::ZERO);
                prop_assert_eq!(new_balance, balance - amount);
            }
            Err(AccountError::InsufficientFunds { .. }) => {
                prop_assert!(amount > balance);
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    /// A triggered replenishment tops the balance up to exactly the threshold.
    #[test]
    fn prop_replenishment_restores_threshold(
        balance in balance_strategy(),
        threshold in balance_strategy(),
    ) {
        match replenishment_amount(balance, threshold) {
            Some(amount) => {
                prop_assert!(balance < threshold);
                prop_assert!(amount > Decimal::ZERO);
                prop_assert_eq!(balance + amount, threshold);
            }
            None => prop_assert!(balance >= threshold),
        }
    }

    /// Credit then equal debit round-trips the balance.
    #[test]
    fn prop_credit_debit_round_trip(
        balance in balance_strategy(),
        amount in positive_amount(),
    ) {
        let credited = credit(balance, amount).unwrap();
        let restored = debit(credited, amount).unwrap();
        prop_assert_eq!(restored, balance);
    }
}
