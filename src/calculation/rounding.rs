//! Currency rounding.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept for currency amounts.
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// Rounds an amount to two decimal places, half-up (midpoints away from zero).
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::round_currency;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_currency(Decimal::from_str("10.125").unwrap()), Decimal::from_str("10.13").unwrap());
/// assert_eq!(round_currency(Decimal::from_str("10.124").unwrap()), Decimal::from_str("10.12").unwrap());
/// ```
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}
