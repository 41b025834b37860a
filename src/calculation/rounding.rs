//! Money rounding.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a final amount half away from zero to `dp` decimal places.
///
/// Bracket arithmetic is carried out at full precision; this is applied
/// once per deduction, to the finished figure.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let tax = Decimal::from_str("8187.6755").unwrap();
/// assert_eq!(round_money(tax, 2), Decimal::from_str("8187.68").unwrap());
/// assert_eq!(round_money(Decimal::from_str("2507.5").unwrap(), 0), Decimal::from(2508));
/// ```
pub fn round_money(amount: Decimal, dp: u32) -> Decimal {
    amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
