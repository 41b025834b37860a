//! Progressive bracket evaluation.
//!
//! This is the arithmetic shared by PAYE, NSSF and the generic deductions:
//! walk the brackets in ascending order, charge each bracket on the part of
//! the amount that falls inside it, and stop at the bracket that contains the
//! amount. Nothing is rounded here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Bracket;

/// The charge levied by one bracket on an amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSlice {
    /// Lower bound of the bracket.
    pub lower_bound: Decimal,
    /// Upper bound of the bracket, `None` if unbounded.
    pub upper_bound: Option<Decimal>,
    /// The bracket's rate or flat amount.
    pub rate: Decimal,
    /// The part of the amount inside the bracket.
    pub taxable: Decimal,
    /// The unrounded charge for this bracket.
    pub amount: Decimal,
}

/// Evaluates `amount` against `brackets`, returning one slice per bracket reached.
///
/// The brackets are sorted by lower bound first; callers need not pre-sort.
/// Iteration stops before any bracket whose lower bound the amount does not
/// exceed, and after the bracket whose upper bound the amount does not exceed.
/// A non-positive amount yields no slices.
pub fn evaluate_slices(amount: Decimal, brackets: &[Bracket]) -> Vec<BracketSlice> {
    let mut ordered: Vec<&Bracket> = brackets.iter().collect();
    ordered.sort_by(|a, b| a.lower_bound.cmp(&b.lower_bound));

    let mut slices = Vec::new();
    for bracket in ordered {
        if amount <= bracket.lower_bound {
            break;
        }

        slices.push(BracketSlice {
            lower_bound: bracket.lower_bound,
            upper_bound: bracket.upper_bound,
            rate: bracket.rate,
            taxable: bracket.slice(amount),
            amount: bracket.contribution(amount),
        });

        if bracket.upper_bound.is_some_and(|upper| amount <= upper) {
            break;
        }
    }

    slices
}

/// Evaluates `amount` against `brackets` and returns the unrounded total.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::evaluate;
/// use payroll_engine::models::Bracket;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let dec = |s: &str| Decimal::from_str(s).unwrap();
/// let bands = vec![
///     Bracket::unbounded(dec("32333.33"), dec("0.30")),
///     Bracket::new(dec("0"), dec("24000"), dec("0.10")),
///     Bracket::new(dec("24000"), dec("32333.33"), dec("0.25")),
/// ];
///
/// // 2400 + 2083.3325 + 3704.343
/// assert_eq!(evaluate(dec("44681.14"), &bands), dec("8187.6755"));
/// assert_eq!(evaluate(dec("-5"), &bands), Decimal::ZERO);
/// ```
pub fn evaluate(amount: Decimal, brackets: &[Bracket]) -> Decimal {
    evaluate_slices(amount, brackets)
        .iter()
        .map(|slice| slice.amount)
        .sum()
}
