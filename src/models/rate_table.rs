//! Rate table models.
//!
//! A [`RateTable`] is an effective-dated set of [`Bracket`]s for one tax or
//! deduction, together with the [`SplitRatio`] that divides the computed
//! contribution between employee and employer and the [`ReliefPolicy`] that
//! offsets the employee's share.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Whether a table describes a deduction from pay or a tax on income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    /// A statutory or voluntary deduction (NSSF, SHIF, levies).
    Deduction,
    /// Income tax (PAYE).
    Income,
}

impl RateType {
    /// Returns the configuration code for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            RateType::Deduction => "deduction",
            RateType::Income => "income",
        }
    }
}

/// The category of a tax or deduction, parsed from a rate table title.
///
/// Known titles get their own variant so that relief rules are attached to
/// the type rather than discovered by matching on strings. Any other title is
/// kept verbatim (lower-cased) in [`DeductionKind::Other`], so new deductions
/// can be introduced purely through configuration.
///
/// # Example
///
/// ```
/// use payroll_engine::models::DeductionKind;
///
/// assert_eq!(DeductionKind::from("NHIF"), DeductionKind::Shif);
/// assert_eq!(DeductionKind::from("housing_levy"), DeductionKind::HousingLevy);
/// assert_eq!(DeductionKind::from("union_dues").code(), "union_dues");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeductionKind {
    /// National Social Security Fund pension contribution.
    Nssf,
    /// Social Health Insurance Fund contribution (formerly NHIF).
    Shif,
    /// Affordable Housing Levy.
    HousingLevy,
    /// Pay-As-You-Earn income tax.
    IncomeTax,
    /// Any other configured deduction, identified by its title.
    Other(String),
}

impl DeductionKind {
    /// Returns the canonical configuration title.
    pub fn code(&self) -> &str {
        match self {
            DeductionKind::Nssf => "nssf",
            DeductionKind::Shif => "shif",
            DeductionKind::HousingLevy => "levy",
            DeductionKind::IncomeTax => "income",
            DeductionKind::Other(title) => title,
        }
    }

    /// The rate type under which this kind's tables are stored.
    pub fn rate_type(&self) -> RateType {
        match self {
            DeductionKind::IncomeTax => RateType::Income,
            _ => RateType::Deduction,
        }
    }

    /// The date from which relief on this deduction no longer applies.
    ///
    /// The Tax Laws (Amendment) Act 2024 made the Housing Levy an allowable
    /// deduction from 27 December 2024 and withdrew the affordable housing
    /// relief from the same date.
    pub fn relief_repealed_from(&self) -> Option<NaiveDate> {
        match self {
            DeductionKind::HousingLevy => NaiveDate::from_ymd_opt(2024, 12, 27),
            _ => None,
        }
    }

    /// Returns true if relief is repealed for this kind on the given date.
    pub fn relief_repealed_on(&self, date: NaiveDate) -> bool {
        self.relief_repealed_from()
            .is_some_and(|repealed| date >= repealed)
    }
}

impl From<&str> for DeductionKind {
    fn from(title: &str) -> Self {
        let normalized = title.trim().to_lowercase();
        match normalized.as_str() {
            "nssf" => DeductionKind::Nssf,
            "shif" | "nhif" => DeductionKind::Shif,
            "levy" | "housing_levy" | "housing levy" | "ahl" => DeductionKind::HousingLevy,
            "income" | "paye" | "income_tax" => DeductionKind::IncomeTax,
            _ => DeductionKind::Other(normalized),
        }
    }
}

impl From<String> for DeductionKind {
    fn from(title: String) -> Self {
        DeductionKind::from(title.as_str())
    }
}

impl From<DeductionKind> for String {
    fn from(kind: DeductionKind) -> Self {
        kind.code().to_string()
    }
}

impl fmt::Display for DeductionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single `(lower, upper, rate)` slice of a rate table.
///
/// A rate below 1 is a fraction of the amount falling inside the bracket.
/// A rate of 1 or more is a flat contribution charged once the amount
/// enters the bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    /// The amount at which this bracket starts.
    pub lower_bound: Decimal,
    /// The amount at which this bracket ends; `None` is unbounded.
    #[serde(default)]
    pub upper_bound: Option<Decimal>,
    /// Fractional rate, or flat amount when `>= 1`.
    pub rate: Decimal,
}

impl Bracket {
    /// Creates a bounded bracket.
    pub fn new(lower_bound: Decimal, upper_bound: Decimal, rate: Decimal) -> Self {
        Self {
            lower_bound,
            upper_bound: Some(upper_bound),
            rate,
        }
    }

    /// Creates a bracket that extends to infinity.
    pub fn unbounded(lower_bound: Decimal, rate: Decimal) -> Self {
        Self {
            lower_bound,
            upper_bound: None,
            rate,
        }
    }

    /// Returns true if the rate is a fraction of the slice rather than a flat amount.
    pub fn is_percentage(&self) -> bool {
        self.rate < Decimal::ONE
    }

    /// Returns true if `lower_bound <= amount <= upper_bound`.
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.lower_bound && self.upper_bound.is_none_or(|upper| amount <= upper)
    }

    /// The part of `amount` that falls inside this bracket.
    pub fn slice(&self, amount: Decimal) -> Decimal {
        let above_lower = (amount - self.lower_bound).max(Decimal::ZERO);
        match self.upper_bound {
            Some(upper) => above_lower.min(upper - self.lower_bound),
            None => above_lower,
        }
    }

    /// The unrounded tax or contribution this bracket levies on `amount`.
    pub fn contribution(&self, amount: Decimal) -> Decimal {
        if amount <= self.lower_bound {
            return Decimal::ZERO;
        }
        if self.is_percentage() {
            self.slice(amount) * self.rate
        } else {
            self.rate
        }
    }
}

/// Divides a computed contribution between employee and employer.
///
/// Each side is a percentage of the computed amount, so a table whose rate is
/// the employee rate can mirror it for the employer with `100 / 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRatio {
    /// Percentage of the computed amount borne by the employee.
    pub employee_percentage: Decimal,
    /// Percentage of the computed amount borne by the employer.
    pub employer_percentage: Decimal,
}

impl Default for SplitRatio {
    fn default() -> Self {
        Self {
            employee_percentage: HUNDRED,
            employer_percentage: Decimal::ZERO,
        }
    }
}

impl SplitRatio {
    /// Creates a split from the two percentages.
    pub fn new(employee_percentage: Decimal, employer_percentage: Decimal) -> Self {
        Self {
            employee_percentage,
            employer_percentage,
        }
    }

    /// Employer matches the employee contribution.
    pub fn mirrored() -> Self {
        Self::new(HUNDRED, HUNDRED)
    }

    /// Returns `(employee_share, employer_share)` of `amount`, unrounded.
    pub fn apply(&self, amount: Decimal) -> (Decimal, Decimal) {
        (
            amount * self.employee_percentage / HUNDRED,
            amount * self.employer_percentage / HUNDRED,
        )
    }
}

/// Relief available on the employee's share of a deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReliefPolicy {
    /// No relief (including relief that has been repealed).
    #[default]
    None,
    /// A fraction of the employee contribution (e.g., 0.15).
    Fraction {
        /// The fraction of the employee contribution granted as relief.
        fraction: Decimal,
    },
    /// A fixed amount, never more than the employee contribution.
    Flat {
        /// The relief amount.
        amount: Decimal,
    },
}

impl ReliefPolicy {
    /// The unrounded relief due on `employee_contribution`.
    pub fn relief_for(&self, employee_contribution: Decimal) -> Decimal {
        if employee_contribution <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        match self {
            ReliefPolicy::None => Decimal::ZERO,
            ReliefPolicy::Fraction { fraction } => employee_contribution * fraction,
            ReliefPolicy::Flat { amount } => (*amount).min(employee_contribution),
        }
    }
}

/// An effective-dated rate table as stored in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    /// The tax or deduction this table applies to.
    pub title: DeductionKind,
    /// Deduction or income.
    pub rate_type: RateType,
    /// The employee category; `None` applies to every category.
    #[serde(default)]
    pub employee_category: Option<String>,
    /// First day on which the table applies.
    pub effective_from: NaiveDate,
    /// Last day on which the table applies; `None` is open ended.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
    /// Override identifier; tables with an id are only used when requested.
    #[serde(default)]
    pub formula_id: Option<String>,
    /// The brackets, in any order.
    pub brackets: Vec<Bracket>,
    /// Employee/employer split of the computed amount.
    #[serde(default)]
    pub split: SplitRatio,
    /// Relief on the employee's share.
    #[serde(default)]
    pub relief: ReliefPolicy,
}

impl RateTable {
    /// Returns true if `date` lies within the table's effective interval.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.effective_from && self.effective_to.is_none_or(|to| date <= to)
    }

    /// Returns true if the effective intervals of the two tables share a day.
    pub fn overlaps(&self, other: &RateTable) -> bool {
        let self_ends_before = self.effective_to.is_some_and(|to| to < other.effective_from);
        let other_ends_before = other.effective_to.is_some_and(|to| to < self.effective_from);
        !(self_ends_before || other_ends_before)
    }

    /// The brackets sorted ascending by lower bound.
    pub fn sorted_brackets(&self) -> Vec<Bracket> {
        let mut brackets = self.brackets.clone();
        brackets.sort_by(|a, b| a.lower_bound.cmp(&b.lower_bound));
        brackets
    }

    /// Checks that the brackets form one ordered partition of `[0, ∞)`.
    ///
    /// Returns a description of the first problem found.
    pub fn partition_error(&self) -> Option<String> {
        let brackets = self.sorted_brackets();
        let first = brackets.first()?;
        if first.lower_bound != Decimal::ZERO {
            return Some(format!(
                "first bracket starts at {} instead of 0",
                first.lower_bound
            ));
        }

        let mut expected_lower = Decimal::ZERO;
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO {
                return Some(format!("negative rate {} at {}", bracket.rate, bracket.lower_bound));
            }
            if bracket.lower_bound < expected_lower {
                return Some(format!("brackets overlap at {}", bracket.lower_bound));
            }
            if bracket.lower_bound > expected_lower {
                return Some(format!(
                    "gap between {} and {}",
                    expected_lower, bracket.lower_bound
                ));
            }
            match bracket.upper_bound {
                Some(upper) if upper <= bracket.lower_bound => {
                    return Some(format!(
                        "empty bracket {} to {}",
                        bracket.lower_bound, upper
                    ));
                }
                Some(upper) => expected_lower = upper,
                None if index + 1 < brackets.len() => {
                    return Some(format!(
                        "unbounded bracket at {} is not the last",
                        bracket.lower_bound
                    ));
                }
                None => return None,
            }
        }

        Some(format!("last bracket ends at {} instead of infinity", expected_lower))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table(brackets: Vec<Bracket>) -> RateTable {
        RateTable {
            title: DeductionKind::IncomeTax,
            rate_type: RateType::Income,
            employee_category: None,
            effective_from: date(2023, 7, 1),
            effective_to: Some(date(2024, 6, 30)),
            formula_id: None,
            brackets,
            split: SplitRatio::default(),
            relief: ReliefPolicy::None,
        }
    }

    #[test]
    fn test_deduction_kind_parses_known_titles() {
        assert_eq!(DeductionKind::from("nssf"), DeductionKind::Nssf);
        assert_eq!(DeductionKind::from("SHIF"), DeductionKind::Shif);
        assert_eq!(DeductionKind::from("nhif"), DeductionKind::Shif);
        assert_eq!(DeductionKind::from("Levy"), DeductionKind::HousingLevy);
        assert_eq!(DeductionKind::from("paye"), DeductionKind::IncomeTax);
    }

    #[test]
    fn test_deduction_kind_keeps_unknown_titles() {
        let kind = DeductionKind::from("  Pension_Top_Up ");
        assert_eq!(kind, DeductionKind::Other("pension_top_up".to_string()));
        assert_eq!(kind.rate_type(), RateType::Deduction);
    }

    #[test]
    fn test_deduction_kind_does_not_match_substrings() {
        // A title merely containing "levy" is its own deduction.
        let kind = DeductionKind::from("county_levy");
        assert_eq!(kind, DeductionKind::Other("county_levy".to_string()));
        assert!(kind.relief_repealed_from().is_none());
    }

    #[test]
    fn test_housing_levy_relief_repealed_from_december_2024() {
        let levy = DeductionKind::HousingLevy;
        assert!(!levy.relief_repealed_on(date(2024, 12, 26)));
        assert!(levy.relief_repealed_on(date(2024, 12, 27)));
        assert!(levy.relief_repealed_on(date(2025, 3, 31)));
    }

    #[test]
    fn test_deduction_kind_serde_uses_title() {
        let kind: DeductionKind = serde_yaml::from_str("housing_levy").unwrap();
        assert_eq!(kind, DeductionKind::HousingLevy);
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"levy\"");
    }

    #[test]
    fn test_bracket_slice_caps_at_width() {
        let bracket = Bracket::new(dec("24000"), dec("32333.33"), dec("0.25"));

        assert_eq!(bracket.slice(dec("20000")), Decimal::ZERO);
        assert_eq!(bracket.slice(dec("30000")), dec("6000"));
        assert_eq!(bracket.slice(dec("50000")), dec("8333.33"));
    }

    #[test]
    fn test_bracket_flat_rate_is_charged_once() {
        let bracket = Bracket::new(dec("0"), dec("5999"), dec("150"));

        assert!(!bracket.is_percentage());
        assert_eq!(bracket.contribution(dec("100")), dec("150"));
        assert_eq!(bracket.contribution(dec("5999")), dec("150"));
        assert_eq!(bracket.contribution(dec("0")), Decimal::ZERO);
    }

    #[test]
    fn test_bracket_contains_is_inclusive() {
        let bracket = Bracket::new(dec("8000"), dec("72000"), dec("0.06"));
        assert!(bracket.contains(dec("8000")));
        assert!(bracket.contains(dec("72000")));
        assert!(!bracket.contains(dec("72000.01")));
        assert!(Bracket::unbounded(dec("0"), dec("0.0275")).contains(dec("1000000")));
    }

    #[test]
    fn test_split_ratio_default_is_employee_only() {
        let (employee, employer) = SplitRatio::default().apply(dec("746.76"));
        assert_eq!(employee, dec("746.76"));
        assert_eq!(employer, Decimal::ZERO);
    }

    #[test]
    fn test_split_ratio_halves() {
        let split = SplitRatio::new(dec("50"), dec("50"));
        let (employee, employer) = split.apply(dec("960"));
        assert_eq!(employee, dec("480"));
        assert_eq!(employer, dec("480"));
    }

    #[test]
    fn test_relief_fraction_and_flat() {
        let fraction = ReliefPolicy::Fraction {
            fraction: dec("0.15"),
        };
        assert_eq!(fraction.relief_for(dec("1000")), dec("150.00"));

        let flat = ReliefPolicy::Flat { amount: dec("500") };
        assert_eq!(flat.relief_for(dec("1000")), dec("500"));
        assert_eq!(flat.relief_for(dec("300")), dec("300"));
        assert_eq!(flat.relief_for(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_relief_policy_deserializes_tagged() {
        let relief: ReliefPolicy =
            serde_yaml::from_str("{ kind: fraction, fraction: \"0.15\" }").unwrap();
        assert_eq!(
            relief,
            ReliefPolicy::Fraction {
                fraction: dec("0.15")
            }
        );
        let none: ReliefPolicy = serde_yaml::from_str("{ kind: none }").unwrap();
        assert_eq!(none, ReliefPolicy::None);
    }

    #[test]
    fn test_table_covers_inclusive_interval() {
        let t = table(vec![Bracket::unbounded(dec("0"), dec("0.1"))]);
        assert!(t.covers(date(2023, 7, 1)));
        assert!(t.covers(date(2024, 6, 30)));
        assert!(!t.covers(date(2024, 7, 1)));
        assert!(!t.covers(date(2023, 6, 30)));
    }

    #[test]
    fn test_table_overlaps() {
        let a = table(vec![]);
        let mut b = table(vec![]);
        b.effective_from = date(2024, 7, 1);
        b.effective_to = None;
        assert!(!a.overlaps(&b));

        b.effective_from = date(2024, 6, 30);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_partition_accepts_unsorted_contiguous_brackets() {
        let t = table(vec![
            Bracket::unbounded(dec("32333.33"), dec("0.30")),
            Bracket::new(dec("0"), dec("24000"), dec("0.10")),
            Bracket::new(dec("24000"), dec("32333.33"), dec("0.25")),
        ]);
        assert_eq!(t.partition_error(), None);
        assert_eq!(t.sorted_brackets()[0].lower_bound, Decimal::ZERO);
    }

    #[test]
    fn test_partition_rejects_overlap() {
        let t = table(vec![
            Bracket::new(dec("0"), dec("24000"), dec("0.10")),
            Bracket::unbounded(dec("20000"), dec("0.25")),
        ]);
        assert_eq!(
            t.partition_error(),
            Some("brackets overlap at 20000".to_string())
        );
    }

    #[test]
    fn test_partition_rejects_gap_and_bounded_end() {
        let gap = table(vec![
            Bracket::new(dec("0"), dec("24000"), dec("0.10")),
            Bracket::unbounded(dec("25000"), dec("0.25")),
        ]);
        assert_eq!(
            gap.partition_error(),
            Some("gap between 24000 and 25000".to_string())
        );

        let bounded = table(vec![Bracket::new(dec("0"), dec("24000"), dec("0.10"))]);
        assert!(bounded.partition_error().unwrap().contains("infinity"));
    }

    #[test]
    fn test_partition_allows_empty_table() {
        assert_eq!(table(vec![]).partition_error(), None);
    }
}
