//! PAYE income tax calculation.
//!
//! This module computes income tax on taxable pay using the progressive
//! bands in force on the payroll date.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::{RateQuery, RateStore};
use crate::error::EngineResult;
use crate::models::{AuditStep, DeductionKind};

use super::bracket::evaluate_slices;
use super::rounding::round_money;

/// Statutory reference recorded on PAYE audit steps.
pub const INCOME_TAX_REFERENCE: &str = "Income Tax Act (Cap. 470), Third Schedule";

/// The result of a PAYE calculation, including the tax and audit step.
#[derive(Debug, Clone)]
pub struct IncomeTaxResult {
    /// Tax before any relief, rounded.
    pub tax: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates PAYE on `taxable_pay` before relief.
///
/// Taxable pay must already have the employee's NSSF, SHIF and Housing Levy
/// deducted. Non-positive taxable pay returns zero tax without consulting
/// the rate store. If no income table is configured for the date the tax is
/// zero.
///
/// # Errors
///
/// - `PolicyNotFound` if no statutory policy covers `effective_date`
/// - `FormulaNotFound` if `formula_id` names no income table
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_income_tax;
/// use payroll_engine::config::ConfigLoader;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let config = ConfigLoader::load("config/kenya").unwrap();
/// let date = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
///
/// let result = calculate_income_tax(
///     &config,
///     Decimal::from_str("44681.14").unwrap(),
///     "regular",
///     date,
///     None,
///     1,
/// )
/// .unwrap();
///
/// assert_eq!(result.tax, Decimal::from_str("8187.68").unwrap());
/// ```
pub fn calculate_income_tax<S: RateStore + ?Sized>(
    store: &S,
    taxable_pay: Decimal,
    category: &str,
    effective_date: NaiveDate,
    formula_id: Option<&str>,
    step_number: u32,
) -> EngineResult<IncomeTaxResult> {
    if taxable_pay <= Decimal::ZERO {
        let audit_step = AuditStep {
            step_number,
            rule_id: "paye".to_string(),
            rule_name: "PAYE Income Tax".to_string(),
            reference: INCOME_TAX_REFERENCE.to_string(),
            input: serde_json::json!({
                "taxable_pay": taxable_pay.to_string(),
                "effective_date": effective_date.to_string()
            }),
            output: serde_json::json!({ "tax": "0.00" }),
            reasoning: "No tax on non-positive taxable pay".to_string(),
        };
        return Ok(IncomeTaxResult {
            tax: Decimal::ZERO,
            audit_step,
        });
    }

    let policy = store.statutory_policy(effective_date)?;
    let query = RateQuery::new(DeductionKind::IncomeTax, category, effective_date)
        .with_formula(formula_id);
    let schedule = store.load_rates(&query)?;

    let brackets = schedule
        .as_ref()
        .map(|s| s.brackets.as_slice())
        .unwrap_or_default();
    let slices = evaluate_slices(taxable_pay, brackets);
    let unrounded: Decimal = slices.iter().map(|slice| slice.amount).sum();
    let tax = round_money(unrounded, policy.rounding.tax_dp);

    let reasoning = match &schedule {
        Some(schedule) => format!(
            "Taxable pay KES {} across {} band(s) of the table effective {}: KES {}",
            taxable_pay.normalize(),
            slices.len(),
            schedule.effective_from,
            tax
        ),
        None => format!(
            "No income tax table configured for {}; tax is zero",
            effective_date
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "paye".to_string(),
        rule_name: "PAYE Income Tax".to_string(),
        reference: INCOME_TAX_REFERENCE.to_string(),
        input: serde_json::json!({
            "taxable_pay": taxable_pay.to_string(),
            "category": category,
            "effective_date": effective_date.to_string(),
            "formula_id": formula_id
        }),
        output: serde_json::json!({
            "bands": slices,
            "unrounded_tax": unrounded.to_string(),
            "tax": tax.to_string()
        }),
        reasoning,
    };

    Ok(IncomeTaxResult { tax, audit_step })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RateBook, RoundingPolicy, StatutoryPolicy};
    use crate::error::EngineError;
    use crate::models::{Bracket, RateTable, RateType, ReliefPolicy, SplitRatio};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn policy() -> StatutoryPolicy {
        StatutoryPolicy {
            effective_date: date(2023, 7, 1),
            personal_relief: dec("2400"),
            nssf_tier_one_ceiling: dec("8000"),
            shif_minimum: dec("300"),
            shif_default_rate: dec("0.0275"),
            shif_default_split: SplitRatio::mirrored(),
            rounding: RoundingPolicy::default(),
        }
    }

    fn paye_table(category: Option<&str>) -> RateTable {
        RateTable {
            title: DeductionKind::IncomeTax,
            rate_type: RateType::Income,
            employee_category: category.map(str::to_string),
            effective_from: date(2023, 7, 1),
            effective_to: None,
            formula_id: None,
            brackets: vec![
                Bracket::unbounded(dec("32333.33"), dec("0.30")),
                Bracket::new(dec("24000"), dec("32333.33"), dec("0.25")),
                Bracket::new(dec("0"), dec("24000"), dec("0.10")),
            ],
            split: SplitRatio::default(),
            relief: ReliefPolicy::None,
        }
    }

    fn book() -> RateBook {
        RateBook::new(vec![paye_table(None)], vec![policy()]).unwrap()
    }

    #[test]
    fn test_tax_on_three_bands() {
        let result =
            calculate_income_tax(&book(), dec("44681.14"), "regular", date(2025, 3, 31), None, 4)
                .unwrap();

        assert_eq!(result.tax, dec("8187.68"));
        assert_eq!(result.audit_step.step_number, 4);
        assert_eq!(result.audit_step.rule_id, "paye");
        assert_eq!(result.audit_step.output["unrounded_tax"], "8187.6755");
    }

    #[test]
    fn test_tax_in_first_band() {
        let result =
            calculate_income_tax(&book(), dec("4325"), "regular", date(2025, 3, 31), None, 1)
                .unwrap();
        assert_eq!(result.tax, dec("432.50"));
    }

    #[test]
    fn test_non_positive_taxable_pay_is_zero() {
        let empty = RateBook::default();

        for amount in [Decimal::ZERO, dec("-250.00")] {
            let result =
                calculate_income_tax(&empty, amount, "regular", date(2025, 3, 31), None, 1)
                    .unwrap();
            assert_eq!(result.tax, Decimal::ZERO);
        }
    }

    #[test]
    fn test_missing_table_is_zero_tax() {
        let book = RateBook::new(vec![], vec![policy()]).unwrap();

        let result =
            calculate_income_tax(&book, dec("50000"), "regular", date(2025, 3, 31), None, 1)
                .unwrap();

        assert_eq!(result.tax, Decimal::ZERO);
        assert!(result.audit_step.reasoning.contains("No income tax table"));
    }

    #[test]
    fn test_unknown_formula_propagates() {
        let result = calculate_income_tax(
            &book(),
            dec("50000"),
            "regular",
            date(2025, 3, 31),
            Some("expatriate"),
            1,
        );
        assert!(matches!(result, Err(EngineError::FormulaNotFound { .. })));
    }

    #[test]
    fn test_missing_policy_propagates() {
        let book = RateBook::new(vec![paye_table(None)], vec![]).unwrap();

        let result =
            calculate_income_tax(&book, dec("50000"), "regular", date(2025, 3, 31), None, 1);
        assert!(matches!(result, Err(EngineError::PolicyNotFound { .. })));
    }

    #[test]
    fn test_category_specific_table() {
        let mut director = paye_table(Some("director"));
        director.brackets = vec![Bracket::unbounded(dec("0"), dec("0.30"))];
        let book = RateBook::new(vec![paye_table(None), director], vec![policy()]).unwrap();

        let result =
            calculate_income_tax(&book, dec("10000"), "director", date(2025, 3, 31), None, 1)
                .unwrap();
        assert_eq!(result.tax, dec("3000.00"));
    }

    #[test]
    fn test_idempotent() {
        let book = book();
        let first =
            calculate_income_tax(&book, dec("61234.56"), "regular", date(2025, 3, 31), None, 1)
                .unwrap();
        let second =
            calculate_income_tax(&book, dec("61234.56"), "regular", date(2025, 3, 31), None, 1)
                .unwrap();

        assert_eq!(first.tax, second.tax);
        assert_eq!(first.audit_step, second.audit_step);
    }
}
