//! Generic statutory deductions (Housing Levy and similar).
//!
//! Any deduction that is a progressive or flat charge on gross salary can be
//! introduced by adding rate tables under a new title; no code change is
//! needed. Relief follows the table's relief policy unless the deduction kind
//! records that relief was repealed on or before the payroll date.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::{RateQuery, RateStore};
use crate::error::EngineResult;
use crate::models::{AuditStep, DeductionContribution, DeductionKind, RateType};

use super::bracket::evaluate;
use super::rounding::round_money;

/// Statutory reference recorded for the Housing Levy.
pub const HOUSING_LEVY_REFERENCE: &str = "Affordable Housing Act 2024, s.4";

/// The result of a generic deduction calculation.
#[derive(Debug, Clone)]
pub struct OtherDeductionResult {
    /// Relief, employee and employer amounts.
    pub contribution: DeductionContribution,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

fn reference_for(title: &DeductionKind) -> String {
    match title {
        DeductionKind::HousingLevy => HOUSING_LEVY_REFERENCE.to_string(),
        other => format!("Configured deduction '{}'", other),
    }
}

/// Calculates a deduction identified by `title` and `rate_type`.
///
/// Brackets are evaluated progressively, the total is split between employee
/// and employer, and relief is taken on the employee share. Amounts are
/// rounded to `rounding.deduction_dp` places. Non-positive salary, or no
/// table for the date, gives zero.
///
/// # Errors
///
/// - `PolicyNotFound` if no statutory policy covers `effective_date`
/// - `FormulaNotFound` if `formula_id` names no table for `title`
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_other_deduction;
/// use payroll_engine::config::ConfigLoader;
/// use payroll_engine::models::{DeductionKind, RateType};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let config = ConfigLoader::load("config/kenya").unwrap();
/// let date = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
///
/// let result = calculate_other_deduction(
///     &config,
///     Decimal::from(49784),
///     &DeductionKind::HousingLevy,
///     RateType::Deduction,
///     "regular",
///     date,
///     None,
///     1,
/// )
/// .unwrap();
///
/// assert_eq!(result.contribution.employee, Decimal::from_str("746.76").unwrap());
/// assert_eq!(result.contribution.relief, Decimal::ZERO);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn calculate_other_deduction<S: RateStore + ?Sized>(
    store: &S,
    salary: Decimal,
    title: &DeductionKind,
    rate_type: RateType,
    category: &str,
    effective_date: NaiveDate,
    formula_id: Option<&str>,
    step_number: u32,
) -> EngineResult<OtherDeductionResult> {
    let rule_id = title.code().to_string();
    let rule_name = match title {
        DeductionKind::HousingLevy => "Housing Levy".to_string(),
        other => format!("Deduction: {}", other),
    };
    let input = serde_json::json!({
        "salary": salary.to_string(),
        "title": title.code(),
        "rate_type": rate_type.as_str(),
        "category": category,
        "effective_date": effective_date.to_string(),
        "formula_id": formula_id
    });

    let zero = |reasoning: String| OtherDeductionResult {
        contribution: DeductionContribution::zero(),
        audit_step: AuditStep {
            step_number,
            rule_id: rule_id.clone(),
            rule_name: rule_name.clone(),
            reference: reference_for(title),
            input: input.clone(),
            output: serde_json::json!({ "employee": "0", "employer": "0", "relief": "0" }),
            reasoning,
        },
    };

    if salary <= Decimal::ZERO {
        return Ok(zero(format!("No {} on non-positive salary", title)));
    }

    let policy = store.statutory_policy(effective_date)?;
    let query = RateQuery::new(title.clone(), category, effective_date)
        .with_rate_type(rate_type)
        .with_formula(formula_id);
    let Some(schedule) = store.load_rates(&query)? else {
        return Ok(zero(format!(
            "No {} table configured for {}",
            title, effective_date
        )));
    };

    let total = evaluate(salary, &schedule.brackets);
    let (employee, employer) = schedule.split.apply(total);

    let relief_repealed = title.relief_repealed_on(effective_date);
    let relief = if relief_repealed {
        Decimal::ZERO
    } else {
        schedule.relief.relief_for(employee)
    };

    let dp = policy.rounding.deduction_dp;
    let contribution = DeductionContribution {
        relief: round_money(relief, dp),
        employee: round_money(employee, dp),
        employer: round_money(employer, dp),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id,
        rule_name,
        reference: reference_for(title),
        input: input.clone(),
        output: serde_json::json!({
            "total": total.to_string(),
            "employee": contribution.employee.to_string(),
            "employer": contribution.employer.to_string(),
            "relief": contribution.relief.to_string(),
            "relief_repealed": relief_repealed
        }),
        reasoning: format!(
            "{} on salary KES {}: employee KES {}, employer KES {}, relief KES {}{}",
            title,
            salary.normalize(),
            contribution.employee,
            contribution.employer,
            contribution.relief,
            if relief_repealed {
                " (relief repealed)"
            } else {
                ""
            }
        ),
    };

    Ok(OtherDeductionResult {
        contribution,
        audit_step,
    })
}
