//! NSSF pension contribution calculation.
//!
//! NSSF is charged on pensionable pay in two tiers. Tier one covers pay up to
//! the lower earnings limit and tier two the band from there to the upper
//! earnings limit. The limit separating the tiers is statutory policy
//! (`nssf_tier_one_ceiling`), so a new rate schedule needs only new
//! configuration.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{RateQuery, RateStore};
use crate::error::EngineResult;
use crate::models::{AuditStep, DeductionKind, NssfContribution};

use super::bracket::evaluate_slices;
use super::rounding::round_money;

/// Statutory reference recorded on NSSF audit steps.
pub const NSSF_REFERENCE: &str = "NSSF Act 2013, Third Schedule";

/// The result of an NSSF calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NssfResult {
    /// Tiered employee contributions and the employer contribution.
    pub contribution: NssfContribution,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates tier one and tier two employee NSSF and the employer share.
///
/// Each bracket the salary reaches is charged on its slice and the charge is
/// split between employee and employer. A bracket whose lower bound is below
/// the policy's tier one ceiling (or is zero) feeds tier one; any other
/// bracket feeds tier two. Amounts are rounded to `rounding.nssf_dp` places.
///
/// Non-positive salary, or no NSSF table for the date, gives zero.
///
/// # Errors
///
/// - `PolicyNotFound` if no statutory policy covers `effective_date`
/// - `FormulaNotFound` if `formula_id` names no NSSF table
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_nssf;
/// use payroll_engine::config::ConfigLoader;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let config = ConfigLoader::load("config/kenya").unwrap();
/// let date = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
///
/// let result = calculate_nssf(&config, Decimal::from(49784), "regular", date, None, 1).unwrap();
///
/// assert_eq!(result.contribution.tier_one_employee, Decimal::from(480));
/// assert_eq!(result.contribution.tier_two_employee, Decimal::from_str("2507.04").unwrap());
/// assert_eq!(result.contribution.employer, Decimal::from_str("2987.04").unwrap());
/// ```
pub fn calculate_nssf<S: RateStore + ?Sized>(
    store: &S,
    salary: Decimal,
    category: &str,
    effective_date: NaiveDate,
    formula_id: Option<&str>,
    step_number: u32,
) -> EngineResult<NssfResult> {
    let input = serde_json::json!({
        "salary": salary.to_string(),
        "category": category,
        "effective_date": effective_date.to_string(),
        "formula_id": formula_id
    });

    if salary <= Decimal::ZERO {
        return Ok(zero_result(
            step_number,
            input,
            "No NSSF on non-positive salary".to_string(),
        ));
    }

    let policy = store.statutory_policy(effective_date)?;
    let query =
        RateQuery::new(DeductionKind::Nssf, category, effective_date).with_formula(formula_id);
    let Some(schedule) = store.load_rates(&query)? else {
        return Ok(zero_result(
            step_number,
            input,
            format!("No NSSF table configured for {}", effective_date),
        ));
    };

    let ceiling = policy.nssf_tier_one_ceiling;
    let mut tier_one = Decimal::ZERO;
    let mut tier_two = Decimal::ZERO;
    let mut employer = Decimal::ZERO;

    let slices = evaluate_slices(salary, &schedule.brackets);
    for slice in &slices {
        let (employee_share, employer_share) = schedule.split.apply(slice.amount);
        if slice.lower_bound.is_zero() || slice.lower_bound < ceiling {
            tier_one += employee_share;
        } else {
            tier_two += employee_share;
        }
        employer += employer_share;
    }

    let dp = policy.rounding.nssf_dp;
    let contribution = NssfContribution {
        tier_one_employee: round_money(tier_one, dp),
        tier_two_employee: round_money(tier_two, dp),
        employer: round_money(employer, dp),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "nssf".to_string(),
        rule_name: "NSSF Contribution".to_string(),
        reference: NSSF_REFERENCE.to_string(),
        input,
        output: serde_json::json!({
            "tier_one_ceiling": ceiling.to_string(),
            "brackets": slices,
            "tier_one_employee": contribution.tier_one_employee.to_string(),
            "tier_two_employee": contribution.tier_two_employee.to_string(),
            "employer": contribution.employer.to_string()
        }),
        reasoning: format!(
            "Salary KES {}: employee tier I {} + tier II {}, employer {} (table effective {})",
            salary.normalize(),
            contribution.tier_one_employee,
            contribution.tier_two_employee,
            contribution.employer,
            schedule.effective_from
        ),
    };

    Ok(NssfResult {
        contribution,
        audit_step,
    })
}

fn zero_result(step_number: u32, input: serde_json::Value, reasoning: String) -> NssfResult {
    NssfResult {
        contribution: NssfContribution::zero(),
        audit_step: AuditStep {
            step_number,
            rule_id: "nssf".to_string(),
            rule_name: "NSSF Contribution".to_string(),
            reference: NSSF_REFERENCE.to_string(),
            input,
            output: serde_json::json!({
                "tier_one_employee": "0",
                "tier_two_employee": "0",
                "employer": "0"
            }),
            reasoning,
        },
    }
}
