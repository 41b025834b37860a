//! SHIF health insurance deduction.
//!
//! SHIF is a single-bracket lookup rather than a progressive evaluation:
//! the bracket containing the salary supplies either a percentage of the
//! whole salary or a flat contribution. The employee contribution is subject
//! to a statutory minimum.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;

use crate::config::{RateQuery, RateStore};
use crate::error::EngineResult;
use crate::models::{AuditStep, AuditWarning, DeductionContribution, DeductionKind, ReliefPolicy};

use super::rounding::round_money;

/// Statutory reference recorded on SHIF audit steps.
pub const SHIF_REFERENCE: &str = "Social Health Insurance Act 2023, s.27";

/// Warning code emitted when no SHIF bracket matched the salary.
pub const SHIF_DEFAULT_RATE_WARNING: &str = "SHIF_DEFAULT_RATE";

/// Warning code emitted when the employee contribution was raised to the minimum.
pub const SHIF_MINIMUM_WARNING: &str = "SHIF_MINIMUM_APPLIED";

/// The result of a SHIF calculation.
#[derive(Debug, Clone)]
pub struct ShifResult {
    /// Relief, employee and employer amounts.
    pub contribution: DeductionContribution,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
    /// Fallback or minimum-contribution warnings.
    pub warnings: Vec<AuditWarning>,
}

/// Calculates the SHIF contribution on `salary`.
///
/// The bracket with `lower_bound <= salary <= upper_bound` is used: a rate
/// below 1 is a percentage of salary, otherwise it is the contribution
/// itself. The amount is split between employee and employer. If no bracket
/// matches (including when no table is configured) the policy's default rate
/// and split are used instead.
///
/// If the employee's share comes to less than the policy minimum it is raised
/// to the minimum and the employer's share is scaled by the same factor, so
/// the employer/employee ratio of the table is preserved.
///
/// Relief comes from the table's relief policy and is zero once repealed.
/// All amounts are rounded to `rounding.deduction_dp` places.
///
/// # Errors
///
/// - `PolicyNotFound` if no statutory policy covers `effective_date`
/// - `FormulaNotFound` if `formula_id` names no SHIF table
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_shif;
/// use payroll_engine::config::ConfigLoader;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let config = ConfigLoader::load("config/kenya").unwrap();
/// let date = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
///
/// let result = calculate_shif(&config, Decimal::from(5000), "regular", date, None, 1).unwrap();
///
/// // 2.75% of 5,000 is 137.50, below the 300 minimum.
/// assert_eq!(result.contribution.employee, Decimal::from(300));
/// assert_eq!(result.warnings[0].code, "SHIF_MINIMUM_APPLIED");
/// ```
pub fn calculate_shif<S: RateStore + ?Sized>(
    store: &S,
    salary: Decimal,
    category: &str,
    effective_date: NaiveDate,
    formula_id: Option<&str>,
    step_number: u32,
) -> EngineResult<ShifResult> {
    let input = serde_json::json!({
        "salary": salary.to_string(),
        "category": category,
        "effective_date": effective_date.to_string(),
        "formula_id": formula_id
    });

    if salary <= Decimal::ZERO {
        return Ok(ShifResult {
            contribution: DeductionContribution::zero(),
            audit_step: AuditStep {
                step_number,
                rule_id: "shif".to_string(),
                rule_name: "SHIF Contribution".to_string(),
                reference: SHIF_REFERENCE.to_string(),
                input,
                output: serde_json::json!({ "employee": "0", "employer": "0", "relief": "0" }),
                reasoning: "No SHIF on non-positive salary".to_string(),
            },
            warnings: Vec::new(),
        });
    }

    let policy = store.statutory_policy(effective_date)?;
    let query =
        RateQuery::new(DeductionKind::Shif, category, effective_date).with_formula(formula_id);
    let schedule = store.load_rates(&query)?;

    let mut warnings = Vec::new();
    let matched = schedule.as_ref().and_then(|schedule| {
        schedule
            .brackets
            .iter()
            .find(|bracket| bracket.contains(salary))
            .map(|bracket| (bracket, schedule))
    });

    let (computed, split, relief_policy, source) = match matched {
        Some((bracket, schedule)) => {
            let computed = if bracket.is_percentage() {
                salary * bracket.rate
            } else {
                bracket.rate
            };
            (computed, schedule.split, schedule.relief, "rate_table")
        }
        None => {
            warn!(
                salary = %salary,
                date = %effective_date,
                default_rate = %policy.shif_default_rate,
                "No SHIF bracket matched; using default rate"
            );
            warnings.push(AuditWarning {
                code: SHIF_DEFAULT_RATE_WARNING.to_string(),
                message: format!(
                    "No SHIF bracket matched salary {}; default rate {} applied",
                    salary.normalize(),
                    policy.shif_default_rate.normalize()
                ),
                severity: "medium".to_string(),
            });
            (
                salary * policy.shif_default_rate,
                policy.shif_default_split,
                ReliefPolicy::None,
                "default_rate",
            )
        }
    };

    let (mut employee, mut employer) = split.apply(computed);
    let minimum = policy.shif_minimum;
    let minimum_applied = employee > Decimal::ZERO && employee < minimum;
    if minimum_applied {
        employer = employer * minimum / employee;
        warn!(
            salary = %salary,
            computed_employee = %employee,
            minimum = %minimum,
            "SHIF employee contribution raised to statutory minimum"
        );
        warnings.push(AuditWarning {
            code: SHIF_MINIMUM_WARNING.to_string(),
            message: format!(
                "Computed SHIF {} is below the minimum {}; minimum applied",
                round_money(employee, policy.rounding.deduction_dp),
                minimum
            ),
            severity: "low".to_string(),
        });
        employee = minimum;
    }

    let dp = policy.rounding.deduction_dp;
    let contribution = DeductionContribution {
        relief: round_money(relief_policy.relief_for(employee), dp),
        employee: round_money(employee, dp),
        employer: round_money(employer, dp),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "shif".to_string(),
        rule_name: "SHIF Contribution".to_string(),
        reference: SHIF_REFERENCE.to_string(),
        input,
        output: serde_json::json!({
            "source": source,
            "computed": computed.to_string(),
            "minimum": minimum.to_string(),
            "minimum_applied": minimum_applied,
            "employee": contribution.employee.to_string(),
            "employer": contribution.employer.to_string(),
            "relief": contribution.relief.to_string()
        }),
        reasoning: if minimum_applied {
            format!(
                "Computed SHIF KES {} raised to minimum KES {}; employer scaled to KES {}",
                computed.normalize(),
                minimum,
                contribution.employer
            )
        } else {
            format!(
                "SHIF on salary KES {}: employee KES {}, employer KES {}, relief KES {}",
                salary.normalize(),
                contribution.employee,
                contribution.employer,
                contribution.relief
            )
        },
    };

    Ok(ShifResult {
        contribution,
        audit_step,
        warnings,
    })
}
