//! Payroll line result models.
//!
//! This module contains the [`PayrollLineResult`] type and its associated
//! structures that capture all outputs from one payroll line calculation,
//! including the statutory contributions, PAYE, net pay and an audit trace.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FixedDeduction, PayPeriod};

/// NSSF contributions broken out by tier.
///
/// # Example
///
/// ```
/// use payroll_engine::models::NssfContribution;
/// use rust_decimal::Decimal;
///
/// let nssf = NssfContribution::zero();
/// assert_eq!(nssf.employee_total(), Decimal::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NssfContribution {
    /// Employee contribution on earnings up to the tier one ceiling.
    pub tier_one_employee: Decimal,
    /// Employee contribution on earnings above the tier one ceiling.
    pub tier_two_employee: Decimal,
    /// Employer contribution across both tiers.
    pub employer: Decimal,
}

impl NssfContribution {
    /// No contribution.
    pub fn zero() -> Self {
        Self {
            tier_one_employee: Decimal::ZERO,
            tier_two_employee: Decimal::ZERO,
            employer: Decimal::ZERO,
        }
    }

    /// Tier one plus tier two.
    pub fn employee_total(&self) -> Decimal {
        self.tier_one_employee + self.tier_two_employee
    }
}

/// A contribution with employee and employer shares and the relief due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionContribution {
    /// Relief on the employee share, offset against PAYE.
    pub relief: Decimal,
    /// The employee's share, deducted from pay.
    pub employee: Decimal,
    /// The employer's share.
    pub employer: Decimal,
}

impl DeductionContribution {
    /// No contribution.
    pub fn zero() -> Self {
        Self {
            relief: Decimal::ZERO,
            employee: Decimal::ZERO,
            employer: Decimal::ZERO,
        }
    }
}

/// Aggregated amounts for a payroll line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollTotals {
    /// Gross pay for the period.
    pub gross_pay: Decimal,
    /// Gross pay less the employee shares of NSSF, SHIF and Housing Levy.
    pub taxable_pay: Decimal,
    /// PAYE before any relief.
    pub paye_before_relief: Decimal,
    /// Personal relief applied.
    pub personal_relief: Decimal,
    /// Personal relief plus deduction reliefs.
    pub total_relief: Decimal,
    /// PAYE after relief, never negative.
    pub paye_after_relief: Decimal,
    /// Sum of the caller's fixed post-tax deductions.
    pub other_deductions_total: Decimal,
    /// Everything withheld from gross pay.
    pub total_deductions: Decimal,
    /// Gross pay less total deductions.
    pub net_pay: Decimal,
}

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// Statutory reference for this rule.
    pub reference: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate conditions that don't prevent calculation
/// but may require attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
    /// The total calculation duration in microseconds.
    pub duration_us: u64,
}

/// The complete result of one payroll line.
///
/// Created fresh for each calculation and owned by the caller; the engine
/// keeps no reference to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollLineResult {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that performed the calculation.
    pub engine_version: String,
    /// The ID of the employee the calculation is for.
    pub employee_id: String,
    /// The pay period for this calculation.
    pub pay_period: PayPeriod,
    /// NSSF contributions.
    pub nssf: NssfContribution,
    /// SHIF contributions.
    pub shif: DeductionContribution,
    /// Housing Levy contributions.
    pub housing_levy: DeductionContribution,
    /// The caller's fixed post-tax deductions, as applied.
    pub other_deductions: Vec<FixedDeduction>,
    /// Aggregated amounts.
    pub totals: PayrollTotals,
    /// Complete audit trace of calculation decisions.
    pub audit_trace: AuditTrace,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample_result() -> PayrollLineResult {
        PayrollLineResult {
            calculation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            engine_version: "0.1.0".to_string(),
            employee_id: "emp_001".to_string(),
            pay_period: PayPeriod::month(2025, 3).unwrap(),
            nssf: NssfContribution {
                tier_one_employee: dec("480.00"),
                tier_two_employee: dec("2507.04"),
                employer: dec("2987.04"),
            },
            shif: DeductionContribution {
                relief: Decimal::ZERO,
                employee: dec("1369.06"),
                employer: dec("1369.06"),
            },
            housing_levy: DeductionContribution {
                relief: Decimal::ZERO,
                employee: dec("746.76"),
                employer: dec("746.76"),
            },
            other_deductions: vec![],
            totals: PayrollTotals {
                gross_pay: dec("49784.00"),
                taxable_pay: dec("44681.14"),
                paye_before_relief: dec("8187.68"),
                personal_relief: dec("2400.00"),
                total_relief: dec("2400.00"),
                paye_after_relief: dec("5787.68"),
                other_deductions_total: Decimal::ZERO,
                total_deductions: dec("10890.54"),
                net_pay: dec("38893.46"),
            },
            audit_trace: AuditTrace {
                steps: vec![],
                warnings: vec![],
                duration_us: 12,
            },
        }
    }

    #[test]
    fn test_nssf_employee_total_sums_tiers() {
        let nssf = sample_result().nssf;
        assert_eq!(nssf.employee_total(), dec("2987.04"));
    }

    #[test]
    fn test_zero_contributions() {
        assert_eq!(DeductionContribution::zero().employee, Decimal::ZERO);
        assert_eq!(NssfContribution::zero().employer, Decimal::ZERO);
    }

    #[test]
    fn test_result_serializes_decimals_as_strings() {
        let json = serde_json::to_value(sample_result()).unwrap();

        assert_eq!(json["totals"]["net_pay"], "38893.46");
        assert_eq!(json["nssf"]["tier_two_employee"], "2507.04");
        assert_eq!(json["pay_period"]["end_date"], "2025-03-31");
    }

    #[test]
    fn test_result_round_trips_through_json() {
        let result = sample_result();
        let json = serde_json::to_string(&result).unwrap();
        let back: PayrollLineResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
