//! Payroll line orchestration.
//!
//! Runs the statutory deductions for one employee and one period in the
//! order the tax law requires:
//!
//! 1. NSSF (if enabled)
//! 2. SHIF (if enabled)
//! 3. Housing Levy (always)
//! 4. Taxable pay = gross less the employee shares of the above
//! 5. PAYE on taxable pay
//! 6. Personal relief and deduction reliefs offset PAYE, flooring at zero
//! 7. Net pay = gross less every employee deduction and fixed deduction

use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RateStore;
use crate::error::EngineResult;
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, DeductionContribution, DeductionKind, NssfContribution,
    PayrollInput, PayrollLineResult, PayrollTotals, RateType,
};

use super::income_tax::calculate_income_tax;
use super::nssf::calculate_nssf;
use super::other_deduction::calculate_other_deduction;
use super::rounding::round_money;
use super::shif::calculate_shif;

/// Warning code emitted when negative gross pay was treated as zero.
pub const NEGATIVE_GROSS_WARNING: &str = "NEGATIVE_GROSS_PAY";

/// Per-call accumulator for one payroll line.
///
/// Every amount starts at an explicit zero so a deduction that is disabled
/// or skipped still contributes a defined value to the totals.
struct LineBuilder {
    step_number: u32,
    steps: Vec<AuditStep>,
    warnings: Vec<AuditWarning>,
    nssf: NssfContribution,
    shif: DeductionContribution,
    housing_levy: DeductionContribution,
    paye_before_relief: Decimal,
}

impl LineBuilder {
    fn new() -> Self {
        Self {
            step_number: 1,
            steps: Vec::new(),
            warnings: Vec::new(),
            nssf: NssfContribution::zero(),
            shif: DeductionContribution::zero(),
            housing_levy: DeductionContribution::zero(),
            paye_before_relief: Decimal::ZERO,
        }
    }

    fn record(&mut self, step: AuditStep) {
        debug!(
            step = step.step_number,
            rule_id = %step.rule_id,
            reasoning = %step.reasoning,
            "Calculation step"
        );
        self.steps.push(step);
        self.step_number += 1;
    }

    fn skip(&mut self, rule_id: &str, rule_name: &str, flag: &str) {
        let step = AuditStep {
            step_number: self.step_number,
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            reference: "Caller deduction flags".to_string(),
            input: serde_json::json!({ flag: false }),
            output: serde_json::json!({ "skipped": true }),
            reasoning: format!("{} disabled for this employee", rule_name),
        };
        self.record(step);
    }

    fn employee_statutory_total(&self) -> Decimal {
        self.nssf.employee_total() + self.shif.employee + self.housing_levy.employee
    }

    fn deduction_reliefs(&self) -> Decimal {
        self.shif.relief + self.housing_levy.relief
    }
}

/// Computes one payroll line: statutory deductions, PAYE and net pay.
///
/// Rates are looked up for the pay period's end date and the employee's
/// category. Zero or negative gross pay is a valid business state and yields
/// a zero line; negative gross is treated as zero with an audit warning.
///
/// # Errors
///
/// - `InvalidEmployee`, `InvalidPayPeriod` or `CalculationError` for
///   malformed input
/// - `PolicyNotFound` if no statutory policy covers the period
/// - `FormulaNotFound` if an override names no table
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::process_regular_payroll;
/// use payroll_engine::config::ConfigLoader;
/// use payroll_engine::models::{Employee, PayPeriod, PayrollInput};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let config = ConfigLoader::load("config/kenya").unwrap();
/// let input = PayrollInput::new(
///     Employee::new("emp_001", "Wanjiku Kamau"),
///     Decimal::from(49784),
///     PayPeriod::month(2025, 3).unwrap(),
/// );
///
/// let line = process_regular_payroll(&input, &config).unwrap();
///
/// assert_eq!(line.totals.taxable_pay, Decimal::from_str("44681.14").unwrap());
/// assert_eq!(line.totals.paye_after_relief, Decimal::from_str("5787.68").unwrap());
/// assert_eq!(line.totals.net_pay, Decimal::from_str("38893.46").unwrap());
/// ```
pub fn process_regular_payroll<S: RateStore + ?Sized>(
    input: &PayrollInput,
    store: &S,
) -> EngineResult<PayrollLineResult> {
    let start_time = Instant::now();
    input.validate()?;

    let employee = &input.employee;
    let category = employee.employee_category.as_str();
    let effective_date = input.pay_period.effective_date();
    let policy = store.statutory_policy(effective_date)?;
    let mut line = LineBuilder::new();

    let gross_pay = if input.gross_pay < Decimal::ZERO {
        warn!(
            employee_id = %employee.id,
            gross_pay = %input.gross_pay,
            "Negative gross pay treated as zero"
        );
        line.warnings.push(AuditWarning {
            code: NEGATIVE_GROSS_WARNING.to_string(),
            message: format!(
                "Gross pay {} is negative; the line was computed on zero pay",
                input.gross_pay
            ),
            severity: "high".to_string(),
        });
        Decimal::ZERO
    } else {
        input.gross_pay
    };

    if input.flags.deduct_nssf {
        let result = calculate_nssf(
            store,
            gross_pay,
            category,
            effective_date,
            input.overrides.nssf.as_deref(),
            line.step_number,
        )?;
        line.nssf = result.contribution;
        line.record(result.audit_step);
    } else {
        line.skip("nssf", "NSSF Contribution", "deduct_nssf");
    }

    if input.flags.deduct_shif {
        let result = calculate_shif(
            store,
            gross_pay,
            category,
            effective_date,
            input.overrides.shif.as_deref(),
            line.step_number,
        )?;
        line.shif = result.contribution;
        line.warnings.extend(result.warnings);
        line.record(result.audit_step);
    } else {
        line.skip("shif", "SHIF Contribution", "deduct_shif");
    }

    let levy = calculate_other_deduction(
        store,
        gross_pay,
        &DeductionKind::HousingLevy,
        RateType::Deduction,
        category,
        effective_date,
        input.overrides.housing_levy.as_deref(),
        line.step_number,
    )?;
    line.housing_levy = levy.contribution;
    line.record(levy.audit_step);

    let statutory_total = line.employee_statutory_total();
    let taxable_pay = (gross_pay - statutory_total).max(Decimal::ZERO);

    let paye = calculate_income_tax(
        store,
        taxable_pay,
        category,
        effective_date,
        input.overrides.income_tax.as_deref(),
        line.step_number,
    )?;
    line.paye_before_relief = paye.tax;
    line.record(paye.audit_step);

    let tax_dp = policy.rounding.tax_dp;
    let personal_relief = policy.personal_relief;
    let total_relief = round_money(personal_relief + line.deduction_reliefs(), tax_dp);
    let paye_after_relief = (line.paye_before_relief - total_relief).max(Decimal::ZERO);
    let relief_step = AuditStep {
        step_number: line.step_number,
        rule_id: "paye_relief".to_string(),
        rule_name: "PAYE Relief".to_string(),
        reference: "Income Tax Act (Cap. 470), s.30 and s.31".to_string(),
        input: serde_json::json!({
            "paye_before_relief": line.paye_before_relief.to_string(),
            "personal_relief": personal_relief.to_string(),
            "shif_relief": line.shif.relief.to_string(),
            "housing_relief": line.housing_levy.relief.to_string()
        }),
        output: serde_json::json!({
            "total_relief": total_relief.to_string(),
            "paye_after_relief": paye_after_relief.to_string()
        }),
        reasoning: format!(
            "PAYE KES {} less relief KES {} = KES {}",
            line.paye_before_relief, total_relief, paye_after_relief
        ),
    };
    line.record(relief_step);

    let other_deductions_total = input.other_deductions_total();
    let total_deductions = statutory_total + paye_after_relief + other_deductions_total;
    let net_pay = gross_pay - total_deductions;

    let net_step = AuditStep {
        step_number: line.step_number,
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        reference: "Employment Act 2007, s.19".to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "statutory_deductions": statutory_total.to_string(),
            "paye_after_relief": paye_after_relief.to_string(),
            "other_deductions": other_deductions_total.to_string()
        }),
        output: serde_json::json!({
            "total_deductions": total_deductions.to_string(),
            "net_pay": net_pay.to_string()
        }),
        reasoning: format!(
            "Gross KES {} less deductions KES {} = net KES {}",
            gross_pay, total_deductions, net_pay
        ),
    };
    line.record(net_step);

    let duration_us = start_time.elapsed().as_micros() as u64;
    info!(
        employee_id = %employee.id,
        period_end = %effective_date,
        gross_pay = %gross_pay,
        net_pay = %net_pay,
        warnings = line.warnings.len(),
        duration_us,
        "Payroll line completed"
    );

    Ok(PayrollLineResult {
        calculation_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        employee_id: employee.id.clone(),
        pay_period: input.pay_period,
        nssf: line.nssf,
        shif: line.shif,
        housing_levy: line.housing_levy,
        other_deductions: input.other_deductions.clone(),
        totals: PayrollTotals {
            gross_pay,
            taxable_pay,
            paye_before_relief: line.paye_before_relief,
            personal_relief,
            total_relief,
            paye_after_relief,
            other_deductions_total,
            total_deductions,
            net_pay,
        },
        audit_trace: AuditTrace {
            steps: line.steps,
            warnings: line.warnings,
            duration_us,
        },
    })
}

/// Runs [`process_regular_payroll`] for every input.
///
/// One result is returned per input, in order. A failing line does not stop
/// the run; the caller decides whether to skip, retry or abort it.
pub fn process_payroll_batch<S: RateStore + ?Sized>(
    inputs: &[PayrollInput],
    store: &S,
) -> Vec<EngineResult<PayrollLineResult>> {
    let start_time = Instant::now();
    let results: Vec<_> = inputs
        .iter()
        .map(|input| {
            let result = process_regular_payroll(input, store);
            if let Err(err) = &result {
                warn!(
                    employee_id = %input.employee.id,
                    error = %err,
                    "Payroll line failed"
                );
            }
            result
        })
        .collect();

    let failed = results.iter().filter(|result| result.is_err()).count();
    info!(
        lines = inputs.len(),
        failed,
        duration_us = start_time.elapsed().as_micros() as u64,
        "Payroll batch completed"
    );
    results
}
