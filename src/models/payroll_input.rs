//! Inputs to a single payroll line.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Employee, PayPeriod};
use crate::error::{EngineError, EngineResult};

fn enabled() -> bool {
    true
}

/// Switches for the optional statutory deductions.
///
/// The Housing Levy has no switch; it is always deducted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionFlags {
    /// Deduct NSSF pension contributions.
    #[serde(default = "enabled")]
    pub deduct_nssf: bool,
    /// Deduct SHIF health insurance (accepts the legacy `deduct_nhif` key).
    #[serde(default = "enabled", alias = "deduct_nhif")]
    pub deduct_shif: bool,
}

impl Default for DeductionFlags {
    fn default() -> Self {
        Self {
            deduct_nssf: true,
            deduct_shif: true,
        }
    }
}

/// Per-deduction formula override ids, selecting alternative rate tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaOverrides {
    /// Override for the NSSF table.
    #[serde(default)]
    pub nssf: Option<String>,
    /// Override for the SHIF table.
    #[serde(default)]
    pub shif: Option<String>,
    /// Override for the Housing Levy table.
    #[serde(default)]
    pub housing_levy: Option<String>,
    /// Override for the PAYE table.
    #[serde(default)]
    pub income_tax: Option<String>,
}

/// A fixed post-tax deduction supplied by the caller (loan, SACCO, union dues).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedDeduction {
    /// Short code for the deduction (e.g., "sacco").
    pub code: String,
    /// Description printed on the payslip.
    #[serde(default)]
    pub description: String,
    /// The amount to deduct.
    pub amount: Decimal,
}

/// Everything the orchestrator needs to compute one payroll line.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{Employee, PayPeriod, PayrollInput};
/// use rust_decimal::Decimal;
///
/// let input = PayrollInput::new(
///     Employee::new("emp_001", "Wanjiku Kamau"),
///     Decimal::new(4978400, 2),
///     PayPeriod::month(2025, 3).unwrap(),
/// );
/// assert!(input.flags.deduct_nssf);
/// assert!(input.flags.deduct_shif);
/// assert!(input.other_deductions.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollInput {
    /// The employee being paid.
    pub employee: Employee,
    /// Gross pay for the period.
    pub gross_pay: Decimal,
    /// The period being paid.
    pub pay_period: PayPeriod,
    /// Deduction switches.
    #[serde(default)]
    pub flags: DeductionFlags,
    /// Formula overrides.
    #[serde(default)]
    pub overrides: FormulaOverrides,
    /// Post-tax deductions.
    #[serde(default)]
    pub other_deductions: Vec<FixedDeduction>,
}

impl PayrollInput {
    /// Creates an input with every deduction enabled and no overrides.
    pub fn new(employee: Employee, gross_pay: Decimal, pay_period: PayPeriod) -> Self {
        Self {
            employee,
            gross_pay,
            pay_period,
            flags: DeductionFlags::default(),
            overrides: FormulaOverrides::default(),
            other_deductions: Vec::new(),
        }
    }

    /// Checks the employee record, pay period and fixed deductions.
    ///
    /// # Errors
    ///
    /// - `InvalidEmployee` for a blank id or category
    /// - `InvalidPayPeriod` if the period ends before it starts
    /// - `CalculationError` for a negative fixed deduction
    pub fn validate(&self) -> EngineResult<()> {
        self.employee.validate()?;
        self.pay_period.validate()?;
        if let Some(negative) = self
            .other_deductions
            .iter()
            .find(|deduction| deduction.amount < Decimal::ZERO)
        {
            return Err(EngineError::CalculationError {
                message: format!(
                    "Fixed deduction '{}' has negative amount {}",
                    negative.code, negative.amount
                ),
            });
        }
        Ok(())
    }

    /// Sum of the fixed post-tax deductions.
    pub fn other_deductions_total(&self) -> Decimal {
        self.other_deductions
            .iter()
            .map(|deduction| deduction.amount)
            .sum()
    }
}
