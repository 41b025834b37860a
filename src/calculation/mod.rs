//! Calculation logic for the Payroll Engine.
//!
//! This module contains the progressive bracket evaluator and the statutory
//! calculators built on it: NSSF pension contributions, SHIF health
//! insurance, generic rate-table deductions such as the Housing Levy, and
//! PAYE income tax. The payroll orchestrator combines them into a single
//! payroll line, and the batch runner applies it across a payroll run.

mod bracket;
mod income_tax;
mod nssf;
mod other_deduction;
mod payroll;
mod rounding;
mod shif;

pub use bracket::{BracketSlice, evaluate, evaluate_slices};
pub use income_tax::{INCOME_TAX_REFERENCE, IncomeTaxResult, calculate_income_tax};
pub use nssf::{NSSF_REFERENCE, NssfResult, calculate_nssf};
pub use other_deduction::{HOUSING_LEVY_REFERENCE, OtherDeductionResult, calculate_other_deduction};
pub use payroll::{NEGATIVE_GROSS_WARNING, process_payroll_batch, process_regular_payroll};
pub use rounding::round_money;
pub use shif::{
    SHIF_DEFAULT_RATE_WARNING, SHIF_MINIMUM_WARNING, SHIF_REFERENCE, ShifResult, calculate_shif,
};
