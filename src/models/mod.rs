//! Core data models for the Payroll Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod employee;
mod pay_period;
mod payroll_input;
mod payroll_result;
mod rate_table;

pub use employee::{DEFAULT_EMPLOYEE_CATEGORY, Employee};
pub use pay_period::PayPeriod;
pub use payroll_input::{DeductionFlags, FixedDeduction, FormulaOverrides, PayrollInput};
pub use payroll_result::{
    AuditStep, AuditTrace, AuditWarning, DeductionContribution, NssfContribution,
    PayrollLineResult, PayrollTotals,
};
pub use rate_table::{Bracket, DeductionKind, RateTable, RateType, ReliefPolicy, SplitRatio};
