//! Statutory Payroll Engine for Kenyan payroll
//!
//! This crate computes a monthly payroll line for an employee: NSSF pension
//! contributions, SHIF health insurance, the Affordable Housing Levy, PAYE
//! income tax with personal and deduction reliefs, and net pay. Every rate is
//! read from effective-dated rate tables, so a change in statute is a change
//! in configuration.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
