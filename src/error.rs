//! Error types for the Payroll Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while computing a payroll line.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the Payroll Engine.
///
/// All fallible operations in the engine return this error type. Zero or
/// negative pay is never an error; these variants describe configuration
/// problems and malformed caller input.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/policy.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/policy.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A rate table's brackets do not partition `[0, ∞)`.
    #[error("Invalid rate table '{title}' effective {effective_from}: {message}")]
    InvalidRateTable {
        /// The title of the offending table.
        title: String,
        /// The start of the table's effective interval.
        effective_from: NaiveDate,
        /// What is wrong with the brackets.
        message: String,
    },

    /// Two tables for the same key cover the same date.
    #[error(
        "Overlapping rate tables for '{title}' (category {category}): \
         effective {first} and {second}"
    )]
    OverlappingRateTables {
        /// The title shared by both tables.
        title: String,
        /// The employee category shared by both tables, or `*`.
        category: String,
        /// Start of the first table's interval.
        first: NaiveDate,
        /// Start of the second table's interval.
        second: NaiveDate,
    },

    /// Two consecutive tables for the same key leave dates uncovered.
    #[error(
        "Gap in rate tables for '{title}' (category {category}): {gap_start} to {gap_end} uncovered"
    )]
    RateTableGap {
        /// The title shared by both tables.
        title: String,
        /// The employee category shared by both tables, or `*`.
        category: String,
        /// First uncovered date.
        gap_start: NaiveDate,
        /// Last uncovered date.
        gap_end: NaiveDate,
    },

    /// A formula override id was requested but no such table exists.
    #[error("Formula '{formula_id}' not found for '{title}' on date {date}")]
    FormulaNotFound {
        /// The deduction or tax title.
        title: String,
        /// The requested override id.
        formula_id: String,
        /// The effective date of the lookup.
        date: NaiveDate,
    },

    /// No statutory policy is effective on the given date.
    #[error("No statutory policy effective on date {date}")]
    PolicyNotFound {
        /// The date for which the policy was requested.
        date: NaiveDate,
    },

    /// An employee record was invalid or contained inconsistent data.
    #[error("Invalid employee field '{field}': {message}")]
    InvalidEmployee {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// The pay period's dates are inconsistent.
    #[error("Invalid pay period {start_date} to {end_date}: {message}")]
    InvalidPayPeriod {
        /// First day of the period.
        start_date: NaiveDate,
        /// Last day of the period.
        end_date: NaiveDate,
        /// A description of the problem.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
