//! Pay period model.
//!
//! This module contains the [`PayPeriod`] type that defines the calculation
//! window for a payroll line and the date used to select rate tables.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Represents a pay period with its inclusive date range.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayPeriod;
/// use chrono::NaiveDate;
///
/// let period = PayPeriod::month(2025, 3).unwrap();
///
/// assert_eq!(period.start_date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
/// assert_eq!(period.end_date, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// The start date of the pay period (inclusive).
    pub start_date: NaiveDate,
    /// The end date of the pay period (inclusive).
    pub end_date: NaiveDate,
}

impl PayPeriod {
    /// Creates a pay period from its start and end dates.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> EngineResult<Self> {
        let period = Self {
            start_date,
            end_date,
        };
        period.validate()?;
        Ok(period)
    }

    /// Creates the calendar-month pay period for the given year and month.
    ///
    /// Returns `None` if the month is out of range.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start_date = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            start_date,
            end_date: next_month.pred_opt()?,
        })
    }

    /// Checks if a given date falls within this pay period (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// The date used to select rate tables and statutory policy.
    ///
    /// Deductions follow the rules in force at the close of the period.
    pub fn effective_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Checks that the end date does not precede the start date.
    pub fn validate(&self) -> EngineResult<()> {
        if self.end_date < self.start_date {
            return Err(EngineError::InvalidPayPeriod {
                start_date: self.start_date,
                end_date: self.end_date,
                message: "end date precedes start date".to_string(),
            });
        }
        Ok(())
    }
}
