//! Interval-keyed rate lookup.
//!
//! The [`RateStore`] trait is the engine's only view of rate configuration.
//! [`RateBook`] is the in-memory implementation: it validates every table
//! once on construction so that malformed brackets, overlapping effective
//! intervals and gaps between intervals surface as configuration errors
//! instead of wrong payslips.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{Bracket, DeductionKind, RateTable, RateType, ReliefPolicy, SplitRatio};

use super::types::StatutoryPolicy;

/// Identifies the rate table wanted by a calculator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateQuery {
    /// The tax or deduction.
    pub title: DeductionKind,
    /// Deduction or income.
    pub rate_type: RateType,
    /// The employee's category.
    pub category: String,
    /// The date the rates must be in force on.
    pub effective_date: NaiveDate,
    /// An explicit override table, if requested.
    pub formula_id: Option<String>,
}

impl RateQuery {
    /// Creates a query using the title's natural rate type and no override.
    pub fn new(title: DeductionKind, category: &str, effective_date: NaiveDate) -> Self {
        Self {
            rate_type: title.rate_type(),
            title,
            category: category.to_string(),
            effective_date,
            formula_id: None,
        }
    }

    /// Sets the rate type explicitly.
    pub fn with_rate_type(mut self, rate_type: RateType) -> Self {
        self.rate_type = rate_type;
        self
    }

    /// Requests an override table.
    pub fn with_formula(mut self, formula_id: Option<&str>) -> Self {
        self.formula_id = formula_id.map(str::to_string);
        self
    }
}

/// The rates resolved for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSchedule {
    /// Start of the matched table's effective interval.
    pub effective_from: NaiveDate,
    /// The matched table's override id, if any.
    pub formula_id: Option<String>,
    /// Brackets sorted ascending by lower bound.
    pub brackets: Vec<Bracket>,
    /// Employee/employer split.
    pub split: SplitRatio,
    /// Relief on the employee share.
    pub relief: ReliefPolicy,
}

impl From<&RateTable> for RateSchedule {
    fn from(table: &RateTable) -> Self {
        Self {
            effective_from: table.effective_from,
            formula_id: table.formula_id.clone(),
            brackets: table.sorted_brackets(),
            split: table.split,
            relief: table.relief,
        }
    }
}

/// Source of rate tables and statutory policy.
///
/// Implementations must be read-consistent for the duration of one
/// calculation.
pub trait RateStore {
    /// Resolves the rates for a query.
    ///
    /// Returns `Ok(None)` when nothing is configured for the date, which the
    /// calculators treat as "no deduction". An override id that matches no
    /// table is an error.
    fn load_rates(&self, query: &RateQuery) -> EngineResult<Option<RateSchedule>>;

    /// Returns the statutory policy in force on `date`.
    fn statutory_policy(&self, date: NaiveDate) -> EngineResult<StatutoryPolicy>;
}

/// In-memory, validated collection of rate tables and policies.
///
/// # Example
///
/// ```
/// use payroll_engine::config::{RateBook, RateQuery, RateStore};
/// use payroll_engine::models::{Bracket, DeductionKind, RateTable, RateType};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let table = RateTable {
///     title: DeductionKind::HousingLevy,
///     rate_type: RateType::Deduction,
///     employee_category: None,
///     effective_from: NaiveDate::from_ymd_opt(2024, 3, 19).unwrap(),
///     effective_to: None,
///     formula_id: None,
///     brackets: vec![Bracket::unbounded(Decimal::ZERO, Decimal::new(15, 3))],
///     split: Default::default(),
///     relief: Default::default(),
/// };
/// let book = RateBook::new(vec![table], vec![]).unwrap();
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
/// let query = RateQuery::new(DeductionKind::HousingLevy, "regular", date);
/// assert!(book.load_rates(&query).unwrap().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RateBook {
    tables: Vec<RateTable>,
    /// Sorted oldest first.
    policies: Vec<StatutoryPolicy>,
}

impl RateBook {
    /// Builds a rate book, rejecting malformed, overlapping or
    /// non-contiguous tables.
    pub fn new(tables: Vec<RateTable>, policies: Vec<StatutoryPolicy>) -> EngineResult<Self> {
        for table in &tables {
            if let Some(message) = table.partition_error() {
                return Err(EngineError::InvalidRateTable {
                    title: table.title.to_string(),
                    effective_from: table.effective_from,
                    message,
                });
            }
            if table.effective_to.is_some_and(|to| to < table.effective_from) {
                return Err(EngineError::InvalidRateTable {
                    title: table.title.to_string(),
                    effective_from: table.effective_from,
                    message: "effective_to precedes effective_from".to_string(),
                });
            }
        }

        for (index, first) in tables.iter().enumerate() {
            for second in &tables[index + 1..] {
                if same_key(first, second) && first.overlaps(second) {
                    return Err(EngineError::OverlappingRateTables {
                        title: first.title.to_string(),
                        category: category_label(first),
                        first: first.effective_from,
                        second: second.effective_from,
                    });
                }
            }
        }
        check_continuity(&tables)?;

        let mut policies = policies;
        policies.sort_by(|a, b| a.effective_date.cmp(&b.effective_date));

        Ok(Self { tables, policies })
    }

    fn find_table(&self, query: &RateQuery, category: Option<&str>) -> Option<&RateTable> {
        self.tables.iter().find(|table| {
            table.title == query.title
                && table.rate_type == query.rate_type
                && table.employee_category.as_deref() == category
                && table.formula_id.as_deref() == query.formula_id.as_deref()
                && table.covers(query.effective_date)
        })
    }
}

fn same_key(a: &RateTable, b: &RateTable) -> bool {
    a.title == b.title
        && a.rate_type == b.rate_type
        && a.employee_category == b.employee_category
        && a.formula_id == b.formula_id
}

fn category_label(table: &RateTable) -> String {
    table
        .employee_category
        .clone()
        .unwrap_or_else(|| "*".to_string())
}

/// Rejects a break in coverage between consecutive tables of one key.
///
/// Must run after the overlap check, so at most the last table of a key is
/// open ended.
fn check_continuity(tables: &[RateTable]) -> EngineResult<()> {
    let mut ordered: Vec<&RateTable> = tables.iter().collect();
    ordered.sort_by(|a, b| a.effective_from.cmp(&b.effective_from));

    for (index, current) in ordered.iter().enumerate() {
        let Some(end) = current.effective_to else {
            continue;
        };
        let Some(next) = ordered[index + 1..]
            .iter()
            .find(|later| same_key(current, later))
        else {
            continue;
        };
        let Some(gap_start) = end.succ_opt() else {
            continue;
        };
        if gap_start < next.effective_from {
            return Err(EngineError::RateTableGap {
                title: current.title.to_string(),
                category: category_label(current),
                gap_start,
                gap_end: next.effective_from.pred_opt().unwrap_or(gap_start),
            });
        }
    }
    Ok(())
}

impl RateStore for RateBook {
    fn load_rates(&self, query: &RateQuery) -> EngineResult<Option<RateSchedule>> {
        let table = self
            .find_table(query, Some(query.category.as_str()))
            .or_else(|| self.find_table(query, None));

        match (table, &query.formula_id) {
            (Some(table), _) => {
                debug!(
                    title = %query.title,
                    category = %query.category,
                    date = %query.effective_date,
                    table_effective_from = %table.effective_from,
                    "Resolved rate table"
                );
                Ok(Some(RateSchedule::from(table)))
            }
            (None, Some(formula_id)) => Err(EngineError::FormulaNotFound {
                title: query.title.to_string(),
                formula_id: formula_id.clone(),
                date: query.effective_date,
            }),
            (None, None) => {
                debug!(
                    title = %query.title,
                    category = %query.category,
                    date = %query.effective_date,
                    "No rate table configured"
                );
                Ok(None)
            }
        }
    }

    fn statutory_policy(&self, date: NaiveDate) -> EngineResult<StatutoryPolicy> {
        self.policies
            .iter()
            .rfind(|policy| policy.effective_date <= date)
            .cloned()
            .ok_or(EngineError::PolicyNotFound { date })
    }
}
