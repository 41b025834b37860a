//! Employee model.
//!
//! The payroll engine only needs the identity of the employee and the
//! category used to select rate tables; everything else about the employee
//! lives in the surrounding HR records.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The category used when no category is supplied by the caller.
pub const DEFAULT_EMPLOYEE_CATEGORY: &str = "regular";

fn default_category() -> String {
    DEFAULT_EMPLOYEE_CATEGORY.to_string()
}

/// Represents an employee whose payroll line is being calculated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name, carried through to the result for payslips.
    #[serde(default)]
    pub name: String,
    /// The category used to select rate tables (e.g., "regular", "casual").
    #[serde(default = "default_category")]
    pub employee_category: String,
}

impl Employee {
    /// Creates an employee in the default category.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::Employee;
    ///
    /// let employee = Employee::new("emp_001", "Wanjiku Kamau");
    /// assert_eq!(employee.employee_category, "regular");
    /// ```
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            employee_category: default_category(),
        }
    }

    /// Returns a copy of this employee in a different rate category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.employee_category = category.into();
        self
    }

    /// Checks that the record can be used for a payroll line.
    pub fn validate(&self) -> EngineResult<()> {
        if self.id.trim().is_empty() {
            return Err(EngineError::InvalidEmployee {
                field: "id".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.employee_category.trim().is_empty() {
            return Err(EngineError::InvalidEmployee {
                field: "employee_category".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
