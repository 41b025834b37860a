//! Configuration types for payroll calculation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{RateTable, SplitRatio};

/// Metadata about the jurisdiction the configuration describes.
#[derive(Debug, Clone, Deserialize)]
pub struct JurisdictionMetadata {
    /// Short code (e.g., "KE").
    pub code: String,
    /// Human-readable name of the rule set.
    pub name: String,
    /// ISO currency code of all amounts.
    pub currency: String,
    /// Where the rates were taken from.
    pub source_url: String,
}

/// Decimal places used when each kind of amount is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingPolicy {
    /// Places for NSSF contributions; statutory practice is whole shillings.
    #[serde(default)]
    pub nssf_dp: u32,
    /// Places for SHIF, Housing Levy and other deductions.
    #[serde(default = "two_places")]
    pub deduction_dp: u32,
    /// Places for PAYE.
    #[serde(default = "two_places")]
    pub tax_dp: u32,
}

fn two_places() -> u32 {
    2
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self {
            nssf_dp: 0,
            deduction_dp: 2,
            tax_dp: 2,
        }
    }
}

/// Statutory values that are policy rather than rate tables.
///
/// Policies are effective-dated: the most recent policy whose
/// `effective_date` is on or before the payroll date applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatutoryPolicy {
    /// The date from which this policy applies.
    pub effective_date: NaiveDate,
    /// Monthly personal relief offset against PAYE.
    pub personal_relief: Decimal,
    /// NSSF brackets starting below this amount count as tier one.
    pub nssf_tier_one_ceiling: Decimal,
    /// Minimum monthly SHIF employee contribution.
    pub shif_minimum: Decimal,
    /// SHIF rate used when no bracket matches the salary.
    pub shif_default_rate: Decimal,
    /// Split used with the SHIF default rate.
    #[serde(default = "SplitRatio::mirrored")]
    pub shif_default_split: SplitRatio,
    /// Rounding granularity.
    #[serde(default)]
    pub rounding: RoundingPolicy,
}

/// policy.yaml file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyFile {
    /// All policies, in any order.
    pub policies: Vec<StatutoryPolicy>,
}

/// A file in the rates directory.
#[derive(Debug, Clone, Deserialize)]
pub struct RateTablesFile {
    /// The tables defined in this file.
    pub tables: Vec<RateTable>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeductionKind, RateType, ReliefPolicy};

    #[test]
    fn test_rounding_defaults_to_whole_shilling_nssf() {
        let rounding: RoundingPolicy = serde_yaml::from_str("{}").unwrap();
        assert_eq!(rounding, RoundingPolicy::default());
        assert_eq!(rounding.nssf_dp, 0);
        assert_eq!(rounding.deduction_dp, 2);
    }

    #[test]
    fn test_policy_defaults_split_to_mirrored() {
        let yaml = r#"
effective_date: 2025-02-01
personal_relief: "2400"
nssf_tier_one_ceiling: "8000"
shif_minimum: "300"
shif_default_rate: "0.0275"
"#;
        let policy: StatutoryPolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.shif_default_split, SplitRatio::mirrored());
        assert_eq!(policy.personal_relief, Decimal::new(2400, 0));
    }

    #[test]
    fn test_rate_tables_file_parses_table() {
        let yaml = r#"
tables:
  - title: levy
    rate_type: deduction
    effective_from: 2024-03-19
    brackets:
      - { lower_bound: "0", rate: "0.015" }
    split: { employee_percentage: "100", employer_percentage: "100" }
    relief: { kind: fraction, fraction: "0.15" }
"#;
        let file: RateTablesFile = serde_yaml::from_str(yaml).unwrap();
        let table = &file.tables[0];
        assert_eq!(table.title, DeductionKind::HousingLevy);
        assert_eq!(table.rate_type, RateType::Deduction);
        assert_eq!(table.brackets[0].upper_bound, None);
        assert_eq!(table.effective_to, None);
        assert_eq!(table.employee_category, None);
        assert_eq!(
            table.relief,
            ReliefPolicy::Fraction {
                fraction: Decimal::new(15, 2)
            }
        );
    }
}
