//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading statutory
//! rate configuration from YAML files.

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::rate_book::{RateBook, RateQuery, RateSchedule, RateStore};
use super::types::{JurisdictionMetadata, PolicyFile, RateTablesFile, StatutoryPolicy};

/// Loads and provides access to statutory rate configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory,
/// validates them into a [`RateBook`], and serves as the engine's
/// [`RateStore`].
///
/// # Directory Structure
///
/// ```text
/// config/kenya/
/// ├── jurisdiction.yaml    # Jurisdiction metadata
/// ├── policy.yaml          # Effective-dated statutory policy values
/// └── rates/
///     ├── income_tax.yaml  # PAYE bands
///     └── nssf.yaml        # Any number of files, each with `tables: [...]`
/// ```
///
/// # Example
///
/// ```
/// use payroll_engine::config::{ConfigLoader, RateStore};
/// use chrono::NaiveDate;
///
/// let loader = ConfigLoader::load("./config/kenya").unwrap();
/// assert_eq!(loader.jurisdiction().currency, "KES");
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
/// let policy = loader.statutory_policy(date).unwrap();
/// assert_eq!(policy.personal_relief.to_string(), "2400");
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    jurisdiction: JurisdictionMetadata,
    rate_book: RateBook,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - A rate table's brackets do not partition `[0, ∞)`
    /// - Two tables for the same deduction overlap in time
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let jurisdiction =
            Self::load_yaml::<JurisdictionMetadata>(&path.join("jurisdiction.yaml"))?;
        let policy_file = Self::load_yaml::<PolicyFile>(&path.join("policy.yaml"))?;
        if policy_file.policies.is_empty() {
            return Err(EngineError::ConfigParseError {
                path: path.join("policy.yaml").display().to_string(),
                message: "no policies defined".to_string(),
            });
        }

        let tables = Self::load_rate_tables(&path.join("rates"))?;
        debug!(
            jurisdiction = %jurisdiction.code,
            tables = tables.len(),
            policies = policy_file.policies.len(),
            "Loaded payroll configuration"
        );

        let rate_book = RateBook::new(tables, policy_file.policies)?;

        Ok(Self {
            jurisdiction,
            rate_book,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads every table from the `.yaml` files in the rates directory.
    fn load_rate_tables(rates_dir: &Path) -> EngineResult<Vec<crate::models::RateTable>> {
        let rates_dir_str = rates_dir.display().to_string();

        let entries = fs::read_dir(rates_dir).map_err(|_| EngineError::ConfigNotFound {
            path: rates_dir_str.clone(),
        })?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: rates_dir_str.clone(),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no rate files found)", rates_dir_str),
            });
        }

        let mut tables = Vec::new();
        for file in &files {
            let rate_file = Self::load_yaml::<RateTablesFile>(file)?;
            debug!(file = %file.display(), tables = rate_file.tables.len(), "Loaded rate file");
            tables.extend(rate_file.tables);
        }

        Ok(tables)
    }

    /// Returns the jurisdiction metadata.
    pub fn jurisdiction(&self) -> &JurisdictionMetadata {
        &self.jurisdiction
    }

    /// Returns the validated rate book.
    pub fn rate_book(&self) -> &RateBook {
        &self.rate_book
    }
}

impl RateStore for ConfigLoader {
    fn load_rates(&self, query: &RateQuery) -> EngineResult<Option<RateSchedule>> {
        self.rate_book.load_rates(query)
    }

    fn statutory_policy(&self, date: NaiveDate) -> EngineResult<StatutoryPolicy> {
        self.rate_book.statutory_policy(date)
    }
}
