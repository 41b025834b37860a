//! Rate and policy configuration for the Payroll Engine.
//!
//! This module provides the [`RateStore`] seam the calculators read from,
//! an in-memory validated [`RateBook`], and [`ConfigLoader`] which builds a
//! rate book from a directory of YAML files.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/kenya").unwrap();
//! println!("Loaded rules: {}", config.jurisdiction().name);
//! ```

mod loader;
mod rate_book;
mod types;

pub use loader::ConfigLoader;
pub use rate_book::{RateBook, RateQuery, RateSchedule, RateStore};
pub use types::{
    JurisdictionMetadata, PolicyFile, RateTablesFile, RoundingPolicy, StatutoryPolicy,
};
