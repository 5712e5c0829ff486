#![forbid(unsafe_code)]

//! Sales Report Engine (sre): named analytical reports over e-commerce
//! order records.
//!
//! A report is a parameterized SQL template plus a normalization pipeline.
//! The engine has four parts:
//! 1. **Registry** of report definitions addressable by id or menu position
//! 2. **Executor** that binds named parameters against a read-only SQLite session
//! 3. **Normalizer** that pivots, buckets, scales and ranks raw rows into
//!    chart-ready series and KPI metrics
//! 4. **Dispatcher** driving each selection from `Idle` to `Rendered` or `Failed`
//!
//! # Library usage
//!
//! ```rust,no_run
//! use sales_report_engine::prelude::*;
//!
//! # fn main() -> sales_report_engine::core::errors::Result<()> {
//! let config = Config::load(None)?;
//! let registry = builtin_registry(&config.reports)?;
//! let db = FileProvider::from_config(&config.database).connect()?;
//! let mut dispatcher = Dispatcher::new(&registry);
//! let selection = dispatcher.select("revenue-trend", &[("period".to_string(), "quarterly".to_string())])?;
//! # let _ = (selection, db);
//! # Ok(())
//! # }
//! ```

pub mod prelude;

pub mod core;
pub mod db;
pub mod logger;
pub mod normalize;
pub mod report;
