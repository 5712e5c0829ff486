//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use sales_report_engine::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, SreError};
pub use crate::core::normalized::{Metric, MetricValue, NormalizedResult, Series};

// Database
pub use crate::db::connection::{ConnectionProvider, Database, FileProvider};
pub use crate::db::executor::ParamValue;

// Normalizer
pub use crate::normalize::pipeline::{Aggregation, MetricSpec, Pipeline};
pub use crate::normalize::rules::{AggFunc, DisplayUnit};

// Reports
pub use crate::report::catalog::builtin_registry;
pub use crate::report::definition::{ReportDefinition, ReportVariant};
pub use crate::report::dispatch::{DispatchOutcome, DispatchState, Dispatcher, RenderSurface, Warning};
pub use crate::report::params::ParameterSpec;
pub use crate::report::registry::ReportRegistry;

// Logging
pub use crate::logger::activity::ActivityLog;
