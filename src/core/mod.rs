//! Core types: errors, configuration, tabular and normalized data.

pub mod config;
pub mod errors;
pub mod normalized;
pub mod table;
