//! Rectangular query results: ordered named columns of scalar values.

#![allow(missing_docs)]

use std::cmp::Ordering;
use std::fmt;

use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::core::errors::{Result, SreError};

/// A single scalar cell. Dates arrive as ISO-8601 text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the cell. Text that parses as a number counts.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) if v.is_finite() => Some(*v),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Self::Float(_) | Self::Null => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Category key used for indexes and pivot columns.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => format_float_key(*v),
            Self::Text(s) => s.clone(),
        }
    }

    /// Natural ordering: nulls first, numbers numerically, then text lexically.
    #[must_use]
    pub fn natural_cmp(&self, other: &Self) -> Ordering {
        match (self.rank(), other.rank()) {
            (0, 0) => Ordering::Equal,
            (1, 1) => {
                let a = self.as_f64().unwrap_or(0.0);
                let b = other.as_f64().unwrap_or(0.0);
                a.total_cmp(&b)
            }
            (2, 2) => self.key().cmp(&other.key()),
            (a, b) => a.cmp(&b),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Int(_) | Self::Float(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            _ => f.write_str(&self.key()),
        }
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(v) => Self::Int(v),
            ValueRef::Real(v) => Self::Float(v),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                Self::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Whole floats render without a fractional part so `15.0` keys as `15`.
fn format_float_key(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// Result set with a shared row count across columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RawTable {
    columns: Vec<Column>,
    rows: usize,
}

impl RawTable {
    /// Empty table with the given column names.
    #[must_use]
    pub fn with_columns<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            columns: names
                .iter()
                .map(|n| Column {
                    name: n.as_ref().to_string(),
                    values: Vec::new(),
                })
                .collect(),
            rows: 0,
        }
    }

    /// Build from row-major data. Every row must match the column count.
    pub fn from_rows<S: AsRef<str>>(names: &[S], rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut table = Self::with_columns(names);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(SreError::normalization(format!(
                "row has {} values, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.values.push(value);
        }
        self.rows += 1;
        Ok(())
    }

    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Column by name, or a normalization error naming the missing column.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| {
                SreError::normalization(format!(
                    "missing column {name:?} (have: {})",
                    self.columns
                        .iter()
                        .map(|c| c.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }

    pub fn values(&self, name: &str) -> Result<&[Value]> {
        Ok(&self.column(name)?.values)
    }

    /// Numeric view of a column; nulls and non-numeric cells become 0.
    pub fn numeric(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self
            .values(name)?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0))
            .collect())
    }

    pub fn keys(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.values(name)?.iter().map(Value::key).collect())
    }

    /// Replace a column in place or append it when absent.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        if !self.columns.is_empty() && values.len() != self.rows {
            return Err(SreError::normalization(format!(
                "column {name:?} has {} values, table has {} rows",
                values.len(),
                self.rows
            )));
        }
        if self.columns.is_empty() {
            self.rows = values.len();
        }
        if let Some(existing) = self.columns.iter_mut().find(|c| c.name == name) {
            existing.values = values;
        } else {
            self.columns.push(Column {
                name: name.to_string(),
                values,
            });
        }
        Ok(())
    }

    pub fn set_numeric(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        self.set_column(name, values.into_iter().map(Value::Float).collect())
    }

    /// New table holding the given rows in the given order.
    #[must_use]
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: indices
                    .iter()
                    .filter_map(|&i| c.values.get(i).cloned())
                    .collect(),
            })
            .collect();
        Self {
            columns,
            rows: indices.iter().filter(|&&i| i < self.rows).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawTable {
        RawTable::from_rows(
            &["order_year", "revenue"],
            vec![
                vec![Value::Int(2021), Value::Float(1_000_000.0)],
                vec![Value::Int(2022), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn numeric_coerces_nulls_to_zero() {
        let table = sample();
        assert_eq!(table.numeric("revenue").unwrap(), vec![1_000_000.0, 0.0]);
    }

    #[test]
    fn missing_column_is_normalization_error() {
        let err = sample().column("brand").unwrap_err();
        assert_eq!(err.code(), "SRE-2201");
        assert!(err.to_string().contains("brand"));
    }

    #[test]
    fn ragged_row_rejected() {
        let mut table = sample();
        assert!(table.push_row(vec![Value::Int(2023)]).is_err());
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn set_column_checks_length() {
        let mut table = sample();
        assert!(table.set_numeric("share", vec![1.0]).is_err());
        table.set_numeric("share", vec![1.0, 2.0]).unwrap();
        assert!(table.has_column("share"));
    }

    #[test]
    fn float_keys_drop_whole_fraction() {
        assert_eq!(Value::Float(15.0).key(), "15");
        assert_eq!(Value::Float(14.5).key(), "14.5");
        assert_eq!(Value::Int(2021).key(), "2021");
    }

    #[test]
    fn natural_order_puts_numbers_before_text() {
        let mut values = vec![
            Value::from("Delhi"),
            Value::Int(10),
            Value::Float(2.5),
            Value::Null,
        ];
        values.sort_by(Value::natural_cmp);
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Float(2.5),
                Value::Int(10),
                Value::from("Delhi")
            ]
        );
    }

    #[test]
    fn take_rows_reorders() {
        let table = sample().take_rows(&[1, 0]);
        assert_eq!(table.keys("order_year").unwrap(), vec!["2022", "2021"]);
        assert_eq!(table.row_count(), 2);
    }
}
