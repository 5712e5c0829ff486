//! Chart-ready report output: category index, aligned series, KPI metrics.

#![allow(missing_docs)]

use serde::Serialize;

use crate::core::errors::{Result, SreError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

/// Single-value callout with an optional change indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: MetricValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
}

/// Normalized report output.
///
/// Every series holds exactly `index.len()` finite values. Construction goes
/// through [`NormalizedResult::push_series`], which enforces that.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResult {
    pub report_id: String,
    index: Vec<String>,
    series: Vec<Series>,
    metrics: Vec<Metric>,
}

impl NormalizedResult {
    #[must_use]
    pub fn new(report_id: impl Into<String>, index: Vec<String>) -> Self {
        Self {
            report_id: report_id.into(),
            index,
            series: Vec::new(),
            metrics: Vec::new(),
        }
    }

    /// Append a series aligned with the index. Non-finite values become 0.
    pub fn push_series(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(SreError::normalization(format!(
                "series {name:?} has {} values for an index of {}",
                values.len(),
                self.index.len()
            )));
        }
        let values = values
            .into_iter()
            .map(|v| if v.is_finite() { v } else { 0.0 })
            .collect();
        self.series.push(Series { name, values });
        Ok(())
    }

    pub fn push_metric(&mut self, metric: Metric) {
        self.metrics.push(metric);
    }

    #[must_use]
    pub fn index(&self) -> &[String] {
        &self.index
    }

    #[must_use]
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    #[must_use]
    pub fn series_named(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn metric_named(&self, label: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.label == label)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() && self.metrics.is_empty()
    }

    /// Structural equality with numeric tolerance.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= tolerance;
        self.report_id == other.report_id
            && self.index == other.index
            && self.series.len() == other.series.len()
            && self.series.iter().zip(&other.series).all(|(a, b)| {
                a.name == b.name && a.values.iter().zip(&b.values).all(|(x, y)| close(*x, *y))
            })
            && self.metrics.len() == other.metrics.len()
            && self.metrics.iter().zip(&other.metrics).all(|(a, b)| {
                a.label == b.label
                    && match (&a.value, &b.value) {
                        (MetricValue::Number(x), MetricValue::Number(y)) => close(*x, *y),
                        (MetricValue::Text(x), MetricValue::Text(y)) => x == y,
                        _ => false,
                    }
                    && match (a.delta, b.delta) {
                        (Some(x), Some(y)) => close(x, y),
                        (None, None) => true,
                        _ => false,
                    }
            })
    }
}
