//! Declarative per-report normalization: ordered table steps, a final shape,
//! and KPI metric extraction.

#![allow(missing_docs)]

use serde::Serialize;

use crate::core::errors::{Result, SreError};
use crate::core::normalized::{Metric, MetricValue, NormalizedResult};
use crate::core::table::{RawTable, Value};
use crate::normalize::rules::{
    self, AggFunc, DEFAULT_PRECISION, DisplayUnit, derived_ratio_with, growth, growth_partitioned,
    rolling_mean, round_to, safe_quotient, share_of_total, top_n_indices,
};

/// Output column of a group-by step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub column: String,
    pub func: AggFunc,
    pub into: String,
}

impl Aggregation {
    #[must_use]
    pub fn new(column: &str, func: AggFunc, into: &str) -> Self {
        Self {
            column: column.to_string(),
            func,
            into: into.to_string(),
        }
    }
}

/// One table transformation. Steps run in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Snap a continuous column to multiples of `granularity` (round half up).
    Bucket { column: String, granularity: f64 },
    /// Divide by the unit's divisor and round to 2 decimals.
    Scale {
        column: String,
        unit: DisplayUnit,
        into: String,
    },
    /// Row-wise `part / total * 100`.
    Ratio {
        part: String,
        total: String,
        into: String,
        precision: u32,
    },
    /// Row-wise `numerator / denominator`.
    Quotient {
        numerator: String,
        denominator: String,
        into: String,
        precision: u32,
    },
    /// Each row's share of the column total, in percent.
    Share { column: String, into: String },
    /// Period-over-period change in percent, optionally per partition.
    Growth {
        column: String,
        into: String,
        partition: Option<String>,
    },
    GroupBy {
        keys: Vec<String>,
        aggregations: Vec<Aggregation>,
    },
    /// Stable sort on a numeric column.
    SortBy { column: String, descending: bool },
    /// Stable sort, then keep the first `n` rows.
    TopN {
        column: String,
        n: usize,
        descending: bool,
    },
    /// Trailing mean over `window` rows.
    Rolling {
        column: String,
        window: usize,
        into: String,
    },
    /// Replace the table with the distribution of one column.
    ValueCounts { column: String, into: String },
}

/// Final layout of the stepped table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    /// Index from one column in row order, one series per listed column.
    Columns {
        index: String,
        series: Vec<(String, String)>,
    },
    /// Long to wide: one series per distinct value of `columns`.
    Pivot {
        index: String,
        columns: String,
        values: String,
    },
    /// Metrics only.
    Empty,
}

/// Which table a metric reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Raw,
    Stepped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricSource {
    Last { column: String },
    First { column: String },
    /// Text of the first row, e.g. the leading brand name.
    FirstText { column: String },
    LastText { column: String },
    Aggregate { column: String, func: AggFunc },
    RowCount,
    /// Percentage of rows with `column <= threshold`.
    ShareAtMost { column: String, threshold: f64 },
    /// Percentage of rows with `column > threshold`.
    ShareAbove { column: String, threshold: f64 },
    /// Percentage of keys inactive for more than `days` before the latest date.
    Inactive {
        key: String,
        date: String,
        days: i64,
    },
}

/// Single-value KPI extracted from a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSpec {
    pub label: String,
    pub stage: Stage,
    pub source: MetricSource,
    pub unit: DisplayUnit,
    pub precision: u32,
    /// Column whose last value is reported as the metric's delta.
    pub delta: Option<String>,
}

impl MetricSpec {
    fn new(label: &str, source: MetricSource) -> Self {
        Self {
            label: label.to_string(),
            stage: Stage::Stepped,
            source,
            unit: DisplayUnit::Rupees,
            precision: DEFAULT_PRECISION,
            delta: None,
        }
    }

    #[must_use]
    pub fn last(label: &str, column: &str) -> Self {
        Self::new(
            label,
            MetricSource::Last {
                column: column.to_string(),
            },
        )
    }

    #[must_use]
    pub fn first(label: &str, column: &str) -> Self {
        Self::new(
            label,
            MetricSource::First {
                column: column.to_string(),
            },
        )
    }

    #[must_use]
    pub fn first_text(label: &str, column: &str) -> Self {
        Self::new(
            label,
            MetricSource::FirstText {
                column: column.to_string(),
            },
        )
    }

    #[must_use]
    pub fn last_text(label: &str, column: &str) -> Self {
        Self::new(
            label,
            MetricSource::LastText {
                column: column.to_string(),
            },
        )
    }

    #[must_use]
    pub fn aggregate(label: &str, column: &str, func: AggFunc) -> Self {
        Self::new(
            label,
            MetricSource::Aggregate {
                column: column.to_string(),
                func,
            },
        )
    }

    #[must_use]
    pub fn row_count(label: &str) -> Self {
        Self::new(label, MetricSource::RowCount)
    }

    #[must_use]
    pub fn share_at_most(label: &str, column: &str, threshold: f64) -> Self {
        Self::new(
            label,
            MetricSource::ShareAtMost {
                column: column.to_string(),
                threshold,
            },
        )
    }

    #[must_use]
    pub fn share_above(label: &str, column: &str, threshold: f64) -> Self {
        Self::new(
            label,
            MetricSource::ShareAbove {
                column: column.to_string(),
                threshold,
            },
        )
    }

    #[must_use]
    pub fn inactive(label: &str, key: &str, date: &str, days: i64) -> Self {
        Self::new(
            label,
            MetricSource::Inactive {
                key: key.to_string(),
                date: date.to_string(),
                days,
            },
        )
    }

    /// Read from the query result instead of the stepped table.
    #[must_use]
    pub fn raw(mut self) -> Self {
        self.stage = Stage::Raw;
        self
    }

    #[must_use]
    pub fn scaled(mut self, unit: DisplayUnit) -> Self {
        self.unit = unit;
        self
    }

    #[must_use]
    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    #[must_use]
    pub fn with_delta(mut self, column: &str) -> Self {
        self.delta = Some(column.to_string());
        self
    }

    fn evaluate(&self, table: &RawTable) -> Result<Metric> {
        let finish = |v: f64| round_to(v / self.unit.divisor(), self.precision);
        let value = match &self.source {
            MetricSource::Last { column } => {
                MetricValue::Number(finish(table.numeric(column)?.last().copied().unwrap_or(0.0)))
            }
            MetricSource::First { column } => {
                MetricValue::Number(finish(table.numeric(column)?.first().copied().unwrap_or(0.0)))
            }
            MetricSource::FirstText { column } => MetricValue::Text(
                table
                    .values(column)?
                    .first()
                    .map_or_else(|| "n/a".to_string(), Value::key),
            ),
            MetricSource::LastText { column } => MetricValue::Text(
                table
                    .values(column)?
                    .last()
                    .map_or_else(|| "n/a".to_string(), Value::key),
            ),
            MetricSource::Aggregate { column, func } => {
                let values: Vec<&Value> = table.values(column)?.iter().collect();
                MetricValue::Number(finish(rules::aggregate(*func, &values)))
            }
            MetricSource::RowCount => MetricValue::Number(table.row_count() as f64),
            MetricSource::ShareAtMost { column, threshold } => MetricValue::Number(
                share_where(table.values(column)?, |v| v <= *threshold, self.precision),
            ),
            MetricSource::ShareAbove { column, threshold } => MetricValue::Number(
                share_where(table.values(column)?, |v| v > *threshold, self.precision),
            ),
            MetricSource::Inactive { key, date, days } => {
                let keys = table.keys(key)?;
                let summary = rules::inactive_share(&keys, table.values(date)?, *days);
                MetricValue::Number(summary.share_pct)
            }
        };

        let delta = match &self.delta {
            Some(column) => Some(round_to(
                table.numeric(column)?.last().copied().unwrap_or(0.0),
                DEFAULT_PRECISION,
            )),
            None => None,
        };

        Ok(Metric {
            label: self.label.clone(),
            value,
            delta,
        })
    }
}

/// Percent of cells matching `hit`. Null cells stay in the denominator as misses.
fn share_where(values: &[Value], hit: impl Fn(f64) -> bool, precision: u32) -> f64 {
    let hits = values
        .iter()
        .filter(|v| v.as_f64().is_some_and(&hit))
        .count();
    derived_ratio_with(hits as f64, values.len() as f64, precision)
}

/// Ordered steps, a shape, and metrics for one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pipeline {
    pub steps: Vec<Step>,
    pub shape: Shape,
    pub metrics: Vec<MetricSpec>,
}

impl Pipeline {
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            steps: Vec::new(),
            shape,
            metrics: Vec::new(),
        }
    }

    /// Index column plus `(series name, column)` pairs.
    #[must_use]
    pub fn columns(index: &str, series: &[(&str, &str)]) -> Self {
        Self::new(Shape::Columns {
            index: index.to_string(),
            series: series
                .iter()
                .map(|(name, column)| ((*name).to_string(), (*column).to_string()))
                .collect(),
        })
    }

    #[must_use]
    pub fn pivot(index: &str, columns: &str, values: &str) -> Self {
        Self::new(Shape::Pivot {
            index: index.to_string(),
            columns: columns.to_string(),
            values: values.to_string(),
        })
    }

    #[must_use]
    pub fn metrics_only() -> Self {
        Self::new(Shape::Empty)
    }

    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    #[must_use]
    pub fn metric(mut self, metric: MetricSpec) -> Self {
        self.metrics.push(metric);
        self
    }

    // Step shorthands used by the catalog.

    #[must_use]
    pub fn bucket(self, column: &str, granularity: f64) -> Self {
        self.step(Step::Bucket {
            column: column.to_string(),
            granularity,
        })
    }

    #[must_use]
    pub fn scale(self, column: &str, unit: DisplayUnit, into: &str) -> Self {
        self.step(Step::Scale {
            column: column.to_string(),
            unit,
            into: into.to_string(),
        })
    }

    #[must_use]
    pub fn ratio(self, part: &str, total: &str, into: &str) -> Self {
        self.step(Step::Ratio {
            part: part.to_string(),
            total: total.to_string(),
            into: into.to_string(),
            precision: DEFAULT_PRECISION,
        })
    }

    #[must_use]
    pub fn quotient(self, numerator: &str, denominator: &str, into: &str) -> Self {
        self.step(Step::Quotient {
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
            into: into.to_string(),
            precision: DEFAULT_PRECISION,
        })
    }

    #[must_use]
    pub fn share(self, column: &str, into: &str) -> Self {
        self.step(Step::Share {
            column: column.to_string(),
            into: into.to_string(),
        })
    }

    #[must_use]
    pub fn growth(self, column: &str, into: &str) -> Self {
        self.step(Step::Growth {
            column: column.to_string(),
            into: into.to_string(),
            partition: None,
        })
    }

    #[must_use]
    pub fn growth_within(self, column: &str, into: &str, partition: &str) -> Self {
        self.step(Step::Growth {
            column: column.to_string(),
            into: into.to_string(),
            partition: Some(partition.to_string()),
        })
    }

    #[must_use]
    pub fn group_by(self, keys: &[&str], aggregations: Vec<Aggregation>) -> Self {
        self.step(Step::GroupBy {
            keys: keys.iter().map(ToString::to_string).collect(),
            aggregations,
        })
    }

    #[must_use]
    pub fn sort_desc(self, column: &str) -> Self {
        self.step(Step::SortBy {
            column: column.to_string(),
            descending: true,
        })
    }

    #[must_use]
    pub fn sort_asc(self, column: &str) -> Self {
        self.step(Step::SortBy {
            column: column.to_string(),
            descending: false,
        })
    }

    #[must_use]
    pub fn top(self, column: &str, n: usize) -> Self {
        self.step(Step::TopN {
            column: column.to_string(),
            n,
            descending: true,
        })
    }

    #[must_use]
    pub fn rolling(self, column: &str, window: usize, into: &str) -> Self {
        self.step(Step::Rolling {
            column: column.to_string(),
            window,
            into: into.to_string(),
        })
    }

    #[must_use]
    pub fn value_counts(self, column: &str, into: &str) -> Self {
        self.step(Step::ValueCounts {
            column: column.to_string(),
            into: into.to_string(),
        })
    }

    /// Run the pipeline over a query result.
    pub fn apply(&self, report_id: &str, raw: &RawTable) -> Result<NormalizedResult> {
        let mut table = raw.clone();
        for step in &self.steps {
            table = apply_step(step, table)?;
        }

        let mut result = match &self.shape {
            Shape::Columns { index, series } => {
                let mut result = NormalizedResult::new(report_id, table.keys(index)?);
                for (name, column) in series {
                    result.push_series(name.clone(), table.numeric(column)?)?;
                }
                result
            }
            Shape::Pivot {
                index,
                columns,
                values,
            } => {
                let wide = rules::pivot(
                    table.values(index)?,
                    table.values(columns)?,
                    &table.numeric(values)?,
                );
                let mut result = NormalizedResult::new(
                    report_id,
                    wide.index.iter().map(Value::key).collect(),
                );
                for (col, name) in wide.columns.iter().enumerate() {
                    result.push_series(name.key(), wide.column_values(col))?;
                }
                result
            }
            Shape::Empty => NormalizedResult::new(report_id, Vec::new()),
        };

        for spec in &self.metrics {
            let source = match spec.stage {
                Stage::Raw => raw,
                Stage::Stepped => &table,
            };
            result.push_metric(spec.evaluate(source)?);
        }

        Ok(result)
    }
}

fn apply_step(step: &Step, mut table: RawTable) -> Result<RawTable> {
    match step {
        Step::Bucket {
            column,
            granularity,
        } => {
            let values = table
                .numeric(column)?
                .into_iter()
                .map(|v| rules::bucket(v, *granularity))
                .collect();
            table.set_numeric(column, values)?;
        }
        Step::Scale { column, unit, into } => {
            let values = table
                .numeric(column)?
                .into_iter()
                .map(|v| rules::scale(v, *unit))
                .collect();
            table.set_numeric(into, values)?;
        }
        Step::Ratio {
            part,
            total,
            into,
            precision,
        } => {
            let values = table
                .numeric(part)?
                .into_iter()
                .zip(table.numeric(total)?)
                .map(|(p, t)| derived_ratio_with(p, t, *precision))
                .collect();
            table.set_numeric(into, values)?;
        }
        Step::Quotient {
            numerator,
            denominator,
            into,
            precision,
        } => {
            let values = table
                .numeric(numerator)?
                .into_iter()
                .zip(table.numeric(denominator)?)
                .map(|(n, d)| safe_quotient(n, d, *precision))
                .collect();
            table.set_numeric(into, values)?;
        }
        Step::Share { column, into } => {
            let values = share_of_total(&table.numeric(column)?, DEFAULT_PRECISION);
            table.set_numeric(into, values)?;
        }
        Step::Growth {
            column,
            into,
            partition,
        } => {
            let values = table.numeric(column)?;
            let changes = match partition {
                Some(p) => growth_partitioned(&values, &table.keys(p)?),
                None => growth(&values),
            };
            table.set_numeric(into, changes)?;
        }
        Step::GroupBy { keys, aggregations } => {
            table = group_by(&table, keys, aggregations)?;
        }
        Step::SortBy { column, descending } => {
            let order = top_n_indices(&table.numeric(column)?, table.row_count(), *descending);
            table = table.take_rows(&order);
        }
        Step::TopN {
            column,
            n,
            descending,
        } => {
            let order = top_n_indices(&table.numeric(column)?, *n, *descending);
            table = table.take_rows(&order);
        }
        Step::Rolling {
            column,
            window,
            into,
        } => {
            let values = rolling_mean(&table.numeric(column)?, *window);
            table.set_numeric(into, values)?;
        }
        Step::ValueCounts { column, into } => {
            let counts = rules::value_counts(table.values(column)?);
            let rows = counts
                .into_iter()
                .map(|(value, n)| vec![value, Value::Int(i64::try_from(n).unwrap_or(i64::MAX))])
                .collect();
            table = RawTable::from_rows(&[column.as_str(), into.as_str()], rows)?;
        }
    }
    Ok(table)
}

fn group_by(table: &RawTable, keys: &[String], aggregations: &[Aggregation]) -> Result<RawTable> {
    if keys.is_empty() {
        return Err(SreError::normalization("group_by needs at least one key"));
    }
    let key_columns: Vec<&[Value]> = keys
        .iter()
        .map(|k| table.values(k))
        .collect::<Result<_>>()?;
    let agg_columns: Vec<&[Value]> = aggregations
        .iter()
        .map(|a| table.values(&a.column))
        .collect::<Result<_>>()?;

    let row_keys: Vec<Vec<Value>> = (0..table.row_count())
        .map(|row| key_columns.iter().map(|c| c[row].clone()).collect())
        .collect();

    let mut names: Vec<&str> = keys.iter().map(String::as_str).collect();
    names.extend(aggregations.iter().map(|a| a.into.as_str()));
    let mut out = RawTable::with_columns(names.as_slice());

    for (key, rows) in rules::group_rows(&row_keys) {
        let mut row = key.0;
        for (agg, column) in aggregations.iter().zip(&agg_columns) {
            let members: Vec<&Value> = rows.iter().map(|&r| &column[r]).collect();
            row.push(Value::Float(rules::aggregate(agg.func, &members)));
        }
        out.push_row(row)?;
    }
    Ok(out)
}
