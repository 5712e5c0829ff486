//! Pure reshaping rules: unit scaling, bucketing, zero-safe ratios, growth,
//! top-N, rolling means, pivots, and group-by aggregation.

#![allow(missing_docs)]

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::table::Value;

/// Decimal places applied to currency and percentage outputs.
pub const DEFAULT_PRECISION: u32 = 2;

pub const CRORE: f64 = 10_000_000.0;
pub const LAKH: f64 = 100_000.0;
/// The forecast view labels values as lakhs but divides by a million.
pub const FORECAST_LAKH: f64 = 1_000_000.0;

/// Fixed display-scale divisors for monetary columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayUnit {
    Rupees,
    Lakhs,
    Crores,
    ForecastLakhs,
}

impl DisplayUnit {
    #[must_use]
    pub const fn divisor(self) -> f64 {
        match self {
            Self::Rupees => 1.0,
            Self::Lakhs => LAKH,
            Self::Crores => CRORE,
            Self::ForecastLakhs => FORECAST_LAKH,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rupees => "₹",
            Self::Lakhs | Self::ForecastLakhs => "₹ Lakhs",
            Self::Crores => "₹ Cr",
        }
    }
}

// ──────────────────── scalar rules ────────────────────

/// Round to `precision` decimals, halves away from zero. Non-finite input yields 0.
#[must_use]
pub fn round_to(value: f64, precision: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10_f64.powi(i32::try_from(precision).unwrap_or(i32::MAX).min(15));
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() { rounded } else { value }
}

/// Round to the nearest integer; exact halves go toward +∞.
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    if value.is_finite() {
        (value + 0.5).floor()
    } else {
        0.0
    }
}

/// Snap `value` to the nearest multiple of `granularity` using round-half-up.
#[must_use]
pub fn bucket(value: f64, granularity: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    if !(granularity.is_finite() && granularity > 0.0) {
        return value;
    }
    round_half_up(value / granularity) * granularity
}

/// Discount percentage bucket: nearest whole percent.
#[must_use]
pub fn bucket_discount(discount_percent: f64) -> f64 {
    bucket(discount_percent, 1.0)
}

#[must_use]
pub fn scale(value: f64, unit: DisplayUnit) -> f64 {
    round_to(value / unit.divisor(), DEFAULT_PRECISION)
}

#[must_use]
pub fn scale_to_crores(value: f64) -> f64 {
    scale(value, DisplayUnit::Crores)
}

#[must_use]
pub fn scale_to_lakhs(value: f64) -> f64 {
    scale(value, DisplayUnit::Lakhs)
}

/// `part / total * 100` at the default precision. A zero, null or
/// non-finite total yields 0.
#[must_use]
pub fn derived_ratio(part: f64, total: f64) -> f64 {
    derived_ratio_with(part, total, DEFAULT_PRECISION)
}

#[must_use]
pub fn derived_ratio_with(part: f64, total: f64, precision: u32) -> f64 {
    if !part.is_finite() || !total.is_finite() || total == 0.0 {
        return 0.0;
    }
    round_to(part / total * 100.0, precision)
}

/// Plain quotient with the same zero-denominator policy as [`derived_ratio`].
#[must_use]
pub fn safe_quotient(numerator: f64, denominator: f64, precision: u32) -> f64 {
    if !numerator.is_finite() || !denominator.is_finite() || denominator == 0.0 {
        return 0.0;
    }
    round_to(numerator / denominator, precision)
}

// ──────────────────── sequence rules ────────────────────

/// Each value as a percentage of the column total.
#[must_use]
pub fn share_of_total(values: &[f64], precision: u32) -> Vec<f64> {
    let total: f64 = values.iter().filter(|v| v.is_finite()).sum();
    values
        .iter()
        .map(|v| derived_ratio_with(*v, total, precision))
        .collect()
}

/// Period-over-period percentage change. The first period is 0.
#[must_use]
pub fn growth(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut previous: Option<f64> = None;
    for &current in values {
        out.push(previous.map_or(0.0, |prev| derived_ratio(current - prev, prev)));
        previous = Some(current);
    }
    out
}

/// Growth computed independently within each partition key, in row order.
#[must_use]
pub fn growth_partitioned(values: &[f64], partitions: &[String]) -> Vec<f64> {
    let mut last_seen: HashMap<&str, f64> = HashMap::new();
    values
        .iter()
        .zip(partitions)
        .map(|(&current, partition)| {
            let change = last_seen
                .get(partition.as_str())
                .map_or(0.0, |&prev| derived_ratio(current - prev, prev));
            last_seen.insert(partition.as_str(), current);
            change
        })
        .collect()
}

/// Row positions ordered by `keys` (stable), truncated to `n`.
#[must_use]
pub fn top_n_indices(keys: &[f64], n: usize, descending: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| {
        let ord = keys[a].total_cmp(&keys[b]);
        if descending { ord.reverse() } else { ord }
    });
    order.truncate(n);
    order
}

/// The `n` rows with the highest key; ties keep their input order.
#[must_use]
pub fn top_n<T: Clone>(rows: &[T], n: usize, key: impl Fn(&T) -> f64) -> Vec<T> {
    let keys: Vec<f64> = rows.iter().map(&key).collect();
    top_n_indices(&keys, n, true)
        .into_iter()
        .map(|i| rows[i].clone())
        .collect()
}

/// Trailing mean over `window` rows. Positions without a full window are 0.
#[must_use]
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = vec![0.0; values.len()];
    let mut sum = 0.0;
    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        if i + 1 >= window {
            out[i] = round_to(sum / window as f64, DEFAULT_PRECISION);
        }
    }
    out
}

/// Occurrence count of each distinct value, in natural value order.
#[must_use]
pub fn value_counts(values: &[Value]) -> Vec<(Value, usize)> {
    let mut counts: Vec<(Value, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for value in values {
        if value.is_null() {
            continue;
        }
        let key = value.key();
        if let Some(&pos) = positions.get(&key) {
            counts[pos].1 += 1;
        } else {
            positions.insert(key, counts.len());
            counts.push((value.clone(), 1));
        }
    }
    counts.sort_by(|a, b| a.0.natural_cmp(&b.0));
    counts
}

// ──────────────────── aggregation ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggFunc {
    Sum,
    Mean,
    Count,
    CountDistinct,
    Min,
    Max,
}

/// Aggregate one group. Nulls are skipped; an empty numeric group is 0.
#[must_use]
pub fn aggregate(func: AggFunc, values: &[&Value]) -> f64 {
    let numbers = || values.iter().filter_map(|v| v.as_f64());
    match func {
        AggFunc::Sum => numbers().sum(),
        AggFunc::Mean => {
            let (sum, n) = numbers().fold((0.0, 0_usize), |(s, n), v| (s + v, n + 1));
            if n == 0 { 0.0 } else { sum / n as f64 }
        }
        AggFunc::Count => values.iter().filter(|v| !v.is_null()).count() as f64,
        AggFunc::CountDistinct => values
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| v.key())
            .collect::<HashSet<_>>()
            .len() as f64,
        AggFunc::Min => numbers().reduce(f64::min).unwrap_or(0.0),
        AggFunc::Max => numbers().reduce(f64::max).unwrap_or(0.0),
    }
}

/// Composite group key compared element-wise in natural order.
#[derive(Debug, Clone)]
pub struct GroupKey(pub Vec<Value>);

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(&other.0) {
            let ord = a.natural_cmp(b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

/// Row positions grouped by key, groups in ascending key order.
#[must_use]
pub fn group_rows(keys: &[Vec<Value>]) -> Vec<(GroupKey, Vec<usize>)> {
    let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
    for (row, key) in keys.iter().enumerate() {
        groups.entry(GroupKey(key.clone())).or_default().push(row);
    }
    groups.into_iter().collect()
}

// ──────────────────── pivot ────────────────────

/// Wide layout of a long table: one row per index value, one column per
/// distinct pivot value.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub index: Vec<Value>,
    pub columns: Vec<Value>,
    /// `cells[row][col]`, absent combinations filled with 0.
    pub cells: Vec<Vec<f64>>,
}

impl PivotTable {
    /// Values of one pivot column down the index.
    #[must_use]
    pub fn column_values(&self, col: usize) -> Vec<f64> {
        self.cells.iter().map(|row| row[col]).collect()
    }
}

/// Pivot long rows into wide form. Duplicate cells are summed.
#[must_use]
pub fn pivot(index: &[Value], columns: &[Value], values: &[f64]) -> PivotTable {
    fn distinct_sorted(values: &[Value]) -> Vec<Value> {
        let mut seen = HashSet::new();
        let mut out: Vec<Value> = values
            .iter()
            .filter(|v| seen.insert(v.key()))
            .cloned()
            .collect();
        out.sort_by(Value::natural_cmp);
        out
    }

    let row_keys = distinct_sorted(index);
    let col_keys = distinct_sorted(columns);
    let row_pos: HashMap<String, usize> = row_keys
        .iter()
        .enumerate()
        .map(|(i, v)| (v.key(), i))
        .collect();
    let col_pos: HashMap<String, usize> = col_keys
        .iter()
        .enumerate()
        .map(|(i, v)| (v.key(), i))
        .collect();

    let mut cells = vec![vec![0.0; col_keys.len()]; row_keys.len()];
    for ((r, c), v) in index.iter().zip(columns).zip(values) {
        if let (Some(&ri), Some(&ci)) = (row_pos.get(&r.key()), col_pos.get(&c.key()))
            && v.is_finite()
        {
            cells[ri][ci] += v;
        }
    }

    PivotTable {
        index: row_keys,
        columns: col_keys,
        cells,
    }
}

// ──────────────────── inactivity ────────────────────

/// Outcome of an inactivity scan over per-entity last activity dates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InactivitySummary {
    pub inactive: usize,
    pub total: usize,
    pub share_pct: f64,
}

/// Parse the date part of an ISO date or datetime.
#[must_use]
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Share of distinct keys whose latest date falls more than `days` before the
/// latest date seen anywhere in the data.
#[must_use]
pub fn inactive_share(keys: &[String], dates: &[Value], days: i64) -> InactivitySummary {
    let mut last_by_key: HashMap<&str, NaiveDate> = HashMap::new();
    for (key, date) in keys.iter().zip(dates) {
        let Some(day) = parse_day(&date.key()) else {
            continue;
        };
        last_by_key
            .entry(key.as_str())
            .and_modify(|d| *d = (*d).max(day))
            .or_insert(day);
    }

    let total = last_by_key.len();
    let Some(latest) = last_by_key.values().max().copied() else {
        return InactivitySummary {
            inactive: 0,
            total: 0,
            share_pct: 0.0,
        };
    };
    let threshold = latest - chrono::Duration::days(days);
    let inactive = last_by_key.values().filter(|d| **d < threshold).count();
    InactivitySummary {
        inactive,
        total,
        share_pct: derived_ratio(inactive as f64, total as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_ratio_is_zero() {
        assert_eq!(derived_ratio(50.0, 0.0), 0.0);
        assert_eq!(derived_ratio(50.0, f64::NAN), 0.0);
        assert_eq!(derived_ratio(1.0, 3.0), 33.33);
        assert_eq!(derived_ratio_with(1.0, 3.0, 4), 33.3333);
    }

    #[test]
    fn unit_scaling_uses_fixed_divisors() {
        assert_eq!(scale_to_crores(100_000_000.0), 10.0);
        assert_eq!(scale_to_lakhs(100_000.0), 1.0);
        assert_eq!(scale(2_500_000.0, DisplayUnit::ForecastLakhs), 2.5);
        assert_eq!(scale(3_000_000.0, DisplayUnit::Crores), 0.3);
    }

    #[test]
    fn discount_bucket_rounds_half_up() {
        assert_eq!(bucket_discount(14.6), 15.0);
        assert_eq!(bucket_discount(14.5), 15.0);
        assert_eq!(bucket_discount(14.4), 14.0);
        assert_eq!(bucket_discount(-2.5), -2.0);
        assert_eq!(bucket(27.0, 5.0), 25.0);
        assert_eq!(bucket(27.5, 5.0), 30.0);
    }

    #[test]
    fn growth_first_period_is_zero() {
        assert_eq!(growth(&[3_000_000.0, 1_500_000.0]), vec![0.0, -50.0]);
        assert_eq!(growth(&[0.0, 10.0]), vec![0.0, 0.0]);
        assert!(growth(&[]).is_empty());
    }

    #[test]
    fn partitioned_growth_restarts_per_key() {
        let partitions: Vec<String> = ["Audio", "Laptops", "Audio", "Laptops"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let out = growth_partitioned(&[100.0, 50.0, 150.0, 25.0], &partitions);
        assert_eq!(out, vec![0.0, 0.0, 50.0, -50.0]);
    }

    #[test]
    fn top_n_keeps_highest_with_stable_ties() {
        let rows: Vec<(usize, f64)> = (0..60)
            .map(|i| (i, if i % 2 == 0 { 10.0 } else { f64::from(u8::try_from(i).unwrap()) }))
            .collect();
        let top = top_n(&rows, 50, |r| r.1);
        assert_eq!(top.len(), 50);
        // Odd rows 59..11 are the 25 strictly highest, then ties at 10.0 in input order.
        assert_eq!(top[0].0, 59);
        let ties: Vec<usize> = top.iter().filter(|r| r.1 == 10.0).map(|r| r.0).collect();
        let mut sorted = ties.clone();
        sorted.sort_unstable();
        assert_eq!(ties, sorted);
    }

    #[test]
    fn rolling_mean_waits_for_full_window() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(out, vec![0.0, 0.0, 2.0, 3.0, 4.0]);
        assert_eq!(rolling_mean(&[4.0, 6.0], 1), vec![4.0, 6.0]);
    }

    #[test]
    fn share_of_total_handles_zero_sum() {
        assert_eq!(share_of_total(&[1.0, 3.0], 2), vec![25.0, 75.0]);
        assert_eq!(share_of_total(&[0.0, 0.0], 2), vec![0.0, 0.0]);
    }

    #[test]
    fn pivot_fills_missing_cells() {
        let index = vec![Value::Int(2022), Value::Int(2021), Value::Int(2021)];
        let columns = vec![Value::from("Sony"), Value::from("Apple"), Value::from("Sony")];
        let table = pivot(&index, &columns, &[5.0, 2.0, 3.0]);
        assert_eq!(table.index, vec![Value::Int(2021), Value::Int(2022)]);
        assert_eq!(table.columns, vec![Value::from("Apple"), Value::from("Sony")]);
        assert_eq!(table.cells, vec![vec![2.0, 3.0], vec![0.0, 5.0]]);
        assert_eq!(table.column_values(1), vec![3.0, 5.0]);
    }

    #[test]
    fn value_counts_sorted_by_value() {
        let values = vec![Value::Int(5), Value::Int(2), Value::Int(5), Value::Null];
        assert_eq!(
            value_counts(&values),
            vec![(Value::Int(2), 1), (Value::Int(5), 2)]
        );
    }

    #[test]
    fn aggregate_skips_nulls() {
        let values = [Value::Int(2), Value::Null, Value::Float(4.0)];
        let refs: Vec<&Value> = values.iter().collect();
        assert_eq!(aggregate(AggFunc::Sum, &refs), 6.0);
        assert_eq!(aggregate(AggFunc::Mean, &refs), 3.0);
        assert_eq!(aggregate(AggFunc::Count, &refs), 2.0);
        assert_eq!(aggregate(AggFunc::Max, &refs), 4.0);
        assert_eq!(aggregate(AggFunc::Mean, &[]), 0.0);
    }

    #[test]
    fn group_rows_orders_keys_naturally() {
        let keys = vec![
            vec![Value::Int(10)],
            vec![Value::Int(9)],
            vec![Value::Int(10)],
        ];
        let groups = group_rows(&keys);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.0, vec![Value::Int(9)]);
        assert_eq!(groups[1].1, vec![0, 2]);
    }

    #[test]
    fn inactive_share_measures_from_latest_date() {
        let keys: Vec<String> = ["c1", "c2", "c2", "c3"].iter().map(ToString::to_string).collect();
        let dates = vec![
            Value::from("2025-01-01"),
            Value::from("2024-01-01"),
            Value::from("2025-06-01"),
            Value::from("2025-06-30"),
        ];
        let summary = inactive_share(&keys, &dates, 90);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.inactive, 1);
        assert_eq!(summary.share_pct, 33.33);
    }

    #[test]
    fn inactive_share_of_nothing_is_zero() {
        let summary = inactive_share(&[], &[], 90);
        assert_eq!(summary.share_pct, 0.0);
    }
}
