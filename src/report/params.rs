//! Report sub-parameters: declarations, validation, and resolution of user
//! overrides against declared defaults.

#![allow(missing_docs)]

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::errors::{Result, SreError};
use crate::db::executor::{BoundParams, ParamValue};

const YEAR_RANGE: std::ops::RangeInclusive<i64> = 1900..=2100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "allowed", rename_all = "snake_case")]
pub enum ParamKind {
    /// One of a fixed set of values, e.g. a time granularity.
    Choice(Vec<String>),
    Year,
    Integer { min: i64, max: i64 },
    /// Calendar date, `YYYY-MM-DD`.
    Date,
}

/// A declared parameter with its default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamKind,
    pub default: String,
}

impl ParameterSpec {
    #[must_use]
    pub fn choice(name: &str, allowed: &[&str], default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Choice(allowed.iter().map(ToString::to_string).collect()),
            default: default.to_string(),
        }
    }

    #[must_use]
    pub fn year(name: &str, default: i64) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Year,
            default: default.to_string(),
        }
    }

    #[must_use]
    pub fn integer(name: &str, default: i64, min: i64, max: i64) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Integer { min, max },
            default: default.to_string(),
        }
    }

    #[must_use]
    pub fn date(name: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Date,
            default: default.to_string(),
        }
    }

    /// Validate a raw string against this declaration.
    pub fn parse(&self, raw: &str) -> Result<ParamValue> {
        let raw = raw.trim();
        let invalid = |details: String| SreError::InvalidParameter {
            name: self.name.clone(),
            details,
        };
        match &self.kind {
            ParamKind::Choice(allowed) => allowed
                .iter()
                .find(|a| a.eq_ignore_ascii_case(raw))
                .map(|a| ParamValue::Text(a.clone()))
                .ok_or_else(|| invalid(format!("{raw:?} is not one of: {}", allowed.join(", ")))),
            ParamKind::Year => {
                let year = raw
                    .parse::<i64>()
                    .map_err(|e| invalid(format!("{raw:?} is not a year: {e}")))?;
                if YEAR_RANGE.contains(&year) {
                    Ok(ParamValue::Int(year))
                } else {
                    Err(invalid(format!("year {year} outside {YEAR_RANGE:?}")))
                }
            }
            ParamKind::Integer { min, max } => {
                let value = raw
                    .parse::<i64>()
                    .map_err(|e| invalid(format!("{raw:?} is not an integer: {e}")))?;
                if (*min..=*max).contains(&value) {
                    Ok(ParamValue::Int(value))
                } else {
                    Err(invalid(format!("{value} outside {min}..={max}")))
                }
            }
            ParamKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(ParamValue::Date)
                .map_err(|e| invalid(format!("{raw:?} is not a YYYY-MM-DD date: {e}"))),
        }
    }

    /// Short human description of accepted values.
    #[must_use]
    pub fn accepts(&self) -> String {
        match &self.kind {
            ParamKind::Choice(allowed) => allowed.join("|"),
            ParamKind::Year => "YYYY".to_string(),
            ParamKind::Integer { min, max } => format!("{min}..={max}"),
            ParamKind::Date => "YYYY-MM-DD".to_string(),
        }
    }
}

/// Parameter values for one report run, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedParams {
    values: BoundParams,
}

impl ResolvedParams {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Text value of a choice parameter.
    #[must_use]
    pub fn choice(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            ParamValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bound(&self) -> &[(String, ParamValue)] {
        &self.values
    }

    /// `name=value` pairs for logs and rendering.
    #[must_use]
    pub fn display_pairs(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .map(|(n, v)| (n.clone(), v.to_string()))
            .collect()
    }
}

/// Fill defaults and validate overrides. Overrides naming an undeclared
/// parameter are rejected; a repeated override keeps the last value.
pub fn resolve(specs: &[ParameterSpec], overrides: &[(String, String)]) -> Result<ResolvedParams> {
    for (name, _) in overrides {
        if !specs.iter().any(|s| &s.name == name) {
            return Err(SreError::InvalidParameter {
                name: name.clone(),
                details: format!(
                    "not a parameter of this report (declared: {})",
                    if specs.is_empty() {
                        "none".to_string()
                    } else {
                        specs.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", ")
                    }
                ),
            });
        }
    }

    let mut values = Vec::with_capacity(specs.len());
    for spec in specs {
        let raw = overrides
            .iter()
            .rev()
            .find(|(n, _)| n == &spec.name)
            .map_or(spec.default.as_str(), |(_, v)| v.as_str());
        values.push((spec.name.clone(), spec.parse(raw)?));
    }
    Ok(ResolvedParams { values })
}

/// Split a `name=value` assignment from the command line.
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(SreError::InvalidParameter {
            name: raw.to_string(),
            details: "expected name=value".to_string(),
        }),
    }
}
