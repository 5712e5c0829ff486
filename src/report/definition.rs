//! Report definitions: identity, declared parameters, parameterized SQL, and
//! the normalization pipeline applied to each query result.

#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::core::errors::{Result, SreError};
use crate::normalize::pipeline::Pipeline;
use crate::report::params::{ParamKind, ParameterSpec, ResolvedParams};

/// `:name` placeholders. A preceding `:` or word character rules out
/// `::casts` and `'12:30'`-style literals.
const PLACEHOLDER_PATTERN: &str = r"(?:^|[^:\w]):([A-Za-z_][A-Za-z0-9_]*)";

static PLACEHOLDER_RE: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN));

/// One query plus how to normalize its result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportVariant {
    pub sql: String,
    pub pipeline: Pipeline,
}

impl ReportVariant {
    #[must_use]
    pub fn new(sql: &str, pipeline: Pipeline) -> Self {
        Self {
            sql: sql.trim().to_string(),
            pipeline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "body", rename_all = "snake_case")]
pub enum ReportBody {
    Single(ReportVariant),
    /// The value of a choice parameter selects the query.
    ByChoice {
        parameter: String,
        variants: Vec<(String, ReportVariant)>,
    },
}

/// A named, parameterized analytical query. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDefinition {
    pub id: String,
    pub title: String,
    pub parameters: Vec<ParameterSpec>,
    pub body: ReportBody,
}

impl ReportDefinition {
    #[must_use]
    pub fn single(id: &str, title: &str, variant: ReportVariant) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            parameters: Vec::new(),
            body: ReportBody::Single(variant),
        }
    }

    /// A report whose query is chosen by `parameter`. The first variant is
    /// the default choice.
    #[must_use]
    pub fn with_views(id: &str, title: &str, parameter: &str, variants: Vec<(&str, ReportVariant)>) -> Self {
        let names: Vec<&str> = variants.iter().map(|(name, _)| *name).collect();
        let default = names.first().copied().unwrap_or_default();
        Self {
            id: id.to_string(),
            title: title.to_string(),
            parameters: vec![ParameterSpec::choice(parameter, &names, default)],
            body: ReportBody::ByChoice {
                parameter: parameter.to_string(),
                variants: variants
                    .into_iter()
                    .map(|(name, v)| (name.to_string(), v))
                    .collect(),
            },
        }
    }

    #[must_use]
    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    /// The variant the resolved parameters select.
    pub fn variant_for(&self, params: &ResolvedParams) -> Result<&ReportVariant> {
        match &self.body {
            ReportBody::Single(variant) => Ok(variant),
            ReportBody::ByChoice { parameter, variants } => {
                let choice = params.choice(parameter).ok_or_else(|| SreError::InvalidParameter {
                    name: parameter.clone(),
                    details: "no value resolved".to_string(),
                })?;
                variants
                    .iter()
                    .find(|(name, _)| name == choice)
                    .map(|(_, v)| v)
                    .ok_or_else(|| SreError::InvalidParameter {
                        name: parameter.clone(),
                        details: format!("{choice:?} has no query"),
                    })
            }
        }
    }

    #[must_use]
    pub fn variants(&self) -> Vec<&ReportVariant> {
        match &self.body {
            ReportBody::Single(v) => vec![v],
            ReportBody::ByChoice { variants, .. } => variants.iter().map(|(_, v)| v).collect(),
        }
    }

    /// Check identity and that templates reference only declared parameters.
    pub fn validate(&self) -> Result<()> {
        let invalid = |details: String| SreError::InvalidDefinition {
            id: self.id.clone(),
            details,
        };
        if !is_report_id(&self.id) {
            return Err(invalid("id must be lowercase words joined by '-'".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(invalid("title is empty".to_string()));
        }

        let mut seen = BTreeSet::new();
        for spec in &self.parameters {
            if !seen.insert(spec.name.as_str()) {
                return Err(invalid(format!("parameter {} declared twice", spec.name)));
            }
            spec.parse(&spec.default)
                .map_err(|e| invalid(format!("default for {}: {e}", spec.name)))?;
        }

        if let ReportBody::ByChoice { parameter, variants } = &self.body {
            let allowed = self
                .parameters
                .iter()
                .find(|s| &s.name == parameter)
                .and_then(|s| match &s.kind {
                    ParamKind::Choice(allowed) => Some(allowed),
                    _ => None,
                })
                .ok_or_else(|| invalid(format!("{parameter} is not a declared choice")))?;
            let names: Vec<&String> = variants.iter().map(|(n, _)| n).collect();
            if variants.is_empty() || names.len() != allowed.len() || allowed.iter().any(|a| !names.contains(&a)) {
                return Err(invalid(format!("choices of {parameter} do not match its queries")));
            }
        }

        for variant in self.variants() {
            if variant.sql.is_empty() {
                return Err(invalid("empty query".to_string()));
            }
            for name in placeholders(&variant.sql)? {
                if !seen.contains(name.as_str()) {
                    return Err(invalid(format!("query uses undeclared parameter :{name}")));
                }
            }
        }
        Ok(())
    }
}

/// Distinct `:name` placeholders in a template.
pub fn placeholders(sql: &str) -> Result<BTreeSet<String>> {
    let pattern = PLACEHOLDER_RE.as_ref().map_err(|e| SreError::InvalidDefinition {
        id: String::new(),
        details: format!("placeholder pattern: {e}"),
    })?;
    Ok(pattern
        .captures_iter(sql)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect())
}

/// Lowercase ASCII words joined by single hyphens.
fn is_report_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .split('-')
            .all(|word| !word.is_empty() && word.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::params::resolve;

    fn variant(sql: &str) -> ReportVariant {
        ReportVariant::new(sql, Pipeline::metrics_only())
    }

    #[test]
    fn placeholder_scan_skips_casts_and_time_literals() {
        let found = placeholders(
            "SELECT x::text, '12:30' FROM orders WHERE order_year > :min_year AND d < :cutoff_date",
        )
        .unwrap();
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec!["cutoff_date".to_string(), "min_year".to_string()]
        );
    }

    #[test]
    fn placeholder_pattern_compiles_once_and_is_reused() {
        assert!(PLACEHOLDER_RE.is_ok());
        let first = placeholders("WHERE a > :min_year").unwrap();
        let second = placeholders("WHERE b < :churn_days").unwrap();
        assert!(first.contains("min_year") && !first.contains("churn_days"));
        assert!(second.contains("churn_days") && !second.contains("min_year"));
    }

    #[test]
    fn undeclared_placeholder_rejected() {
        let def = ReportDefinition::single("r", "R", variant("SELECT 1 WHERE 2 > :min_year"));
        let err = def.validate().unwrap_err();
        assert_eq!(err.code(), "SRE-1103");
        assert!(err.to_string().contains(":min_year"));

        let ok = def.param(ParameterSpec::year("min_year", 2020));
        ok.validate().unwrap();
    }

    #[test]
    fn bad_ids_rejected() {
        for id in ["", "Revenue", "revenue trend", "-x", "x--y"] {
            let def = ReportDefinition::single(id, "T", variant("SELECT 1"));
            assert!(def.validate().is_err(), "{id:?} accepted");
        }
    }

    #[test]
    fn views_select_variant_and_default_to_first() {
        let def = ReportDefinition::with_views(
            "revenue-trend",
            "Revenue Trend",
            "period",
            vec![("yearly", variant("SELECT 'y'")), ("monthly", variant("SELECT 'm'"))],
        );
        def.validate().unwrap();

        let defaults = resolve(&def.parameters, &[]).unwrap();
        assert_eq!(def.variant_for(&defaults).unwrap().sql, "SELECT 'y'");

        let monthly = resolve(&def.parameters, &[("period".into(), "monthly".into())]).unwrap();
        assert_eq!(def.variant_for(&monthly).unwrap().sql, "SELECT 'm'");
    }

    #[test]
    fn bad_default_rejected() {
        let def = ReportDefinition::single("r", "R", variant("SELECT :cutoff_date"))
            .param(ParameterSpec::date("cutoff_date", "not-a-date"));
        assert!(def.validate().is_err());
    }
}
