//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SreError};

/// Full SRE configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub reports: ReportsConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Order store location and per-query limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// Statements running longer than this are interrupted.
    pub query_timeout_ms: u64,
    pub busy_timeout_ms: u64,
}

/// Defaults for the sub-parameters exposed by the report catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportsConfig {
    /// Reports only consider orders with `order_year > min_order_year`.
    pub min_order_year: i64,
    /// Reference date for retention analysis (`YYYY-MM-DD`).
    pub cutoff_date: String,
    /// Days without an order before a customer counts as churned.
    pub churn_days: i64,
    /// Inactivity window for the predictive churn estimate.
    pub inactivity_days: i64,
    pub on_time_days: i64,
    pub late_delivery_days: i64,
    pub rolling_window: usize,
    pub supplier_min_orders: i64,
    pub top_products: usize,
    pub top_brands: usize,
    pub top_suppliers: usize,
}

/// Activity log destination and rotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub jsonl_path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Filesystem paths used by sre.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[SRE-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

fn data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("sre")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: data_dir().join("orders.sqlite3"),
            query_timeout_ms: 30_000,
            busy_timeout_ms: 5_000,
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            min_order_year: 2020,
            cutoff_date: "2025-09-01".to_string(),
            churn_days: 180,
            inactivity_days: 90,
            on_time_days: 5,
            late_delivery_days: 7,
            rolling_window: 7,
            supplier_min_orders: 50,
            top_products: 50,
            top_brands: 20,
            top_suppliers: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            jsonl_path: data_dir().join("activity.jsonl"),
            fallback_path: Some(env::temp_dir().join("sre-activity.jsonl")),
            max_size_bytes: 16 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: home_dir().join(".config").join("sre").join("config.toml"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, env_var)
    }

    fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| SreError::io(&path_buf, source))?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(SreError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for logging.
    ///
    /// FNV-1a so the value is stable across processes and toolchains.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // database
        if let Some(raw) = lookup("SRE_DATABASE_PATH") {
            self.database.path = PathBuf::from(raw);
        }
        set_u64(&mut lookup, "SRE_DATABASE_QUERY_TIMEOUT_MS", &mut self.database.query_timeout_ms)?;
        set_u64(&mut lookup, "SRE_DATABASE_BUSY_TIMEOUT_MS", &mut self.database.busy_timeout_ms)?;

        // reports
        set_i64(&mut lookup, "SRE_REPORTS_MIN_ORDER_YEAR", &mut self.reports.min_order_year)?;
        if let Some(raw) = lookup("SRE_REPORTS_CUTOFF_DATE") {
            self.reports.cutoff_date = raw;
        }
        set_i64(&mut lookup, "SRE_REPORTS_CHURN_DAYS", &mut self.reports.churn_days)?;
        set_i64(&mut lookup, "SRE_REPORTS_INACTIVITY_DAYS", &mut self.reports.inactivity_days)?;
        set_i64(&mut lookup, "SRE_REPORTS_ON_TIME_DAYS", &mut self.reports.on_time_days)?;
        set_i64(
            &mut lookup,
            "SRE_REPORTS_LATE_DELIVERY_DAYS",
            &mut self.reports.late_delivery_days,
        )?;
        set_usize(&mut lookup, "SRE_REPORTS_ROLLING_WINDOW", &mut self.reports.rolling_window)?;
        set_i64(
            &mut lookup,
            "SRE_REPORTS_SUPPLIER_MIN_ORDERS",
            &mut self.reports.supplier_min_orders,
        )?;

        // logging
        if let Some(raw) = lookup("SRE_LOGGING_ENABLED") {
            self.logging.enabled = parse_env_bool("SRE_LOGGING_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("SRE_LOGGING_JSONL_PATH") {
            self.logging.jsonl_path = PathBuf::from(raw);
        }
        set_u64(&mut lookup, "SRE_LOGGING_MAX_SIZE_BYTES", &mut self.logging.max_size_bytes)?;

        Ok(())
    }

    /// Check cross-field constraints. Called by [`Config::load`].
    pub fn validate(&self) -> Result<()> {
        if self.database.query_timeout_ms == 0 {
            return Err(SreError::InvalidConfig {
                details: "database.query_timeout_ms must be > 0".to_string(),
            });
        }

        if NaiveDate::parse_from_str(&self.reports.cutoff_date, "%Y-%m-%d").is_err() {
            return Err(SreError::InvalidConfig {
                details: format!(
                    "reports.cutoff_date must be YYYY-MM-DD, got {:?}",
                    self.reports.cutoff_date
                ),
            });
        }

        for (name, val) in [
            ("churn_days", self.reports.churn_days),
            ("inactivity_days", self.reports.inactivity_days),
            ("on_time_days", self.reports.on_time_days),
            ("late_delivery_days", self.reports.late_delivery_days),
            ("supplier_min_orders", self.reports.supplier_min_orders),
        ] {
            if val < 0 {
                return Err(SreError::InvalidConfig {
                    details: format!("reports.{name} must be >= 0, got {val}"),
                });
            }
        }

        for (name, val) in [
            ("rolling_window", self.reports.rolling_window),
            ("top_products", self.reports.top_products),
            ("top_brands", self.reports.top_brands),
            ("top_suppliers", self.reports.top_suppliers),
        ] {
            if val == 0 {
                return Err(SreError::InvalidConfig {
                    details: format!("reports.{name} must be >= 1"),
                });
            }
        }

        if self.logging.enabled && self.logging.max_size_bytes < 1024 {
            return Err(SreError::InvalidConfig {
                details: format!(
                    "logging.max_size_bytes ({}) must be >= 1024",
                    self.logging.max_size_bytes
                ),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| SreError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn set_u64<F>(lookup: &mut F, name: &str, slot: &mut u64) -> Result<()>
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(raw) = lookup(name) {
        *slot = parse_env(name, &raw)?;
    }
    Ok(())
}

fn set_i64<F>(lookup: &mut F, name: &str, slot: &mut i64) -> Result<()>
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(raw) = lookup(name) {
        *slot = parse_env(name, &raw)?;
    }
    Ok(())
}

fn set_usize<F>(lookup: &mut F, name: &str, slot: &mut usize) -> Result<()>
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(raw) = lookup(name) {
        *slot = parse_env(name, &raw)?;
    }
    Ok(())
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    parse_env(name, raw)
}

#[cfg(test)]
mod tests {
    use super::{Config, SreError};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.reports.min_order_year, 2020);
        assert_eq!(cfg.reports.cutoff_date, "2025-09-01");
        assert_eq!(cfg.reports.churn_days, 180);
    }

    #[test]
    fn malformed_cutoff_date_rejected() {
        let mut cfg = Config::default();
        cfg.reports.cutoff_date = "2025/09/01".to_string();
        let err = cfg.validate().expect_err("expected cutoff validation error");
        assert!(err.to_string().contains("cutoff_date"));
    }

    #[test]
    fn zero_query_timeout_rejected() {
        let mut cfg = Config::default();
        cfg.database.query_timeout_ms = 0;
        let err = cfg.validate().expect_err("expected timeout error");
        assert!(err.to_string().contains("query_timeout_ms"));
    }

    #[test]
    fn zero_rolling_window_rejected() {
        let mut cfg = Config::default();
        cfg.reports.rolling_window = 0;
        let err = cfg.validate().expect_err("expected window error");
        assert!(err.to_string().contains("rolling_window"));
    }

    #[test]
    fn negative_churn_days_rejected() {
        let mut cfg = Config::default();
        cfg.reports.churn_days = -1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = Config::default();
        let overrides = vars(&[
            ("SRE_DATABASE_PATH", "/tmp/sre/orders.sqlite3"),
            ("SRE_REPORTS_MIN_ORDER_YEAR", "2022"),
            ("SRE_REPORTS_CUTOFF_DATE", "2024-12-31"),
            ("SRE_LOGGING_ENABLED", "false"),
        ]);

        cfg.apply_env_overrides_from(|name| overrides.get(name).cloned())
            .expect("env overrides should parse");

        assert_eq!(cfg.database.path, PathBuf::from("/tmp/sre/orders.sqlite3"));
        assert_eq!(cfg.reports.min_order_year, 2022);
        assert_eq!(cfg.reports.cutoff_date, "2024-12-31");
        assert!(!cfg.logging.enabled);
    }

    #[test]
    fn env_invalid_number_rejected() {
        let mut cfg = Config::default();
        let overrides = vars(&[("SRE_REPORTS_CHURN_DAYS", "half-a-year")]);

        let err = cfg
            .apply_env_overrides_from(|name| overrides.get(name).cloned())
            .expect_err("invalid number should fail");
        match err {
            SreError::ConfigParse { context, details } => {
                assert_eq!(context, "env");
                assert!(details.contains("SRE_REPORTS_CHURN_DAYS"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_reads_toml_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[reports]\nmin_order_year = 2021\nchurn_days = 90\n\n[database]\nquery_timeout_ms = 500\n",
        )
        .unwrap();

        let cfg = Config::load_with(Some(&path), |_| None).expect("config should load");
        assert_eq!(cfg.reports.min_order_year, 2021);
        assert_eq!(cfg.reports.churn_days, 90);
        assert_eq!(cfg.database.query_timeout_ms, 500);
        // untouched sections keep their defaults
        assert_eq!(cfg.reports.on_time_days, 5);
        assert_eq!(cfg.paths.config_file, path);
    }

    #[test]
    fn load_returns_error_for_explicit_missing_path() {
        let result = Config::load_with(Some(Path::new("/nonexistent/sre/config.toml")), |_| None);
        assert!(matches!(result, Err(SreError::MissingConfig { .. })));
    }

    #[test]
    fn load_rejects_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[reports\nmin_order_year = ").unwrap();
        let err = Config::load_with(Some(&path), |_| None).unwrap_err();
        assert_eq!(err.code(), "SRE-1003");
    }

    #[test]
    fn stable_hash_changes_when_config_changes() {
        let cfg = Config::default();
        let hash_before = cfg.stable_hash().expect("hash should compute");
        let mut modified = Config::default();
        modified.reports.churn_days += 1;
        let hash_after = modified.stable_hash().expect("hash should compute");
        assert_ne!(hash_before, hash_after);
    }

    #[test]
    fn stable_hash_deterministic() {
        let cfg = Config::default();
        let h1 = cfg.stable_hash().expect("hash");
        let h2 = cfg.stable_hash().expect("hash");
        assert_eq!(h1, h2);
    }
}
