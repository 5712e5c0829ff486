//! Database handle: one SQLite session, explicitly passed to everything that
//! queries it and released on close or drop.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OpenFlags};

use crate::core::config::DatabaseConfig;
use crate::core::errors::{Result, SreError};
use crate::normalize::rules;

/// Opens the session a report run queries. The CLI opens exactly one per process.
pub trait ConnectionProvider {
    fn connect(&self) -> Result<Database>;
}

/// Provider for an on-disk order store.
#[derive(Debug, Clone)]
pub struct FileProvider {
    pub path: PathBuf,
    pub query_timeout: Duration,
    pub busy_timeout: Duration,
    pub read_only: bool,
}

impl FileProvider {
    #[must_use]
    pub fn from_config(cfg: &DatabaseConfig) -> Self {
        Self {
            path: cfg.path.clone(),
            query_timeout: Duration::from_millis(cfg.query_timeout_ms),
            busy_timeout: Duration::from_millis(cfg.busy_timeout_ms),
            read_only: true,
        }
    }

    #[must_use]
    pub fn writable(mut self) -> Self {
        self.read_only = false;
        self
    }
}

impl ConnectionProvider for FileProvider {
    fn connect(&self) -> Result<Database> {
        if self.read_only {
            Database::open_read_only(&self.path, self.query_timeout, self.busy_timeout)
        } else {
            Database::open_read_write(&self.path, self.query_timeout, self.busy_timeout)
        }
    }
}

/// Single live SQLite session.
pub struct Database {
    conn: Option<Connection>,
    label: String,
    query_timeout: Duration,
}

impl Database {
    /// Open an existing store for reporting. A missing file is a connection
    /// failure, never an implicit create.
    pub fn open_read_only(path: &Path, query_timeout: Duration, busy_timeout: Duration) -> Result<Self> {
        if !path.exists() {
            return Err(SreError::ConnectionUnavailable {
                details: format!("database file not found: {}", path.display()),
            });
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| unavailable(path, &e))?;
        Self::prepare(conn, path.display().to_string(), query_timeout, busy_timeout)
    }

    /// Open (or create) a store for schema setup and seeding.
    pub fn open_read_write(path: &Path, query_timeout: Duration, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| SreError::io(parent, source))?;
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| unavailable(path, &e))?;
        Self::prepare(conn, path.display().to_string(), query_timeout, busy_timeout)
    }

    /// Private in-memory store, mainly for tests and demos.
    pub fn open_in_memory(query_timeout: Duration) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| SreError::ConnectionUnavailable {
            details: e.to_string(),
        })?;
        Self::prepare(conn, ":memory:".to_string(), query_timeout, Duration::ZERO)
    }

    fn prepare(conn: Connection, label: String, query_timeout: Duration, busy_timeout: Duration) -> Result<Self> {
        if !busy_timeout.is_zero() {
            conn.busy_timeout(busy_timeout)?;
        }
        register_functions(&conn)?;
        Ok(Self {
            conn: Some(conn),
            label,
            query_timeout,
        })
    }

    /// Where the session points, for diagnostics.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Round-trip probe; false once closed or when the engine stops answering.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.conn.as_ref().is_some_and(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .is_ok()
        })
    }

    /// The underlying connection, after a liveness check.
    pub fn live(&self) -> Result<&Connection> {
        let conn = self.conn.as_ref().ok_or_else(|| SreError::ConnectionUnavailable {
            details: format!("session {} is closed", self.label),
        })?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| SreError::ConnectionUnavailable {
                details: format!("session {} failed liveness probe: {e}", self.label),
            })?;
        Ok(conn)
    }

    /// Mutable access for schema setup and seeding.
    pub fn live_mut(&mut self) -> Result<&mut Connection> {
        self.live()?;
        self.conn.as_mut().ok_or_else(|| SreError::ConnectionUnavailable {
            details: format!("session {} is closed", self.label),
        })
    }

    /// Release the session. Later calls see `ConnectionUnavailable`.
    pub fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| SreError::from(e))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("label", &self.label)
            .field("open", &self.conn.is_some())
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

fn unavailable(path: &Path, err: &rusqlite::Error) -> SreError {
    SreError::ConnectionUnavailable {
        details: format!("{}: {err}", path.display()),
    }
}

/// SQL-side counterpart of the normalizer's bucketing rule, so price bands
/// can be grouped in the query itself.
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "bucket",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<f64> = ctx.get(0)?;
            let granularity: f64 = ctx.get(1)?;
            Ok(value.map(|v| rules::bucket(v, granularity)))
        },
    )?;
    Ok(())
}
