//! Query executor: binds named parameters, runs one read-only statement under
//! a timeout watchdog, and collects the rows into a [`RawTable`].

#![allow(missing_docs)]

use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use crossbeam_channel::{RecvTimeoutError, bounded};
use rusqlite::types::{ToSql, ToSqlOutput};
use rusqlite::{ErrorCode, Statement};

use crate::core::errors::{Result, SreError};
use crate::core::table::{RawTable, Value};
use crate::db::connection::Database;

/// A validated parameter value ready to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(i64),
    Text(String),
    /// Bound as `YYYY-MM-DD` text.
    Date(NaiveDate),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl ToSql for ParamValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Int(v) => ToSqlOutput::from(*v),
            Self::Text(v) => ToSqlOutput::from(v.as_str()),
            Self::Date(d) => ToSqlOutput::from(d.format("%Y-%m-%d").to_string()),
        })
    }
}

/// Named parameter values, without the leading `:`.
pub type BoundParams = Vec<(String, ParamValue)>;

/// Timing and size of a completed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryStats {
    pub rows: usize,
    pub elapsed: Duration,
}

/// Run `sql` against `db` with `params` bound by name.
///
/// Only placeholders present in the statement are bound; a placeholder with
/// no value, an anonymous `?`, or a statement that writes is rejected.
pub fn execute(sql: &str, params: &[(String, ParamValue)], db: &Database) -> Result<RawTable> {
    execute_with_stats(sql, params, db).map(|(table, _)| table)
}

pub fn execute_with_stats(
    sql: &str,
    params: &[(String, ParamValue)],
    db: &Database,
) -> Result<(RawTable, QueryStats)> {
    let conn = db.live()?;
    let started = Instant::now();

    let mut stmt = conn.prepare(sql).map_err(|e| query_error(&e, db.query_timeout()))?;
    if !stmt.readonly() {
        return Err(SreError::QueryExecution {
            details: "statement is not read-only".to_string(),
        });
    }
    bind_named(&mut stmt, params)?;

    let timeout = db.query_timeout();
    let interrupt = conn.get_interrupt_handle();
    let (done_tx, done_rx) = bounded::<()>(1);
    let watchdog = thread::spawn(move || {
        if matches!(done_rx.recv_timeout(timeout), Err(RecvTimeoutError::Timeout)) {
            interrupt.interrupt();
        }
    });

    let collected = collect_rows(&mut stmt);

    drop(done_tx);
    if watchdog.join().is_err() {
        return Err(SreError::QueryExecution {
            details: "timeout watchdog panicked".to_string(),
        });
    }

    let table = collected.map_err(|e| query_error(&e, timeout))?;
    let stats = QueryStats {
        rows: table.row_count(),
        elapsed: started.elapsed(),
    };
    Ok((table, stats))
}

fn bind_named(stmt: &mut Statement<'_>, params: &[(String, ParamValue)]) -> Result<()> {
    for idx in 1..=stmt.parameter_count() {
        let Some(placeholder) = stmt.parameter_name(idx).map(str::to_string) else {
            return Err(SreError::QueryExecution {
                details: format!("anonymous placeholder at position {idx}; use :name"),
            });
        };
        let name = placeholder.trim_start_matches([':', '@', '$']);
        let Some((_, value)) = params.iter().find(|(n, _)| n == name) else {
            return Err(SreError::QueryExecution {
                details: format!("placeholder {placeholder} has no bound value"),
            });
        };
        stmt.raw_bind_parameter(idx, value)
            .map_err(|e| SreError::QueryExecution {
                details: format!("bind {placeholder}: {e}"),
            })?;
    }
    Ok(())
}

fn collect_rows(stmt: &mut Statement<'_>) -> rusqlite::Result<RawTable> {
    let names: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
    let width = names.len();
    let mut table = RawTable::with_columns(names.as_slice());
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(Value::from(row.get_ref(i)?));
        }
        // widths come from the same statement, so this cannot mismatch
        if table.push_row(values).is_err() {
            return Err(rusqlite::Error::InvalidColumnIndex(width));
        }
    }
    Ok(table)
}

fn query_error(err: &rusqlite::Error, timeout: Duration) -> SreError {
    if let rusqlite::Error::SqliteFailure(failure, _) = err
        && failure.code == ErrorCode::OperationInterrupted
    {
        return SreError::QueryExecution {
            details: format!("query timed out after {} ms", timeout.as_millis()),
        };
    }
    SreError::QueryExecution {
        details: err.to_string(),
    }
}
