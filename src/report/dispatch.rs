//! Report dispatcher: selects a report, runs it against the live session,
//! normalizes the result, and hands it to a render surface.
//!
//! ```text
//! Idle ──select──▶ Selected ──execute──▶ Executing ──┬─▶ Rendered ──▶ Idle
//!                                                    └─▶ Failed   ──▶ Idle
//! ```
//!
//! A report-local failure (bad query, bad parameter, unexpected result
//! shape) becomes a warning on the surface and the dispatcher returns to
//! `Idle`, ready for the next selection. Losing the session is fatal and is
//! returned as an error. Nothing is cached between runs.

#![allow(missing_docs)]

use std::time::Instant;

use serde::Serialize;

use crate::core::errors::{Result, SreError};
use crate::core::normalized::NormalizedResult;
use crate::db::connection::Database;
use crate::db::executor;
use crate::logger::activity::ActivityLog;
use crate::logger::jsonl::{EventType, LogEntry, Severity};
use crate::report::definition::ReportDefinition;
use crate::report::params::{self, ResolvedParams};
use crate::report::registry::ReportRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    Idle,
    Selected,
    Executing,
    Rendered,
    Failed,
}

/// Where rendered results and warnings go.
pub trait RenderSurface {
    fn render(&mut self, definition: &ReportDefinition, params: &ResolvedParams, result: &NormalizedResult);
    fn warn(&mut self, warning: &Warning);
}

/// A report-local failure, shown instead of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub report_id: String,
    pub code: &'static str,
    pub message: String,
}

impl Warning {
    #[must_use]
    pub fn from_error(report_id: &str, err: &SreError) -> Self {
        Self {
            report_id: report_id.to_string(),
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Rendered(NormalizedResult),
    Failed(Warning),
}

impl DispatchOutcome {
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }
}

/// A report chosen with its resolved parameters, ready to execute.
#[derive(Debug)]
pub struct Selection<'r> {
    definition: &'r ReportDefinition,
    params: ResolvedParams,
}

impl<'r> Selection<'r> {
    #[must_use]
    pub fn definition(&self) -> &'r ReportDefinition {
        self.definition
    }

    #[must_use]
    pub fn params(&self) -> &ResolvedParams {
        &self.params
    }
}

pub struct Dispatcher<'r> {
    registry: &'r ReportRegistry,
    log: Option<&'r ActivityLog>,
    state: DispatchState,
    /// States visited since the last selection began.
    trail: Vec<DispatchState>,
}

impl<'r> Dispatcher<'r> {
    #[must_use]
    pub fn new(registry: &'r ReportRegistry) -> Self {
        Self {
            registry,
            log: None,
            state: DispatchState::Idle,
            trail: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_activity_log(mut self, log: &'r ActivityLog) -> Self {
        self.log = Some(log);
        self
    }

    #[must_use]
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// States visited by the most recent cycle, starting with `Selected`.
    #[must_use]
    pub fn trail(&self) -> &[DispatchState] {
        &self.trail
    }

    #[must_use]
    pub fn registry(&self) -> &'r ReportRegistry {
        self.registry
    }

    /// Resolve `selector` (id or menu number) and its parameters.
    ///
    /// An unknown report leaves the dispatcher `Idle`. A parameter error
    /// passes through `Failed` back to `Idle`.
    pub fn select(&mut self, selector: &str, overrides: &[(String, String)]) -> Result<Selection<'r>> {
        self.trail.clear();
        self.state = DispatchState::Idle;
        let definition = self.registry.resolve_selector(selector)?;

        let resolved = params::resolve(&definition.parameters, overrides)
            .and_then(|p| definition.variant_for(&p).map(|_| p));
        match resolved {
            Ok(params) => {
                self.enter(DispatchState::Selected);
                self.record(
                    LogEntry {
                        params: Some(params.display_pairs()),
                        ..LogEntry::new(EventType::ReportSelected, Severity::Info).report(&definition.id)
                    },
                );
                Ok(Selection { definition, params })
            }
            Err(err) => {
                self.record(LogEntry::new(EventType::ReportFailed, Severity::Warning)
                    .report(&definition.id)
                    .failure(&err));
                self.enter(DispatchState::Failed);
                self.enter(DispatchState::Idle);
                Err(err)
            }
        }
    }

    /// Run a selection. Report-local errors are warned on `surface` and
    /// returned as `Failed`; connection loss is returned as `Err`.
    pub fn execute(
        &mut self,
        selection: Selection<'r>,
        db: &Database,
        surface: &mut dyn RenderSurface,
    ) -> Result<DispatchOutcome> {
        let Selection { definition, params } = selection;
        if !db.is_live() {
            let err = SreError::ConnectionUnavailable {
                details: format!("session {} is closed", db.label()),
            };
            self.record(LogEntry::new(EventType::ConnectionFailed, Severity::Error)
                .report(&definition.id)
                .failure(&err));
            self.enter(DispatchState::Idle);
            return Err(err);
        }

        self.enter(DispatchState::Executing);
        let started = Instant::now();
        let run = run_report(definition, &params, db);
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match run {
            Ok((result, rows)) => {
                self.enter(DispatchState::Rendered);
                surface.render(definition, &params, &result);
                self.record(LogEntry {
                    params: Some(params.display_pairs()),
                    duration_ms: Some(duration_ms),
                    ok: Some(true),
                    rows: Some(rows as u64),
                    series: Some(result.series().len() as u64),
                    ..LogEntry::new(EventType::ReportRendered, Severity::Info).report(&definition.id)
                });
                self.enter(DispatchState::Idle);
                Ok(DispatchOutcome::Rendered(result))
            }
            Err(err) if err.is_report_local() => {
                self.enter(DispatchState::Failed);
                let warning = Warning::from_error(&definition.id, &err);
                surface.warn(&warning);
                self.record(LogEntry {
                    params: Some(params.display_pairs()),
                    duration_ms: Some(duration_ms),
                    ..LogEntry::new(EventType::ReportFailed, Severity::Warning)
                        .report(&definition.id)
                        .failure(&err)
                });
                self.enter(DispatchState::Idle);
                Ok(DispatchOutcome::Failed(warning))
            }
            Err(err) => {
                self.record(LogEntry::new(EventType::ConnectionFailed, Severity::Error)
                    .report(&definition.id)
                    .failure(&err));
                self.enter(DispatchState::Idle);
                Err(err)
            }
        }
    }

    /// Select and execute in one step. A parameter error is a report-local
    /// failure here, warned on the surface like a failed query.
    pub fn dispatch(
        &mut self,
        selector: &str,
        overrides: &[(String, String)],
        db: &Database,
        surface: &mut dyn RenderSurface,
    ) -> Result<DispatchOutcome> {
        match self.select(selector, overrides) {
            Ok(selection) => self.execute(selection, db, surface),
            Err(err) if err.is_report_local() => {
                let id = self
                    .registry
                    .resolve_selector(selector)
                    .map_or_else(|_| selector.to_string(), |d| d.id.clone());
                let warning = Warning::from_error(&id, &err);
                surface.warn(&warning);
                Ok(DispatchOutcome::Failed(warning))
            }
            Err(err) => Err(err),
        }
    }

    fn enter(&mut self, state: DispatchState) {
        self.state = state;
        self.trail.push(state);
    }

    fn record(&self, entry: LogEntry) {
        if let Some(log) = self.log {
            log.record(&entry);
        }
    }
}

/// Query then normalize. Returns the result and the raw row count.
fn run_report(
    definition: &ReportDefinition,
    params: &ResolvedParams,
    db: &Database,
) -> Result<(NormalizedResult, usize)> {
    let variant = definition.variant_for(params)?;
    let (raw, stats) = executor::execute_with_stats(&variant.sql, params.as_bound(), db)?;
    let result = variant.pipeline.apply(&definition.id, &raw)?;
    Ok((result, stats.rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::db::fixtures::{OrderRecord, insert_orders};
    use crate::db::schema::create_schema;
    use crate::normalize::pipeline::Pipeline;
    use crate::normalize::rules::DisplayUnit;
    use crate::report::definition::ReportVariant;
    use crate::report::params::ParameterSpec;
    use chrono::NaiveDate;

    #[derive(Default)]
    struct Recorder {
        rendered: Vec<String>,
        warnings: Vec<Warning>,
    }

    impl RenderSurface for Recorder {
        fn render(&mut self, definition: &ReportDefinition, _: &ResolvedParams, _: &NormalizedResult) {
            self.rendered.push(definition.id.clone());
        }

        fn warn(&mut self, warning: &Warning) {
            self.warnings.push(warning.clone());
        }
    }

    fn registry() -> ReportRegistry {
        let mut reg = ReportRegistry::new();
        reg.register(
            ReportDefinition::single(
                "yearly-revenue",
                "Yearly Revenue",
                ReportVariant::new(
                    "SELECT order_year, SUM(final_amount_inr) AS revenue FROM orders
                     WHERE order_year > :min_year GROUP BY order_year ORDER BY order_year",
                    Pipeline::columns("order_year", &[("revenue_crores", "revenue_crores")])
                        .scale("revenue", DisplayUnit::Crores, "revenue_crores"),
                ),
            )
            .param(ParameterSpec::year("min_year", 2020)),
        )
        .unwrap();
        reg.register(ReportDefinition::single(
            "broken",
            "Broken",
            ReportVariant::new("SELECT revenue FROM no_such_table", Pipeline::metrics_only()),
        ))
        .unwrap();
        reg
    }

    fn database() -> Database {
        let mut db = Database::open_in_memory(Duration::from_secs(5)).unwrap();
        let conn = db.live_mut().unwrap();
        create_schema(conn).unwrap();
        let day = |y| NaiveDate::from_ymd_opt(y, 6, 1).unwrap();
        insert_orders(
            conn,
            &[
                OrderRecord::new("T1", "C1", day(2021), 1_000_000.0),
                OrderRecord::new("T2", "C2", day(2021), 2_000_000.0),
                OrderRecord::new("T3", "C1", day(2022), 1_500_000.0),
            ],
        )
        .unwrap();
        db
    }

    #[test]
    fn successful_cycle_renders_and_returns_to_idle() {
        let reg = registry();
        let db = database();
        let mut surface = Recorder::default();
        let mut dispatcher = Dispatcher::new(&reg);

        let outcome = dispatcher.dispatch("yearly-revenue", &[], &db, &mut surface).unwrap();
        let DispatchOutcome::Rendered(result) = outcome else {
            panic!("expected a rendered result");
        };
        assert_eq!(result.index(), ["2021", "2022"]);
        assert_eq!(surface.rendered, ["yearly-revenue"]);
        assert_eq!(
            dispatcher.trail(),
            [
                DispatchState::Selected,
                DispatchState::Executing,
                DispatchState::Rendered,
                DispatchState::Idle
            ]
        );
    }

    #[test]
    fn failed_query_warns_then_next_selection_works() {
        let reg = registry();
        let db = database();
        let mut surface = Recorder::default();
        let mut dispatcher = Dispatcher::new(&reg);

        let outcome = dispatcher.dispatch("broken", &[], &db, &mut surface).unwrap();
        assert!(matches!(outcome, DispatchOutcome::Failed(ref w) if w.code == "SRE-2101"));
        assert_eq!(dispatcher.state(), DispatchState::Idle);
        assert_eq!(
            dispatcher.trail(),
            [
                DispatchState::Selected,
                DispatchState::Executing,
                DispatchState::Failed,
                DispatchState::Idle
            ]
        );
        assert_eq!(surface.warnings.len(), 1);

        let outcome = dispatcher.dispatch("1", &[], &db, &mut surface).unwrap();
        assert!(outcome.is_rendered());
    }

    #[test]
    fn bad_parameter_is_report_local() {
        let reg = registry();
        let db = database();
        let mut surface = Recorder::default();
        let mut dispatcher = Dispatcher::new(&reg);

        let overrides = vec![("min_year".to_string(), "last year".to_string())];
        let outcome = dispatcher
            .dispatch("yearly-revenue", &overrides, &db, &mut surface)
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Failed(ref w) if w.code == "SRE-2102"));
        assert_eq!(dispatcher.state(), DispatchState::Idle);
        assert!(surface.rendered.is_empty());
    }

    #[test]
    fn unknown_report_is_an_error_and_stays_idle() {
        let reg = registry();
        let db = database();
        let mut surface = Recorder::default();
        let mut dispatcher = Dispatcher::new(&reg);

        let err = dispatcher.dispatch("nope", &[], &db, &mut surface).unwrap_err();
        assert_eq!(err.code(), "SRE-1102");
        assert_eq!(dispatcher.state(), DispatchState::Idle);
        assert!(surface.warnings.is_empty());
    }

    #[test]
    fn closed_session_is_fatal() {
        let reg = registry();
        let mut db = database();
        db.close().unwrap();
        let mut surface = Recorder::default();
        let mut dispatcher = Dispatcher::new(&reg);

        let err = dispatcher
            .dispatch("yearly-revenue", &[], &db, &mut surface)
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(dispatcher.state(), DispatchState::Idle);
        assert!(surface.rendered.is_empty());
    }

    #[test]
    fn activity_log_records_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = crate::core::config::LoggingConfig {
            enabled: true,
            jsonl_path: dir.path().join("activity.jsonl"),
            fallback_path: None,
            max_size_bytes: 1024 * 1024,
            max_rotated_files: 1,
        };
        let log = ActivityLog::open(&cfg);
        let reg = registry();
        let db = database();
        let mut surface = Recorder::default();
        let mut dispatcher = Dispatcher::new(&reg).with_activity_log(&log);

        dispatcher.dispatch("yearly-revenue", &[], &db, &mut surface).unwrap();
        dispatcher.dispatch("broken", &[], &db, &mut surface).unwrap();
        log.flush();

        let events: Vec<String> = std::fs::read_to_string(&cfg.jsonl_path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["event"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            events,
            ["report_selected", "report_rendered", "report_selected", "report_failed"]
        );
    }
}
