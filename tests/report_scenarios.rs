//! Engine scenarios: the built-in catalog driven through the dispatcher
//! against in-memory order stores.

use std::time::Duration;

use chrono::NaiveDate;

use sales_report_engine::core::config::{LoggingConfig, ReportsConfig};
use sales_report_engine::core::normalized::{MetricValue, NormalizedResult};
use sales_report_engine::db::connection::Database;
use sales_report_engine::db::fixtures::{OrderRecord, insert_orders, seed_orders};
use sales_report_engine::db::schema::create_schema;
use sales_report_engine::logger::activity::ActivityLog;
use sales_report_engine::normalize::pipeline::Pipeline;
use sales_report_engine::report::catalog::builtin_registry;
use sales_report_engine::report::definition::{ReportBody, ReportDefinition, ReportVariant};
use sales_report_engine::report::dispatch::{
    DispatchOutcome, DispatchState, Dispatcher, RenderSurface, Warning,
};
use sales_report_engine::report::params::{ParameterSpec, ResolvedParams};
use sales_report_engine::report::registry::ReportRegistry;

#[derive(Default)]
struct Recorder {
    rendered: Vec<NormalizedResult>,
    warnings: Vec<Warning>,
}

impl RenderSurface for Recorder {
    fn render(&mut self, _: &ReportDefinition, _: &ResolvedParams, result: &NormalizedResult) {
        self.rendered.push(result.clone());
    }

    fn warn(&mut self, warning: &Warning) {
        self.warnings.push(warning.clone());
    }
}

fn empty_store() -> Database {
    let mut db = Database::open_in_memory(Duration::from_secs(10)).expect("open in-memory store");
    create_schema(db.live_mut().expect("live session")).expect("create schema");
    db
}

fn three_order_store() -> Database {
    let mut db = empty_store();
    let day = |y, m| NaiveDate::from_ymd_opt(y, m, 15).expect("valid date");
    insert_orders(
        db.live_mut().expect("live session"),
        &[
            OrderRecord::new("T1", "C1", day(2021, 2), 1_000_000.0),
            OrderRecord::new("T2", "C2", day(2021, 8), 2_000_000.0),
            OrderRecord::new("T3", "C1", day(2022, 5), 1_500_000.0),
        ],
    )
    .expect("insert orders");
    db
}

/// Three 2022 deliveries: late, on time, and one with no recorded days.
fn unrecorded_delivery_store() -> Database {
    let mut db = empty_store();
    let day = NaiveDate::from_ymd_opt(2022, 6, 1).expect("valid date");
    let orders: Vec<OrderRecord> = [Some(9), Some(3), None]
        .into_iter()
        .enumerate()
        .map(|(i, days)| {
            let mut order = OrderRecord::new(&format!("D{i}"), &format!("C{i}"), day, 1_000.0);
            order.delivery_days = days;
            order
        })
        .collect();
    insert_orders(db.live_mut().expect("live session"), &orders).expect("insert orders");
    db
}

fn seeded_store() -> Database {
    let mut db = empty_store();
    seed_orders(db.live_mut().expect("live session"), 2_000, 42).expect("seed orders");
    db
}

/// Every (report, override set) pair that selects one distinct query.
fn all_selections(registry: &ReportRegistry) -> Vec<(String, Vec<(String, String)>)> {
    let mut out = Vec::new();
    for definition in registry.iter() {
        match &definition.body {
            ReportBody::Single(_) => out.push((definition.id.clone(), Vec::new())),
            ReportBody::ByChoice { parameter, variants } => {
                for (name, _) in variants {
                    out.push((definition.id.clone(), vec![(parameter.clone(), name.clone())]));
                }
            }
        }
    }
    out
}

#[test]
fn yearly_revenue_end_to_end() {
    let registry = builtin_registry(&ReportsConfig::default()).expect("catalog");
    let db = three_order_store();
    let mut surface = Recorder::default();
    let mut dispatcher = Dispatcher::new(&registry);

    let overrides = vec![("period".to_string(), "yearly".to_string())];
    let outcome = dispatcher
        .dispatch("revenue-trend", &overrides, &db, &mut surface)
        .expect("dispatch");
    let DispatchOutcome::Rendered(result) = outcome else {
        panic!("expected rendered, got {:?}", surface.warnings);
    };

    assert_eq!(result.index(), ["2021", "2022"]);
    let revenue = result.series_named("revenue_crores").expect("revenue series");
    assert_eq!(revenue.values, [0.30, 0.15]);
    let growth = result.series_named("growth_pct").expect("growth series");
    assert_eq!(growth.values, [0.0, -50.0]);

    let latest = result.metric_named("Latest Revenue (₹ Cr)").expect("latest metric");
    assert_eq!(latest.value, MetricValue::Number(0.15));
    assert_eq!(latest.delta, Some(-50.0));
}

#[test]
fn min_year_filter_is_exclusive() {
    let registry = builtin_registry(&ReportsConfig::default()).expect("catalog");
    let db = three_order_store();
    let mut surface = Recorder::default();
    let mut dispatcher = Dispatcher::new(&registry);

    let overrides = vec![("min_year".to_string(), "2021".to_string())];
    let outcome = dispatcher
        .dispatch("revenue-trend", &overrides, &db, &mut surface)
        .expect("dispatch");
    let DispatchOutcome::Rendered(result) = outcome else {
        panic!("expected rendered");
    };
    assert_eq!(result.index(), ["2022"]);
    assert_eq!(result.series_named("growth_pct").map(|s| s.values.clone()), Some(vec![0.0]));
}

#[test]
fn malformed_query_fails_then_next_selection_renders() {
    let mut registry = ReportRegistry::new();
    registry
        .register(
            ReportDefinition::single(
                "broken-report",
                "Broken",
                ReportVariant::new(
                    "SELEC order_year FROM orders WHERE order_year > :min_year",
                    Pipeline::metrics_only(),
                ),
            )
            .param(ParameterSpec::year("min_year", 2020)),
        )
        .expect("register broken");
    for definition in sales_report_engine::report::catalog::builtin_reports(&ReportsConfig::default()) {
        registry.register(definition).expect("register catalog report");
    }
    let before = registry.len();

    let db = three_order_store();
    let mut surface = Recorder::default();
    let mut dispatcher = Dispatcher::new(&registry);

    let outcome = dispatcher
        .dispatch("broken-report", &[], &db, &mut surface)
        .expect("report-local failure is not fatal");
    assert!(matches!(outcome, DispatchOutcome::Failed(ref w) if w.code == "SRE-2101"));
    assert_eq!(dispatcher.state(), DispatchState::Idle);
    assert!(dispatcher.trail().contains(&DispatchState::Failed));
    assert_eq!(registry.len(), before);

    let outcome = dispatcher
        .dispatch("executive-summary", &[], &db, &mut surface)
        .expect("dispatch");
    assert!(outcome.is_rendered(), "warnings: {:?}", surface.warnings);
    assert_eq!(surface.warnings.len(), 1);
}

#[test]
fn every_report_and_view_renders_aligned_series() {
    let registry = builtin_registry(&ReportsConfig::default()).expect("catalog");
    let db = seeded_store();
    let mut dispatcher = Dispatcher::new(&registry);

    for (id, overrides) in all_selections(&registry) {
        let mut surface = Recorder::default();
        let outcome = dispatcher
            .dispatch(&id, &overrides, &db, &mut surface)
            .expect("dispatch");
        assert!(
            outcome.is_rendered(),
            "{id} {overrides:?} failed: {:?}",
            surface.warnings
        );
        let result = &surface.rendered[0];
        for series in result.series() {
            assert_eq!(
                series.values.len(),
                result.index().len(),
                "{id} {overrides:?} series {} misaligned",
                series.name
            );
            assert!(series.values.iter().all(|v| v.is_finite()));
        }
        assert_eq!(dispatcher.state(), DispatchState::Idle);
    }
}

#[test]
fn reruns_are_idempotent() {
    let registry = builtin_registry(&ReportsConfig::default()).expect("catalog");
    let db = seeded_store();
    let mut dispatcher = Dispatcher::new(&registry);

    for (id, overrides) in all_selections(&registry) {
        let mut surface = Recorder::default();
        dispatcher.dispatch(&id, &overrides, &db, &mut surface).expect("first run");
        dispatcher.dispatch(&id, &overrides, &db, &mut surface).expect("second run");
        assert_eq!(surface.rendered.len(), 2, "{id} {overrides:?}");
        assert!(
            surface.rendered[0].approx_eq(&surface.rendered[1], 1e-6),
            "{id} {overrides:?} changed between runs"
        );
    }
}

#[test]
fn top_products_are_capped() {
    let registry = builtin_registry(&ReportsConfig::default()).expect("catalog");
    let db = seeded_store();
    let mut surface = Recorder::default();
    let mut dispatcher = Dispatcher::new(&registry);

    dispatcher
        .dispatch("customer-segmentation", &[], &db, &mut surface)
        .expect("dispatch");
    let result = &surface.rendered[0];
    assert_eq!(result.index().len(), 50);
    let monetary = &result.series_named("monetary_value").expect("monetary").values;
    assert!(monetary.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn empty_store_renders_empty_results() {
    let registry = builtin_registry(&ReportsConfig::default()).expect("catalog");
    let db = empty_store();
    let mut surface = Recorder::default();
    let mut dispatcher = Dispatcher::new(&registry);

    let outcome = dispatcher
        .dispatch("growth-analytics", &[], &db, &mut surface)
        .expect("dispatch");
    let DispatchOutcome::Rendered(result) = outcome else {
        panic!("expected rendered");
    };
    assert!(result.index().is_empty());
    assert!(result.series().iter().all(|s| s.values.is_empty()));
}

#[test]
fn closed_session_is_fatal() {
    let registry = builtin_registry(&ReportsConfig::default()).expect("catalog");
    let mut db = three_order_store();
    db.close().expect("close");
    let mut surface = Recorder::default();
    let mut dispatcher = Dispatcher::new(&registry);

    let err = dispatcher
        .dispatch("executive-summary", &[], &db, &mut surface)
        .expect_err("closed session");
    assert_eq!(err.code(), "SRE-2001");
    assert_eq!(dispatcher.state(), DispatchState::Idle);
    assert!(surface.warnings.is_empty());
}

#[test]
fn activity_log_records_each_selection() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = LoggingConfig {
        enabled: true,
        jsonl_path: dir.path().join("activity.jsonl"),
        fallback_path: None,
        max_size_bytes: 1024 * 1024,
        max_rotated_files: 2,
    };
    let log = ActivityLog::open(&cfg);
    let registry = builtin_registry(&ReportsConfig::default()).expect("catalog");
    let db = three_order_store();
    let mut surface = Recorder::default();
    let mut dispatcher = Dispatcher::new(&registry).with_activity_log(&log);

    dispatcher.dispatch("revenue-trend", &[], &db, &mut surface).expect("dispatch");
    let bad = vec![("period".to_string(), "weekly".to_string())];
    dispatcher.dispatch("revenue-trend", &bad, &db, &mut surface).expect("dispatch");
    log.flush();

    let events: Vec<String> = std::fs::read_to_string(&cfg.jsonl_path)
        .expect("read log")
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("json line");
            value["event"].as_str().unwrap_or_default().to_string()
        })
        .collect();
    assert_eq!(events, ["report_selected", "report_rendered", "report_failed"]);
}

#[test]
fn unrecorded_delivery_counts_against_on_time_rate() {
    let registry = builtin_registry(&ReportsConfig::default()).expect("catalog");
    let db = unrecorded_delivery_store();
    let mut dispatcher = Dispatcher::new(&registry);

    for view in ["trend", "distribution"] {
        let mut surface = Recorder::default();
        let overrides = vec![("view".to_string(), view.to_string())];
        let outcome = dispatcher
            .dispatch("delivery-performance", &overrides, &db, &mut surface)
            .expect("dispatch");
        let DispatchOutcome::Rendered(result) = outcome else {
            panic!("{view} failed: {:?}", surface.warnings);
        };
        let on_time = result
            .metric_named("On-time Delivery Rate (%)")
            .expect("on-time metric");
        assert_eq!(on_time.value, MetricValue::Number(33.33), "{view}");
        let average = result
            .metric_named("Average Delivery Days")
            .expect("average metric");
        assert_eq!(average.value, MetricValue::Number(6.0), "{view}");
    }

    let mut surface = Recorder::default();
    let overrides = vec![("view".to_string(), "distribution".to_string())];
    dispatcher
        .dispatch("delivery-performance", &overrides, &db, &mut surface)
        .expect("dispatch");
    assert_eq!(surface.rendered[0].index(), ["3", "9"]);

    let mut surface = Recorder::default();
    let outcome = dispatcher
        .dispatch("customer-service", &[], &db, &mut surface)
        .expect("dispatch");
    let DispatchOutcome::Rendered(result) = outcome else {
        panic!("customer-service failed: {:?}", surface.warnings);
    };
    let delayed = result
        .metric_named("Delayed Deliveries (%)")
        .expect("delayed metric");
    assert_eq!(delayed.value, MetricValue::Number(33.33));
}

#[test]
fn top_brands_view_keeps_five_leaders() {
    let registry = builtin_registry(&ReportsConfig::default()).expect("catalog");
    let db = seeded_store();
    let mut dispatcher = Dispatcher::new(&registry);

    let mut all = Recorder::default();
    let overrides = vec![("view".to_string(), "brand".to_string())];
    dispatcher
        .dispatch("market-intelligence", &overrides, &db, &mut all)
        .expect("dispatch brand");
    let mut top = Recorder::default();
    let overrides = vec![("view".to_string(), "top-brands".to_string())];
    dispatcher
        .dispatch("market-intelligence", &overrides, &db, &mut top)
        .expect("dispatch top-brands");

    let brands = &all.rendered[0];
    let leaders = &top.rendered[0];
    assert_eq!(leaders.index().len(), 5.min(brands.index().len()));
    assert_eq!(leaders.index(), &brands.index()[..leaders.index().len()]);
    let revenue = &leaders.series_named("revenue_crores").expect("revenue").values;
    assert!(revenue.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(
        leaders.metric_named("Leader").map(|m| m.value.clone()),
        brands.metric_named("Leader").map(|m| m.value.clone())
    );
}

#[test]
fn seasonal_revenue_averages_across_years() {
    let registry = builtin_registry(&ReportsConfig::default()).expect("catalog");
    let mut db = empty_store();
    let june = |y| NaiveDate::from_ymd_opt(y, 6, 10).expect("valid date");
    insert_orders(
        db.live_mut().expect("live session"),
        &[
            OrderRecord::new("S1", "C1", june(2021), 10_000_000.0),
            OrderRecord::new("S2", "C2", june(2022), 30_000_000.0),
        ],
    )
    .expect("insert orders");
    let mut surface = Recorder::default();
    let mut dispatcher = Dispatcher::new(&registry);

    let overrides = vec![("period".to_string(), "seasonal".to_string())];
    let outcome = dispatcher
        .dispatch("revenue-trend", &overrides, &db, &mut surface)
        .expect("dispatch");
    let DispatchOutcome::Rendered(result) = outcome else {
        panic!("expected rendered, got {:?}", surface.warnings);
    };
    assert_eq!(result.index(), ["6"]);
    assert_eq!(result.series_named("avg_revenue_crores").map(|s| s.values.clone()), Some(vec![2.0]));
    assert_eq!(result.series_named("years").map(|s| s.values.clone()), Some(vec![2.0]));
}
