//! Top-level CLI definition and dispatch.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

use sales_report_engine::core::config::Config;
use sales_report_engine::core::errors::SreError;
use sales_report_engine::core::normalized::{MetricValue, NormalizedResult};
use sales_report_engine::db::connection::{ConnectionProvider, FileProvider};
use sales_report_engine::db::fixtures::seed_orders;
use sales_report_engine::db::schema::{create_schema, order_count};
use sales_report_engine::logger::activity::ActivityLog;
use sales_report_engine::logger::jsonl::{EventType, LogEntry, Severity};
use sales_report_engine::report::catalog::builtin_registry;
use sales_report_engine::report::definition::{ReportBody, ReportDefinition};
use sales_report_engine::report::dispatch::{DispatchOutcome, Dispatcher, RenderSurface, Warning};
use sales_report_engine::report::params::{ResolvedParams, parse_assignment};
use sales_report_engine::report::registry::ReportRegistry;

const BAR_WIDTH: usize = 24;

/// Sales Report Engine: named analytical reports over e-commerce orders.
#[derive(Debug, Parser)]
#[command(
    name = "sre",
    author,
    version,
    about = "Sales Report Engine - parameterized analytical reports",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override the order database path.
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// List reports in menu order with their sub-parameters.
    List,
    /// Describe one report: parameters, views and queries.
    Show(ShowArgs),
    /// Run one report and render it.
    Run(RunArgs),
    /// Read selections from stdin, one per line, against a single session.
    Session(SessionArgs),
    /// Create the orders schema and optionally seed synthetic orders.
    InitDb(InitDbArgs),
    /// View and validate configuration.
    Config(ConfigArgs),
    /// Print version information.
    Version(VersionArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Serialize)]
struct ShowArgs {
    /// Report id or menu number.
    report: String,
    /// Include query text for each view.
    #[arg(long)]
    sql: bool,
}

#[derive(Debug, Clone, Args, Serialize)]
struct RunArgs {
    /// Report id or menu number.
    report: String,
    /// Parameter override, repeatable.
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,
    /// Rows shown per table in human output.
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

#[derive(Debug, Clone, Args, Serialize)]
struct SessionArgs {
    /// Rows shown per table in human output.
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

#[derive(Debug, Clone, Args, Serialize)]
struct InitDbArgs {
    /// Synthetic orders to insert after creating the schema.
    #[arg(long, default_value_t = 0)]
    rows: usize,
    /// Random seed for synthetic orders.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand, Serialize)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct VersionArgs {
    /// Include additional build metadata fields.
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// Operation partially succeeded.
    #[error("{0}")]
    Partial(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
            Self::Partial(_) => 4,
        }
    }
}

impl From<SreError> for CliError {
    fn from(err: SreError) -> Self {
        match err {
            SreError::InvalidConfig { .. }
            | SreError::MissingConfig { .. }
            | SreError::ConfigParse { .. }
            | SreError::UnknownReport { .. }
            | SreError::InvalidParameter { .. } => Self::User(err.to_string()),
            SreError::DuplicateReport { .. } | SreError::InvalidDefinition { .. } => {
                Self::Internal(err.to_string())
            }
            _ => Self::Runtime(err.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::List => run_list(cli),
        Command::Show(args) => run_show(cli, args),
        Command::Run(args) => run_report(cli, args),
        Command::Session(args) => run_session(cli, args),
        Command::InitDb(args) => run_init_db(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Version(args) => emit_version(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = &cli.db {
        config.database.path.clone_from(path);
    }
    Ok(config)
}

// ──────────────────── navigation ────────────────────

fn run_list(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let registry = builtin_registry(&config.reports)?;
    print_list(&registry, output_mode(cli))
}

fn print_list(registry: &ReportRegistry, mode: OutputMode) -> Result<(), CliError> {
    match mode {
        OutputMode::Human => {
            for (position, definition) in registry.iter().enumerate() {
                println!(
                    "{:>3}. {} {}",
                    position + 1,
                    format!("{:<24}", definition.id).bold(),
                    definition.title
                );
                for spec in &definition.parameters {
                    println!(
                        "       {}={} {}",
                        spec.name,
                        spec.default,
                        format!("({})", spec.accepts()).dimmed()
                    );
                }
            }
        }
        OutputMode::Json => {
            let mut reports = Vec::with_capacity(registry.len());
            for (position, definition) in registry.iter().enumerate() {
                reports.push(json!({
                    "number": position + 1,
                    "id": definition.id,
                    "title": definition.title,
                    "parameters": serde_json::to_value(&definition.parameters)?,
                }));
            }
            write_json_line(&json!({ "command": "list", "reports": reports }))?;
        }
    }
    Ok(())
}

fn run_show(cli: &Cli, args: &ShowArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let registry = builtin_registry(&config.reports)?;
    let definition = registry.resolve_selector(&args.report)?;

    let views: Vec<(Option<&str>, &str)> = match &definition.body {
        ReportBody::Single(variant) => vec![(None, variant.sql.as_str())],
        ReportBody::ByChoice { variants, .. } => variants
            .iter()
            .map(|(name, variant)| (Some(name.as_str()), variant.sql.as_str()))
            .collect(),
    };

    match output_mode(cli) {
        OutputMode::Human => {
            println!("{} ({})", definition.title.bold(), definition.id);
            println!("Parameters:");
            for spec in &definition.parameters {
                println!("  {:<14} default {:<12} accepts {}", spec.name, spec.default, spec.accepts());
            }
            for (name, sql) in views {
                if let Some(name) = name {
                    println!("View {}", name.cyan());
                }
                if args.sql {
                    for line in sql.lines() {
                        println!("    {}", line.trim_end());
                    }
                }
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "show",
                "report": serde_json::to_value(definition)?,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ──────────────────── running reports ────────────────────

fn run_report(cli: &Cli, args: &RunArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let registry = builtin_registry(&config.reports)?;
    let overrides = args
        .params
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let log = ActivityLog::open(&config.logging);
    let mut db = FileProvider::from_config(&config.database).connect()?;
    let mut dispatcher = Dispatcher::new(&registry).with_activity_log(&log);
    let mut surface = CliSurface::new(output_mode(cli), args.limit);

    let outcome = dispatcher.dispatch(&args.report, &overrides, &db, &mut surface);
    db.close()?;
    log.flush();
    surface.finish()?;

    match outcome? {
        DispatchOutcome::Rendered(_) => Ok(()),
        DispatchOutcome::Failed(warning) if warning.code == "SRE-2102" => Err(CliError::User(format!(
            "{} was not rendered",
            warning.report_id
        ))),
        DispatchOutcome::Failed(warning) => Err(CliError::Runtime(format!(
            "{} was not rendered",
            warning.report_id
        ))),
    }
}

fn run_session(cli: &Cli, args: &SessionArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let registry = builtin_registry(&config.reports)?;
    let mode = output_mode(cli);

    let log = ActivityLog::open(&config.logging);
    let mut db = FileProvider::from_config(&config.database).connect()?;
    log.record(&LogEntry {
        details: Some(db.label().to_string()),
        ..LogEntry::new(EventType::SessionStart, Severity::Info)
    });

    let mut dispatcher = Dispatcher::new(&registry).with_activity_log(&log);
    let mut surface = CliSurface::new(mode, args.limit);
    let mut selections = 0usize;
    let mut fatal = None;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line {
            "quit" | "exit" => break,
            "list" => {
                print_list(&registry, mode)?;
                continue;
            }
            _ => {}
        }

        let mut words = line.split_whitespace();
        let Some(selector) = words.next() else {
            continue;
        };
        selections += 1;
        let overrides = match words.map(parse_assignment).collect::<Result<Vec<_>, _>>() {
            Ok(overrides) => overrides,
            Err(err) => {
                surface.warn(&Warning::from_error(selector, &err));
                continue;
            }
        };

        match dispatcher.dispatch(selector, &overrides, &db, &mut surface) {
            Ok(_) => {}
            Err(err @ SreError::UnknownReport { .. }) => surface.warn(&Warning::from_error(selector, &err)),
            Err(err) => {
                fatal = Some(err);
                break;
            }
        }
    }

    db.close()?;
    log.record(&LogEntry {
        details: Some(format!("selections={selections} failed={}", surface.failed)),
        ..LogEntry::new(EventType::SessionEnd, Severity::Info)
    });
    log.flush();
    surface.finish()?;

    if let Some(err) = fatal {
        return Err(err.into());
    }
    if surface.failed > 0 {
        return Err(CliError::Partial(format!(
            "{} of {selections} selections failed",
            surface.failed
        )));
    }
    Ok(())
}

/// Writes rendered reports and warnings to stdout (warnings to stderr in
/// human mode). Write failures are held until [`CliSurface::finish`].
struct CliSurface {
    mode: OutputMode,
    limit: usize,
    failed: usize,
    write_error: Option<io::Error>,
}

impl CliSurface {
    fn new(mode: OutputMode, limit: usize) -> Self {
        Self {
            mode,
            limit,
            failed: 0,
            write_error: None,
        }
    }

    fn keep(&mut self, outcome: io::Result<()>) {
        if let Err(e) = outcome
            && self.write_error.is_none()
        {
            self.write_error = Some(e);
        }
    }

    fn finish(&mut self) -> Result<(), CliError> {
        self.write_error.take().map_or(Ok(()), |e| Err(e.into()))
    }
}

impl RenderSurface for CliSurface {
    fn render(&mut self, definition: &ReportDefinition, params: &ResolvedParams, result: &NormalizedResult) {
        let outcome = match self.mode {
            OutputMode::Human => print_result_human(definition, params, result, self.limit),
            OutputMode::Json => print_result_json(definition, params, result),
        };
        self.keep(outcome);
    }

    fn warn(&mut self, warning: &Warning) {
        self.failed += 1;
        let outcome = match self.mode {
            OutputMode::Human => {
                eprintln!(
                    "{} {}: {}",
                    "warning:".yellow().bold(),
                    warning.report_id,
                    warning.message
                );
                Ok(())
            }
            OutputMode::Json => json_line(&json!({
                "event": "warning",
                "report_id": warning.report_id,
                "code": warning.code,
                "message": warning.message,
            })),
        };
        self.keep(outcome);
    }
}

fn params_object(params: &ResolvedParams) -> Value {
    let map: Map<String, Value> = params
        .display_pairs()
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();
    Value::Object(map)
}

fn print_result_json(
    definition: &ReportDefinition,
    params: &ResolvedParams,
    result: &NormalizedResult,
) -> io::Result<()> {
    json_line(&json!({
        "event": "report_rendered",
        "report_id": definition.id,
        "title": definition.title,
        "params": params_object(params),
        "result": serde_json::to_value(result)?,
    }))
}

fn print_result_human(
    definition: &ReportDefinition,
    params: &ResolvedParams,
    result: &NormalizedResult,
    limit: usize,
) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{} ({})", definition.title.bold(), definition.id)?;
    let pairs: Vec<String> = params
        .display_pairs()
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    writeln!(out, "{}", pairs.join(" ").dimmed())?;

    for metric in result.metrics() {
        let value = match &metric.value {
            MetricValue::Number(n) => format_number(*n),
            MetricValue::Text(t) => t.clone(),
        };
        let delta = metric.delta.map_or_else(String::new, |d| {
            if d < 0.0 {
                format!(" ▼ {}%", format_number(d.abs())).red().to_string()
            } else {
                format!(" ▲ {}%", format_number(d)).green().to_string()
            }
        });
        writeln!(out, "  {:<34} {}{delta}", metric.label, value.bold())?;
    }

    if result.series().is_empty() {
        return Ok(());
    }

    let key_width = result
        .index()
        .iter()
        .map(|k| k.chars().count())
        .max()
        .unwrap_or(0)
        .max(5);
    let widths: Vec<usize> = result
        .series()
        .iter()
        .map(|s| s.name.chars().count().max(12))
        .collect();

    writeln!(out)?;
    let mut header = format!("  {:<key_width$}", "");
    for (series, width) in result.series().iter().zip(widths.iter().copied()) {
        header.push_str(&format!("  {:>width$}", series.name));
    }
    writeln!(out, "{}", header.bold())?;

    let first = &result.series()[0];
    let max = first.values.iter().copied().fold(0.0_f64, f64::max);
    for (row, key) in result.index().iter().enumerate().take(limit) {
        let mut line = format!("  {key:<key_width$}");
        for (series, width) in result.series().iter().zip(widths.iter().copied()) {
            line.push_str(&format!("  {:>width$}", format_number(series.values[row])));
        }
        writeln!(out, "{line}  {}", bar(first.values[row], max).cyan())?;
    }
    let hidden = result.index().len().saturating_sub(limit);
    if hidden > 0 {
        writeln!(out, "  {}", format!("… {hidden} more rows").dimmed())?;
    }
    Ok(())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || !value.is_finite() {
        return String::new();
    }
    let filled = ((value.max(0.0) / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(filled.min(BAR_WIDTH))
}

// ──────────────────── database setup ────────────────────

fn run_init_db(cli: &Cli, args: &InitDbArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let log = ActivityLog::open(&config.logging);
    let mut db = FileProvider::from_config(&config.database).writable().connect()?;

    let conn = db.live_mut()?;
    create_schema(conn)?;
    let inserted = if args.rows > 0 {
        seed_orders(conn, args.rows, args.seed)?
    } else {
        0
    };
    let total = order_count(conn)?;
    let label = db.label().to_string();
    db.close()?;

    log.record(&LogEntry {
        rows: Some(inserted as u64),
        details: Some(format!("path={label} seed={} total={total}", args.seed)),
        ..LogEntry::new(EventType::DatabaseSeeded, Severity::Info)
    });
    log.flush();

    match output_mode(cli) {
        OutputMode::Human => {
            println!("Database ready: {label}");
            println!("  Inserted: {inserted}");
            println!("  Total orders: {total}");
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "init-db",
                "path": label,
                "inserted": inserted,
                "total_orders": total,
                "seed": args.seed,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ──────────────────── config ────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = load_config(cli)?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match load_config(cli) {
            Ok(config) => {
                let hash = config.stable_hash()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.paths.config_file.to_string_lossy(),
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        eprintln!("Configuration is INVALID: {e}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

fn emit_version(cli: &Cli, args: &VersionArgs) -> Result<(), CliError> {
    let version = env!("CARGO_PKG_VERSION");
    let package = env!("CARGO_PKG_NAME");
    let target = option_env!("TARGET").unwrap_or("unknown");
    let profile = option_env!("PROFILE").unwrap_or("unknown");
    let git_sha = option_env!("GIT_SHA").unwrap_or("unknown");

    match output_mode(cli) {
        OutputMode::Human => {
            println!("sre {version}");
            if args.verbose {
                println!("package: {package}");
                println!("target: {target}");
                println!("profile: {profile}");
                println!("git_sha: {git_sha}");
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "binary": "sre",
                "version": version,
                "package": package,
                "build": {
                    "target": target,
                    "profile": profile,
                    "git_sha": git_sha,
                }
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ──────────────────── output ────────────────────

fn json_line(payload: &Value) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    json_line(payload)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("SRE_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
