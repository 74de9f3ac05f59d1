//! Command-line surface of `prom-top`.

use crate::compose::{ComposedQuery, QueryComposer, QueryType, TemplateRegistry};
use crate::exit_codes::ExitCode;
use crate::logging::{self, LogFormat};
use crate::output::{build_insert, render_csv, render_text, schema_json, RunEnvelope};
use crate::prom::{EvalContext, PrometheusClient};
use crate::top::{QueryConfig, Top, TopReport};
use clap::{Args, Parser, Subcommand};
use ptop_common::{Error, OutputFormat, Result, RunId};
use ptop_config::{resolve_config, validate, ResolvedConfig, ToolConfig};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "prom-top",
    version,
    about = "Collate windowed Prometheus aggregates into one record per workload"
)]
pub struct Cli {
    /// Config file (TOML, YAML or JSON)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// More logging (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Overrides applied on top of the resolved config.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Prometheus HTTP API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub prometheus_url: Option<String>,

    /// Query type: quantile|q, average|a, instant|i; anything else runs the four windowed kinds
    #[arg(short = 't', long, global = true, value_name = "SELECTOR")]
    pub query_type: Option<String>,

    /// Time range, e.g. 10m, 1h
    #[arg(short, long, global = true, value_name = "RANGE")]
    pub range: Option<String>,

    /// Target metric (repeatable, replaces the configured list)
    #[arg(long = "metric", global = true, value_name = "NAME")]
    pub metrics: Vec<String>,

    /// Run deadline in seconds (0 disables)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Tag stored in the SQL version column
    #[arg(long, global = true)]
    pub build_version: Option<String>,

    /// Target table for SQL output
    #[arg(long, global = true)]
    pub table: Option<String>,
}

impl RunArgs {
    pub fn apply(&self, config: &mut ToolConfig) {
        if let Some(url) = &self.prometheus_url {
            config.prometheus_url.clone_from(url);
        }
        if let Some(query_type) = &self.query_type {
            config.query_type.clone_from(query_type);
        }
        if let Some(range) = &self.range {
            config.range.clone_from(range);
        }
        if !self.metrics.is_empty() {
            config.metrics.clone_from(&self.metrics);
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(version) = &self.build_version {
            config.build_version.clone_from(version);
        }
        if let Some(table) = &self.table {
            config.table.clone_from(table);
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the composed queries without contacting Prometheus
    Queries,
    /// Show the resolved configuration and validation results
    Config,
    /// Print the JSON Schema of the JSON output
    Schema,
}

impl Cli {
    fn verbosity(&self) -> i8 {
        if self.quiet {
            -1
        } else {
            self.verbose.min(3) as i8
        }
    }
}

/// Run a parsed command line and return the process exit code.
pub fn execute(cli: Cli) -> ExitCode {
    logging::init(cli.verbosity(), cli.log_format);
    let format = cli.format;
    match dispatch(&cli) {
        Ok(code) => code,
        Err(err) => {
            let code = ExitCode::from(&err);
            if format == OutputFormat::Json {
                let body = json!({ "error": { "code": err.code(), "message": err.to_string() } });
                println!("{body}");
            } else {
                eprintln!("prom-top: {err}");
            }
            code
        }
    }
}

fn dispatch(cli: &Cli) -> Result<ExitCode> {
    if let Some(Command::Schema) = cli.command {
        emit(&schema_json()?)?;
        return Ok(ExitCode::Clean);
    }

    let resolved = load_config(cli)?;
    let report = validate(&resolved.config);
    for warning in &report.warnings {
        warn!(target: "ptop.config", "{warning}");
    }

    if let Some(Command::Config) = cli.command {
        let body = json!({
            "source": resolved.source.path(),
            "env_overrides": &resolved.env_overrides,
            "config": resolved.config.redacted(),
            "errors": report.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
            "warnings": &report.warnings,
        });
        emit(&serde_json::to_string_pretty(&body)?)?;
        return Ok(if report.is_ok() {
            ExitCode::Clean
        } else {
            ExitCode::ConfigError
        });
    }

    if !report.is_ok() {
        let message = report
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::Config(message));
    }

    let config = &resolved.config;
    let top = Top::new(
        TemplateRegistry::builtin(),
        QueryComposer::new(config.metrics.iter().cloned()),
    );
    let query_type = QueryType::from_selector(&config.query_type);

    if let Some(Command::Queries) = cli.command {
        let queries = top
            .plan(query_type, config.effective_range())
            .map_err(|e| Error::Composition(e.to_string()))?;
        emit(&render_queries(&queries, cli.format)?)?;
        return Ok(ExitCode::for_records(queries.len()));
    }

    let report = run(&top, config, query_type)?;
    emit(&render_report(&report, config, cli.format)?)?;
    Ok(ExitCode::for_records(report.records.len()))
}

fn load_config(cli: &Cli) -> Result<ResolvedConfig> {
    let mut resolved =
        resolve_config(cli.config.as_deref()).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    cli.run.apply(&mut resolved.config);
    info!(
        target: "ptop.config",
        source = ?resolved.source,
        env_overrides = ?resolved.env_overrides,
        "Configuration resolved"
    );
    Ok(resolved)
}

fn run(top: &Top, config: &ToolConfig, query_type: QueryType) -> Result<TopReport> {
    let mut client = PrometheusClient::new(config.prometheus_url.as_str());
    if let Some(token) = &config.bearer_token {
        client = client.with_bearer_token(token.as_str());
    }
    let context = if config.timeout_secs == 0 {
        EvalContext::background()
    } else {
        let timeout = Duration::from_secs(config.timeout_secs);
        client = client.with_request_timeout(timeout);
        EvalContext::with_timeout(timeout)
    };

    let cfg = QueryConfig::new(&client)
        .with_context(context)
        .with_query_type(query_type)
        .with_range(config.effective_range());
    Ok(top.run(&cfg)?)
}

fn render_queries(queries: &[ComposedQuery], format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(queries)?);
    }
    let mut out = String::new();
    for q in queries {
        out.push_str(&format!("{}\t{}\t{}\n", q.metric, q.kind, q.query));
    }
    Ok(out)
}

fn render_report(report: &TopReport, config: &ToolConfig, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Table => render_text(&report.records),
        OutputFormat::Csv => render_csv(&report.records),
        OutputFormat::Json => {
            let envelope = RunEnvelope::from_report(RunId::new(), report);
            serde_json::to_string_pretty(&envelope)?
        }
        OutputFormat::Sql => build_insert(&config.table, &config.build_version, &report.records)
            .map(|stmt| stmt.to_script())
            .unwrap_or_default(),
    })
}

fn emit(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    if !text.is_empty() && !text.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}
