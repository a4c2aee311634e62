//! Triage Console CLI
//!
//! Terminal operator console for the alert triage backend.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::future::Future;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tc_client::{ApiClient, Console, ConsoleError, ConsoleResult, ViewScope};
use tc_core::{AlertPayload, CaseFilter, Decision, ReplayRequest};
use tc_observability::{case_span, init_logging_with_config, parse_level, view_span, LoggingConfig};
use tracing::{info, Instrument};

mod config;
mod render;
mod validator;

use config::{default_config_path, AppConfig};
use render::TextGraphSurface;
use validator::ConfigValidator;

#[derive(Parser)]
#[command(name = "triage-console")]
#[command(version)]
#[command(about = "Operator console for the alert triage backend", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Backend URL, overrides the config file and TRIAGE_CONSOLE_API_URL
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check backend readiness
    Ready,

    /// Show dashboard counters and cases over time (24h)
    Overview,

    /// List cases from the last 24 hours
    Cases {
        /// Free-text search over entities, case ids and summaries
        #[arg(short, long, default_value = "")]
        query: String,

        /// Decision to match (AUTO_CLOSE, CREATE_TICKET, ESCALATE)
        #[arg(short, long)]
        decision: Option<Decision>,

        /// Minimum severity (0-100)
        #[arg(long, default_value = "0", value_parser = clap::value_parser!(u8).range(0..=100))]
        severity_min: u8,

        /// Routing queue to match
        #[arg(long)]
        queue: Option<String>,
    },

    /// Show one case
    Case {
        /// Case ID
        id: String,

        /// Print the entity graph as Graphviz DOT instead
        #[arg(long)]
        dot: bool,
    },

    /// List replay experiments
    Experiments,

    /// Show before/after metrics for one experiment
    Experiment {
        /// Experiment ID
        id: String,
    },

    /// Replay historical alerts with config overrides
    Replay {
        /// Window length in minutes, ending at --until
        #[arg(short, long)]
        minutes: Option<i64>,

        /// Window start (RFC 3339)
        #[arg(long)]
        since: Option<String>,

        /// Window end (RFC 3339), defaults to now
        #[arg(long)]
        until: Option<String>,

        /// Config overrides as JSON
        #[arg(short, long)]
        overrides: Option<String>,
    },

    /// Show backend configuration
    Config {
        /// Print the local console configuration instead
        #[arg(long)]
        local: bool,

        /// Write a default console configuration file
        #[arg(long, conflicts_with = "local")]
        init: bool,
    },

    /// Show a playbook action
    Playbook {
        /// Action name, e.g. isolate_host
        name: String,
    },

    /// Submit a raw alert to the ingest webhook
    Ingest {
        /// Alert JSON file, stdin when omitted or `-`
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Idempotency key, a random UUID when omitted
        #[arg(long)]
        idempotency_key: Option<String>,
    },

    /// Validate the console configuration
    Validate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::resolve(cli.config.as_deref(), cli.api_url.as_deref())?;
    init_logging(&config, cli.verbose);

    match cli.command {
        Commands::Validate => return cmd_validate(&config),
        Commands::Config { local: true, .. } => return cmd_config_local(&config, cli.format),
        Commands::Config { init: true, .. } => return cmd_config_init(cli.config),
        _ => {}
    }

    check_config(&config, cli.verbose);
    let console = connect(&config)?;

    match cli.command {
        Commands::Ready => cmd_ready(&console, cli.format).await,
        Commands::Overview => cmd_overview(&console, cli.format).await,
        Commands::Cases {
            query,
            decision,
            severity_min,
            queue,
        } => {
            let filter = CaseFilter {
                query,
                decision,
                severity_min,
                queue,
            };
            cmd_cases(&console, filter, cli.format).await
        }
        Commands::Case { id, dot } => cmd_case(&console, &id, dot, cli.format).await,
        Commands::Experiments => cmd_experiments(&console, cli.format).await,
        Commands::Experiment { id } => cmd_experiment(&console, &id, cli.format).await,
        Commands::Replay {
            minutes,
            since,
            until,
            overrides,
        } => {
            let request = build_replay_request(
                &config,
                minutes,
                since.as_deref(),
                until.as_deref(),
                overrides.as_deref(),
                Utc::now(),
            )?;
            cmd_replay(&console, request, cli.format).await
        }
        Commands::Config { .. } => cmd_config_remote(&console, cli.format).await,
        Commands::Playbook { name } => cmd_playbook(&console, &name, cli.format).await,
        Commands::Ingest {
            file,
            idempotency_key,
        } => cmd_ingest(&console, file, idempotency_key, cli.format).await,
        Commands::Validate => cmd_validate(&config),
    }
}

fn init_logging(config: &AppConfig, verbose: bool) {
    let logging = if verbose {
        LoggingConfig::development()
    } else {
        let base = if config.logging.json_format {
            LoggingConfig::production()
        } else {
            LoggingConfig::default()
        };
        LoggingConfig {
            level: parse_level(&config.logging.level).unwrap_or(base.level),
            ..base
        }
    };

    if let Err(e) = init_logging_with_config(logging) {
        eprintln!("{} logging unavailable: {}", "Warning:".yellow(), e);
    }
}

/// Aborts on configuration errors; prints warnings and carries on.
fn check_config(config: &AppConfig, verbose: bool) {
    let result = ConfigValidator::validate(config);
    if result.has_errors() {
        result.print();
        eprintln!();
        eprintln!(
            "{}",
            "Aborted due to configuration errors. Fix the errors above and try again."
                .red()
                .bold()
        );
        std::process::exit(1);
    }
    if result.has_warnings() || verbose {
        result.print();
    }
}

fn connect(config: &AppConfig) -> Result<Console<ApiClient>> {
    let timeout = std::time::Duration::from_secs(config.timeout_secs);
    let client = ApiClient::new(&config.api_url, timeout)
        .with_context(|| format!("Failed to create client for {}", config.api_url))?;
    info!(api_url = %client.base_url(), "Connected console");
    Ok(Console::new(client))
}

/// Runs one view load inside a scope that Ctrl-C tears down.
async fn load_view<T, F>(name: &'static str, load: F) -> Result<T>
where
    F: Future<Output = ConsoleResult<T>>,
{
    let scope = Arc::new(ViewScope::new(name));

    let watcher = {
        let scope = Arc::clone(&scope);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                scope.teardown();
            }
        })
    };

    let outcome = scope.guard(load.instrument(view_span!(name))).await;
    watcher.abort();

    Ok(outcome.ok_or(ConsoleError::Cancelled)??)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_ready(console: &Console<ApiClient>, format: OutputFormat) -> Result<()> {
    let ready = load_view("ready", console.ready()).await?;

    if format == OutputFormat::Json {
        print_json(&serde_json::json!({
            "api_url": console.api().base_url(),
            "ready": ready,
        }))?;
    } else if ready {
        println!("{} {}", "Backend ready:".green().bold(), console.api().base_url());
    } else {
        println!("{} {}", "Backend not ready:".red().bold(), console.api().base_url());
    }

    if !ready {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_overview(console: &Console<ApiClient>, format: OutputFormat) -> Result<()> {
    let overview = load_view("overview", console.overview()).await?;

    match format {
        OutputFormat::Json => print_json(&overview)?,
        OutputFormat::Text => print!("{}", render::overview(&overview)),
    }
    Ok(())
}

async fn cmd_cases(
    console: &Console<ApiClient>,
    filter: CaseFilter,
    format: OutputFormat,
) -> Result<()> {
    let view = load_view("cases", async { Ok(console.cases(&filter).await) }).await?;

    match format {
        OutputFormat::Json => print_json(&view)?,
        OutputFormat::Text => print!("{}", render::case_table(&view)),
    }

    if view.error.is_some() {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_case(
    console: &Console<ApiClient>,
    case_id: &str,
    dot: bool,
    format: OutputFormat,
) -> Result<()> {
    let view = load_view("case", console.case_detail(case_id).instrument(case_span!(case_id)))
        .await?;

    if dot {
        print!("{}", view.graph.to_dot());
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_json(&view)?,
        OutputFormat::Text => print!("{}", render::case_detail(&view, &TextGraphSurface)?),
    }
    Ok(())
}

async fn cmd_experiments(console: &Console<ApiClient>, format: OutputFormat) -> Result<()> {
    let items = load_view("experiments", console.experiments()).await?;

    match format {
        OutputFormat::Json => print_json(&items)?,
        OutputFormat::Text => print!("{}", render::experiments(&items)),
    }
    Ok(())
}

async fn cmd_experiment(
    console: &Console<ApiClient>,
    experiment_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let comparison = load_view("experiment", console.experiment(experiment_id)).await?;

    match format {
        OutputFormat::Json => print_json(&comparison)?,
        OutputFormat::Text => print!("{}", render::comparison(&comparison)),
    }
    Ok(())
}

/// Builds the replay window from the flags and config defaults.
///
/// `--until` defaults to `now`. `--since` wins over `--minutes`, which
/// defaults to `replay.window_minutes`.
fn build_replay_request(
    config: &AppConfig,
    minutes: Option<i64>,
    since: Option<&str>,
    until: Option<&str>,
    overrides: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ReplayRequest> {
    let until = match until {
        Some(raw) => parse_time(raw, "--until")?,
        None => now,
    };
    let since = match since {
        Some(raw) => parse_time(raw, "--since")?,
        None => {
            let minutes = minutes.unwrap_or(config.replay.window_minutes);
            if minutes <= 0 {
                bail!("--minutes must be positive, got {}", minutes);
            }
            until - chrono::Duration::minutes(minutes)
        }
    };

    let config_overrides = match overrides {
        Some(raw) => serde_json::from_str(raw).context("--overrides is not valid JSON")?,
        None if config.replay.config_overrides.is_null() => serde_json::json!({}),
        None => config.replay.config_overrides.clone(),
    };

    Ok(ReplayRequest {
        since,
        until,
        config_overrides,
    })
}

fn parse_time(raw: &str, flag: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("{} '{}' is not an RFC 3339 timestamp", flag, raw))
}

async fn cmd_replay(
    console: &Console<ApiClient>,
    request: ReplayRequest,
    format: OutputFormat,
) -> Result<()> {
    let started = load_view("replay", console.start_replay(&request)).await?;

    if format == OutputFormat::Json {
        print_json(&started)?;
    } else {
        println!("{}", "Replay started".green().bold());
        println!("  Experiment: {}", started.experiment_id.bold());
        println!("  Window:     {} → {}", request.since.to_rfc3339(), request.until.to_rfc3339());
        println!();
        println!(
            "Run `triage-console experiment {}` to see the results.",
            started.experiment_id
        );
    }
    Ok(())
}

async fn cmd_config_remote(console: &Console<ApiClient>, format: OutputFormat) -> Result<()> {
    let config = load_view("config", console.config()).await?;

    match format {
        OutputFormat::Json => print_json(&config)?,
        OutputFormat::Text => {
            println!("{}", "Backend Configuration".bold());
            println!("─────────────────────");
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

fn cmd_config_local(config: &AppConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(config)?,
        OutputFormat::Text => {
            println!("{}", "Console Configuration".bold());
            println!("─────────────────────");
            print!("{}", serde_yaml::to_string(config)?);
        }
    }
    Ok(())
}

fn cmd_config_init(path: Option<PathBuf>) -> Result<()> {
    let path = match path.or_else(default_config_path) {
        Some(path) => path,
        None => bail!("No config directory available; pass --config <FILE>"),
    };
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    AppConfig::default().save(&path)?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}

fn cmd_validate(config: &AppConfig) -> Result<()> {
    println!("{}", "Validating configuration...".cyan());
    let result = ConfigValidator::validate(config);
    result.print();

    if result.has_errors() {
        println!();
        println!("{}", "Configuration validation failed.".red().bold());
        std::process::exit(1);
    }
    println!();
    println!("{}", "Configuration is valid.".green().bold());
    Ok(())
}

async fn cmd_playbook(console: &Console<ApiClient>, name: &str, format: OutputFormat) -> Result<()> {
    let markdown = load_view("playbook", console.playbook(name)).await?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "name": name.strip_suffix(".md").unwrap_or(name),
            "markdown": markdown,
        }))?,
        OutputFormat::Text => println!("{}", markdown),
    }
    Ok(())
}

fn read_alert(file: Option<PathBuf>) -> Result<AlertPayload> {
    let raw = match file.filter(|p| p.as_os_str() != "-") {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read alert file: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read alert from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("Alert is not a JSON object")
}

async fn cmd_ingest(
    console: &Console<ApiClient>,
    file: Option<PathBuf>,
    idempotency_key: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let alert = read_alert(file)?;
    let key = idempotency_key.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let accepted = load_view("ingest", console.submit_alert(&alert, Some(&key))).await?;

    if format == OutputFormat::Json {
        print_json(&accepted)?;
    } else {
        println!("{}", "Alert accepted".green().bold());
        println!("  Ingest ID:       {}", accepted.ingest_id);
        println!("  Status:          {}", accepted.status);
        println!("  Idempotency key: {}", key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cases_flags() {
        let cli = Cli::try_parse_from([
            "triage-console",
            "--format",
            "json",
            "cases",
            "--decision",
            "escalate",
            "--severity-min",
            "70",
        ])
        .unwrap();

        assert!(cli.format == OutputFormat::Json);
        match cli.command {
            Commands::Cases {
                decision,
                severity_min,
                ..
            } => {
                assert_eq!(decision, Some(Decision::Escalate));
                assert_eq!(severity_min, 70);
            }
            _ => panic!("expected cases"),
        }
    }

    #[test]
    fn test_severity_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["triage-console", "cases", "--severity-min", "101"]).is_err());
    }

    #[test]
    fn test_replay_defaults_to_config_window() {
        let config = AppConfig::default();
        let request = build_replay_request(&config, None, None, None, None, now()).unwrap();

        assert_eq!(request.until, now());
        assert_eq!(request.since, now() - chrono::Duration::minutes(60));
        assert_eq!(request.config_overrides, config.replay.config_overrides);
    }

    #[test]
    fn test_replay_explicit_window_and_overrides() {
        let config = AppConfig::default();
        let request = build_replay_request(
            &config,
            Some(5),
            Some("2024-05-01T09:00:00Z"),
            Some("2024-05-01T10:00:00+00:00"),
            Some(r#"{"scoring":{"weights":{"x":1}}}"#),
            now(),
        )
        .unwrap();

        assert_eq!(request.since, Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        assert_eq!(request.until, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        assert_eq!(request.config_overrides["scoring"]["weights"]["x"], 1);
    }

    #[test]
    fn test_replay_rejects_bad_input() {
        let config = AppConfig::default();
        assert!(build_replay_request(&config, Some(0), None, None, None, now()).is_err());
        assert!(build_replay_request(&config, None, Some("yesterday"), None, None, now()).is_err());
        assert!(build_replay_request(&config, None, None, None, Some("{"), now()).is_err());
    }

    #[tokio::test]
    async fn test_load_view_passes_result_through() {
        let value = load_view("test", async { Ok::<_, ConsoleError>(7) }).await.unwrap();
        assert_eq!(value, 7);

        let err = load_view("test", async { Err::<u8, _>(ConsoleError::Cancelled) })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("View closed"));
    }
}
