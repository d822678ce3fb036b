//! Cloud service health check
//!
//! Exits 0 when every requested service is healthy and 1 otherwise,
//! including configuration and fetch failures.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cloud_health_check::HealthError;
use cloud_health_check::build_info;
use cloud_health_check::config::{CheckConfig, ConfigOverrides};
use cloud_health_check::health::{self, ReportFormat, Verdict};
use cloud_health_check::source::{EventSource, HttpEventSource, JsonFileSource};

/// Services listed by `--list-services`
const KNOWN_SERVICES: [&str; 8] = [
    "Amazon S3",
    "Amazon CloudFront",
    "Amazon EC2",
    "Amazon ECS",
    "Amazon SQS",
    "Amazon RDS",
    "Amazon SSM",
    "Route 53",
];

/// Check cloud service health and exit non-zero on any degradation
#[derive(Debug, Parser)]
#[command(name = "health-check")]
#[command(version = build_info::PKG_VERSION, long_version = build_info::long_version())]
#[command(about = "Check cloud service health", long_about = None)]
struct Cli {
    /// Comma-separated services to check (overrides AWS_SERVICES)
    #[arg(short, long)]
    services: Option<String>,

    /// Region to query
    #[arg(short, long)]
    region: Option<String>,

    /// Read events from a JSON health feed document
    #[arg(long, conflicts_with = "endpoint")]
    events_file: Option<PathBuf>,

    /// Fetch events from an HTTP health feed
    #[arg(long)]
    endpoint: Option<String>,

    /// Days of history to query
    #[arg(long)]
    lookback_days: Option<i64>,

    /// Additional configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report layout
    #[arg(long, value_enum, default_value_t = ReportFormat::Lines)]
    format: ReportFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Print the known service names and exit
    #[arg(long)]
    list_services: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            services: self.services.clone(),
            region: self.region.clone(),
            events_file: self.events_file.clone(),
            endpoint: self.endpoint.clone(),
            lookback_days: self.lookback_days,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    if cli.list_services {
        println!("Available services:");
        println!("{}", KNOWN_SERVICES.join(", "));
        std::process::exit(1);
    }

    match run(&cli) {
        Ok(verdict) => std::process::exit(verdict.exit_code()),
        Err(err) => {
            report_error(&err);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<Verdict> {
    let config = CheckConfig::load(cli.config.as_deref(), &cli.overrides())
        .context("failed to load configuration")?;

    let services = config.service_names();
    if services.is_empty() {
        return Err(HealthError::InvalidInput("no services specified".to_string()).into());
    }

    let source = build_source(&config)?;
    let query = config.query(Utc::now());
    info!(
        services = services.len(),
        region = query.region.as_deref().unwrap_or("all"),
        start = %query.window.start,
        end = %query.window.end,
        source = %source.describe(),
        "Checking service health"
    );

    let aggregation = health::check_services(source.as_ref(), &query)?;
    health::print_report(&aggregation, cli.format);

    let verdict = aggregation.verdict();
    info!(
        ?verdict,
        healthy = aggregation.healthy_count(),
        unhealthy = aggregation.unhealthy_count(),
        unmatched = aggregation.unmatched.len(),
        "Health check finished"
    );
    Ok(verdict)
}

fn build_source(config: &CheckConfig) -> anyhow::Result<Box<dyn EventSource>> {
    match (&config.source.events_file, &config.source.endpoint) {
        (Some(path), endpoint) => {
            if endpoint.is_some() {
                warn!("Both events_file and endpoint are configured, using events_file");
            }
            Ok(Box::new(JsonFileSource::new(path)))
        }
        (None, Some(endpoint)) => {
            let timeout = Duration::from_secs(config.source.timeout_secs);
            let source = HttpEventSource::new(endpoint, config.credentials(), timeout)
                .map_err(HealthError::from)?;
            Ok(Box::new(source))
        }
        (None, None) => {
            bail!("no event source configured (set source.events_file or source.endpoint)")
        }
    }
}

fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<HealthError>() {
        Some(HealthError::InvalidInput(_)) => {
            eprintln!("No services specified. Exiting.");
        }
        Some(health_err) if health_err.is_missing_credentials() => {
            eprintln!("{}", "No AWS credentials found".red());
        }
        _ => {
            eprintln!(
                "{} {:#}",
                "An unexpected error occurred:".red().bold(),
                err
            );
        }
    }
}
