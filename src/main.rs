//! Summary reporter - command line entry point.
//!
//! Reads a finished run, uploads its report archive and history rows and
//! prints the report URL.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use summary_reporter::config::{Config, ConfigOverrides};
use summary_reporter::error::{ReporterError, ReporterResult};
use summary_reporter::models::RunInput;
use summary_reporter::services::{RunSummary, report_run};

#[derive(Parser, Debug)]
#[command(name = "summary-reporter", author, version, about, long_about = None)]
struct Cli {
    /// Run document written by the test runner (JSON)
    input: PathBuf,

    /// Environment tag; the ENVIRONMENT variable wins when set
    #[arg(long)]
    environment: Option<String>,

    /// Artifact store base URL; the API variable wins when set
    #[arg(long)]
    api: Option<String>,

    /// Maximum number of uploads in flight
    #[arg(long)]
    max_concurrent_uploads: Option<usize>,

    /// Timeout for each HTTP request in seconds
    #[arg(long)]
    upload_timeout_secs: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            environment: self.environment.clone(),
            api: self.api.clone(),
            max_concurrent_uploads: self.max_concurrent_uploads,
            upload_timeout_secs: self.upload_timeout_secs,
        }
    }
}

async fn read_run(path: &Path) -> ReporterResult<RunInput> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ReporterError::FileSystem(format!("Cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| ReporterError::InvalidInput(format!("{}: {}", path.display(), e)))
}

async fn run(cli: &Cli) -> ReporterResult<RunSummary> {
    let config = Config::load(&cli.overrides())?;
    let input = read_run(&cli.input).await?;
    info!(
        "Loaded {} tests from {} projects",
        input.test_count(),
        input.projects.len()
    );
    report_run(&config, &input).await
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    match run(&cli).await {
        Ok(summary) => {
            let build = &summary.build;
            if !build.warnings.is_empty() {
                warn!("Report built with {} warnings", build.warnings.len());
            }
            info!(
                "{} tests: {} expected, {} unexpected, {} flaky, {} skipped",
                build.report.stats.total,
                build.report.stats.expected,
                build.report.stats.unexpected,
                build.report.stats.flaky,
                build.report.stats.skipped
            );
            if let Some(test_id) = &build.single_test_id {
                info!("Single test run: {}", test_id);
            }
            println!("report_url: {}", summary.report_url);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
