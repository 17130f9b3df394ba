//! Metascan CLI
//!
//! Scans one file against MetaDefender Cloud and prints the verdict report.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use metascan::prelude::*;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "metascan")]
#[command(about = "Hash-first malware scanning against MetaDefender Cloud")]
#[command(version)]
struct Cli {
    /// File to scan
    file: PathBuf,

    /// MetaDefender API key
    #[arg(long, env = "METADEFENDER_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Service root URL
    #[arg(long, env = "METADEFENDER_BASE_URL", default_value = metascan::workflow::DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Delay between poll requests in milliseconds
    #[arg(long, default_value_t = 200)]
    poll_interval_ms: u64,

    /// Maximum number of poll requests
    #[arg(long, default_value_t = 1500)]
    max_poll_attempts: u32,

    /// Maximum time spent polling in seconds
    #[arg(long, default_value_t = 300)]
    max_poll_secs: u64,

    /// Digest used for the cache lookup (md5, sha1, sha256)
    #[arg(long = "hash", default_value = "md5")]
    digest_algorithm: DigestAlgorithm,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Append narration to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Debug-level narration
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let poll = PollConfig::new()
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_max_attempts(self.max_poll_attempts)
            .with_max_poll_time(Duration::from_secs(self.max_poll_secs));

        ClientConfig::new(self.api_key.as_str())
            .with_base_url(self.base_url.as_str())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_digest_algorithm(self.digest_algorithm)
            .with_poll(poll)
    }
}

/// Where narration is written.
#[derive(Debug)]
enum LogSink {
    File(File),
    Stderr,
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Picks the narration sink. A log file that cannot be opened falls back to
/// stderr and hands the open error back for reporting.
fn select_sink(log_file: Option<&Path>) -> (LogSink, Option<io::Error>) {
    match log_file.map(open_log_file) {
        Some(Ok(file)) => (LogSink::File(file), None),
        Some(Err(e)) => (LogSink::Stderr, Some(e)),
        None => (LogSink::Stderr, None),
    }
}

fn init_logging(log_file: Option<&Path>, verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (sink, open_error) = select_sink(log_file);
    match sink {
        LogSink::File(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        LogSink::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init(),
    }

    if let (Some(path), Some(e)) = (log_file, open_error) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "Cannot open log file, narrating to stderr"
        );
    }
}

async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.log_file.as_deref(), cli.verbose);

    let config = cli.client_config();
    let transport = HttpTransport::new(config.timeout)?;
    let orchestrator = Orchestrator::new(config, Arc::new(transport))?;

    let target = ScanTarget::load(cli.file.clone())?;
    let report = orchestrator
        .run(&target)
        .await
        .with_context(|| format!("scan of {} failed", cli.file.display()))?;

    match cli.format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        ),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
