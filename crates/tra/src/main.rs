//! TRA - Main Entry Point
//!
//! Resolves candidates from JSON record files and prints the report.
//!
//! Usage:
//!     tra records.json crm.json
//!     tra --config tra.json --timeout-ms 5000 records.json

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use chrono::NaiveDate;
use tra::fetch::{gather_records, JsonFileFetcher, SourceFetcher, DEFAULT_CONCURRENCY};
use tra::runner::{shutdown_signal, BatchRunner, RunReport, DEFAULT_TIMEOUT};
use tra_core::Engine;

#[derive(Parser, Debug)]
#[command(name = "tra")]
#[command(about = "Resolve talent claims into scored candidate profiles")]
#[command(version)]
struct Args {
    /// JSON files with records and claims
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Engine configuration file (defaults to $TRA_CONFIG, then built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Per-candidate deadline in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,

    /// Candidates resolved at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Date recency is measured against (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> tra::Result<()> {
    let args = Args::parse();
    tra::tracing::init_with_filter(&args.log_level);

    info!("Starting TRA v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args.config.clone().or_else(tra::config::env_path);
    let config = tra::config::load(config_path.as_deref())?;
    let mut engine = Engine::new(config)?;
    if let Some(today) = args.today {
        engine = engine.with_today(today);
    }

    let mut runner = BatchRunner::new(engine).timeout(Duration::from_millis(args.timeout_ms));
    if let Some(concurrency) = args.concurrency {
        runner = runner.concurrency(concurrency);
    }

    let fetchers: Vec<Arc<dyn SourceFetcher>> = args
        .inputs
        .iter()
        .map(|path| Arc::new(JsonFileFetcher::new(path)) as Arc<dyn SourceFetcher>)
        .collect();

    let report = tokio::select! {
        report = async {
            let gathered = gather_records(fetchers, DEFAULT_CONCURRENCY).await;
            let mut output = runner.run(gathered.batch).await;
            let mut rejected = gathered.rejected;
            rejected.append(&mut output.rejected);
            output.rejected = rejected;
            RunReport {
                output,
                fetch_failures: gathered.failures,
            }
        } => report,
        _ = shutdown_signal() => {
            warn!("interrupted before the batch completed; no report written");
            return Ok(());
        }
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);
    Ok(())
}
