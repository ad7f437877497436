//! CLI entry point — one subcommand per scheduled job.
//!
//! The external scheduler (cron, Airflow, a systemd timer) invokes
//! `dispatch` and `sync` on their own cadences and passes its data
//! interval through `--interval-start/--interval-end`; manual runs fall
//! back to a trailing window.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vettra::annotation::HttpAnnotationClient;
use vettra::api::{self, ApiContext};
use vettra::config::{self, Config};
use vettra::pipeline::{self, TimeWindow};
use vettra::store::FsObjectStore;

#[derive(Parser)]
#[command(
    name = "vettra",
    version,
    about = "Human-in-the-loop review pipeline for an LLM answering service"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one time window and log the review sample, without dispatching.
    Triage(WindowArgs),
    /// Periodic dispatch job: triage the window, archive the split, import the sample.
    Dispatch(WindowArgs),
    /// Periodic sync job: write completed verdicts back to the session store.
    Sync,
    /// Full pipeline in a single run.
    RunOnce {
        #[command(flatten)]
        window: WindowArgs,
        /// Block until every task is annotated before syncing (deprecated;
        /// prefer separate dispatch and sync jobs).
        #[arg(long)]
        wait: bool,
    },
    /// Serve the session status API.
    Serve,
}

#[derive(Args)]
struct WindowArgs {
    /// Scheduler-supplied interval start (RFC 3339).
    #[arg(long, requires = "interval_end")]
    interval_start: Option<DateTime<Utc>>,
    /// Scheduler-supplied interval end (RFC 3339).
    #[arg(long, requires = "interval_start")]
    interval_end: Option<DateTime<Utc>>,
    /// Trailing window for manual runs, in minutes.
    #[arg(long, default_value_t = 30)]
    window_minutes: i64,
}

impl WindowArgs {
    fn window(&self) -> TimeWindow {
        match (self.interval_start, self.interval_end) {
            (Some(start), Some(end)) => TimeWindow::new(start, end),
            _ => TimeWindow::trailing(self.window_minutes),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    tracing::info!("Vettra starting v{}", config::APP_VERSION);

    if let Err(e) = run(cli.command, &config) {
        tracing::error!(error = %e, "Run failed");
        std::process::exit(1);
    }
}

fn run(command: Command, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = FsObjectStore::open(&config.data_root)?;

    match command {
        Command::Triage(args) => {
            let outcome = pipeline::run_triage_job(&store, config, &args.window())?;
            for session in &outcome.selected {
                tracing::info!(
                    key = %session.key,
                    class = ?session.class,
                    confidence = session.confidence,
                    "Selected for review"
                );
            }
        }
        Command::Dispatch(args) => {
            let gateway = HttpAnnotationClient::from_config(config);
            pipeline::run_dispatch_job(&store, &gateway, config, &args.window())?;
        }
        Command::Sync => {
            let gateway = HttpAnnotationClient::from_config(config);
            pipeline::run_sync_job(&store, &gateway, config)?;
        }
        Command::RunOnce { window, wait } => {
            let gateway = HttpAnnotationClient::from_config(config);
            pipeline::run_once(&store, &gateway, config, &window.window(), wait)?;
        }
        Command::Serve => serve(config, store)?,
    }
    Ok(())
}

/// Run the status API until Ctrl-C.
///
/// The pipeline subcommands stay synchronous (blocking HTTP client); only
/// serving needs a tokio runtime, so it is built here rather than wrapping
/// `main`.
fn serve(config: &Config, store: FsObjectStore) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let ctx = ApiContext::new(Arc::new(store), config.source_prefix.clone());
        let mut server = api::start_status_server(ctx, config.status_bind).await?;
        tracing::info!(addr = %server.addr, "Status API ready; Ctrl-C to stop");

        tokio::signal::ctrl_c().await?;
        server.shutdown();
        Ok(())
    })
}
