#![doc = include_str!("../README.md")]

mod runner;

use clap::Parser;
use jobwatch::{CancellationToken, Distributor, RunSummary};
use runner::config::{CliArgs, RunConfig};
use runner::sink::OutputSink;
use runner::telemetry::init_telemetry;
use runner::workload::generate_queue;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = RunConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let cancel = CancellationToken::new();
    let distributor = Distributor::new(config.distributor_config().with_cancel(cancel.clone()))?;
    let queue = generate_queue(config.jobs, config.min_delay, config.max_delay, config.seed);
    let sink = OutputSink::stdout(config.format);

    // Workers, aggregator and reporter are OS threads; keep them off the async
    // runtime so signal handling stays responsive.
    let mut run = tokio::task::spawn_blocking(move || distributor.run(queue, sink));

    let summary = tokio::select! {
        res = &mut run => res??,
        () = shutdown_signal() => {
            tracing::info!("Cancelling remaining jobs, waiting for in-flight jobs to finish");
            cancel.cancel();
            run.await??
        }
    };

    log_summary(&summary);
    Ok(())
}

fn log_startup_info(config: &RunConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting run with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting run of {} jobs on {} workers",
            config.jobs,
            config.workers
        );
    }
}

fn log_summary(summary: &RunSummary) {
    if !summary.skipped.is_empty() {
        tracing::warn!(
            "{} job(s) were never dispatched: {:?}",
            summary.skipped.len(),
            summary.skipped
        );
    }
    if summary.abandoned > 0 {
        tracing::warn!("{} job(s) abandoned after cancellation", summary.abandoned);
    }
    tracing::info!(
        "Run finished: {} complete, {} failed",
        summary.snapshot.complete.len(),
        summary.snapshot.failed.len()
    );
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
