use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use dashmap::DashMap;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scandrop_core::{EventHandler, PathFilter, RemoteError, UploadClient, UploadJob};
use scandrop_remote::HttpUploadClient;
use scandrop_watcher::banner;
use scandrop_watcher::config::Config;
use scandrop_watcher::dispatcher::{spawn_workers, Dispatcher};
use scandrop_watcher::pipeline::UploadPipeline;
use scandrop_watcher::source::EventSource;

/// Queued jobs waiting for a worker.
const JOB_QUEUE_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    banner::log_system_info(&config.watch_path, &config.remote_target);

    let filter = PathFilter::new(&config.filter_config()).context("invalid filter patterns")?;

    let client: Arc<dyn UploadClient> = Arc::new(HttpUploadClient::new(&config.base_url));
    let pipeline = Arc::new(UploadPipeline::new(
        client,
        config.credentials(),
        config.retry_policy(),
    ));

    let (job_tx, job_rx) = mpsc::channel::<UploadJob>(JOB_QUEUE_CAPACITY);
    let (fatal_tx, mut fatal_rx) = mpsc::channel::<RemoteError>(1);
    let in_flight: Arc<DashMap<PathBuf, ()>> = Arc::new(DashMap::new());

    let dispatcher = Arc::new(Dispatcher::new(
        filter,
        config.remote_target.clone(),
        job_tx,
        in_flight.clone(),
    ));
    let workers = spawn_workers(
        config.workers,
        pipeline,
        job_rx,
        in_flight,
        fatal_tx,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    spawn_signal_listener(shutdown_tx.clone());

    let source = EventSource::new(config.watch_path.clone(), config.recursive);
    let handler: Arc<dyn EventHandler> = dispatcher.clone();
    let mut source_task = tokio::spawn(async move { source.run(handler, shutdown_rx).await });

    let mut fatal: Option<RemoteError> = None;
    tokio::select! {
        Some(err) = fatal_rx.recv() => {
            error!("Fatal error, shutting down: {}", err);
            let _ = shutdown_tx.send(true);
            let _ = (&mut source_task).await;
            fatal = Some(err);
        }
        joined = &mut source_task => {
            joined.context("watcher task panicked")??;
        }
    }

    // Close the intake so the workers drain the queue and exit.
    drop(dispatcher);
    for worker in workers {
        let _ = worker.await;
    }

    match fatal {
        Some(err) => Err(err.into()),
        None => {
            info!("Shutdown complete");
            Ok(())
        }
    }
}

/// Trigger the shutdown channel on Ctrl+C or SIGTERM.
fn spawn_signal_listener(tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
            info!("Received Ctrl+C, initiating shutdown");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
            info!("Received SIGTERM, initiating shutdown");
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        let _ = tx.send(true);
    });
}
