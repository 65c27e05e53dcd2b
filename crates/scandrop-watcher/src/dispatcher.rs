//! Wires accepted creation events into the upload pipeline.
//!
//! The dispatcher is the injected [`EventHandler`]: creation events that pass
//! the filter become queued jobs, everything else is logged and left alone as
//! a reserved extension point. A bounded worker pool consumes the queue; the
//! default single worker keeps uploads strictly sequential in acceptance
//! order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use scandrop_core::{EventHandler, PathFilter, RemoteError, UploadJob};

use crate::pipeline::UploadPipeline;
use crate::sniff;

/// Filters and enqueues creation events.
pub struct Dispatcher {
    filter: PathFilter,
    remote_target: String,
    jobs: mpsc::Sender<UploadJob>,
    in_flight: Arc<DashMap<PathBuf, ()>>,
}

impl Dispatcher {
    pub fn new(
        filter: PathFilter,
        remote_target: String,
        jobs: mpsc::Sender<UploadJob>,
        in_flight: Arc<DashMap<PathBuf, ()>>,
    ) -> Self {
        Self {
            filter,
            remote_target,
            jobs,
            in_flight,
        }
    }
}

#[async_trait]
impl EventHandler for Dispatcher {
    async fn on_created(&self, path: &Path) {
        let is_directory = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        if !self.filter.accepts(path, is_directory) {
            debug!("Ignoring {}", path.display());
            return;
        }

        // Per-path exclusion: a burst of creation events for one file must
        // not produce duplicate concurrent jobs.
        if self.in_flight.insert(path.to_path_buf(), ()).is_some() {
            debug!("{} already queued, skipping duplicate event", path.display());
            return;
        }

        match sniff::detect(path).await {
            Some(kind) => info!(
                "{} created ({}, .{})",
                path.display(),
                kind.mime,
                kind.extension
            ),
            None => info!("{} created (unrecognized content)", path.display()),
        }

        let job = UploadJob::new(path.to_path_buf(), self.remote_target.clone());
        info!(
            "{}: queueing upload of {} to {}",
            job.id,
            path.display(),
            self.remote_target
        );

        if self.jobs.send(job).await.is_err() {
            self.in_flight.remove(path);
            warn!("Job queue closed, dropping {}", path.display());
        }
    }

    async fn on_modified(&self, path: &Path) {
        debug!("{} modified", path.display());
    }

    async fn on_deleted(&self, path: &Path) {
        debug!("{} deleted", path.display());
    }

    async fn on_moved(&self, from: &Path, to: &Path) {
        debug!("Moved {} to {}", from.display(), to.display());
    }
}

/// Spawn the worker pool consuming the job queue.
///
/// Each worker runs a job's protocol to a terminal state before taking the
/// next one. The first fatal error wins the capacity-1 channel; the runner
/// tears everything down in response. Workers exit when the queue closes.
pub fn spawn_workers(
    count: usize,
    pipeline: Arc<UploadPipeline>,
    jobs: mpsc::Receiver<UploadJob>,
    in_flight: Arc<DashMap<PathBuf, ()>>,
    fatal: mpsc::Sender<RemoteError>,
) -> Vec<JoinHandle<()>> {
    let jobs = Arc::new(Mutex::new(jobs));
    (0..count.max(1))
        .map(|worker| {
            let jobs = jobs.clone();
            let pipeline = pipeline.clone();
            let in_flight = in_flight.clone();
            let fatal = fatal.clone();
            tokio::spawn(async move {
                loop {
                    let job = { jobs.lock().await.recv().await };
                    let Some(job) = job else { break };

                    let result = pipeline.process(&job).await;
                    in_flight.remove(&job.local_path);

                    match result {
                        Ok(outcome) => info!(
                            "{}: done after {} attempt(s), local copy {}",
                            job.id,
                            outcome.attempts,
                            if outcome.cleaned_local {
                                "removed"
                            } else {
                                "left in place"
                            }
                        ),
                        Err(err) => {
                            let _ = fatal.try_send(err);
                            break;
                        }
                    }
                }
                debug!("Upload worker {} exiting", worker);
            })
        })
        .collect()
}
