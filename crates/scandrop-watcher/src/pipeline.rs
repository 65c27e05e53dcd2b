//! The upload-then-delete protocol, run to a terminal state per job.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use scandrop_core::{Credentials, RemoteError, RemoteSession, UploadClient, UploadJob, UploadOutcome};

/// Retry policy for the transfer step.
///
/// Only transient failures are retried; authentication, probe and keypair
/// failures abort immediately. `max_attempts = 1` disables retries entirely.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Drives one [`UploadJob`] through
/// `authenticate -> probe -> [keypair] -> upload -> delete -> logout`.
///
/// The local file is removed only after the remote store acknowledged the
/// transfer of that exact file. A failed removal is logged and the job still
/// counts as complete: the remote copy exists, only local cleanup is
/// incomplete.
pub struct UploadPipeline {
    client: Arc<dyn UploadClient>,
    credentials: Credentials,
    retry: RetryPolicy,
}

impl UploadPipeline {
    pub fn new(client: Arc<dyn UploadClient>, credentials: Credentials, retry: RetryPolicy) -> Self {
        Self {
            client,
            credentials,
            retry,
        }
    }

    /// Run the protocol to a terminal state. An `Err` is fatal for the
    /// process; the caller is expected to tear everything down.
    pub async fn process(&self, job: &UploadJob) -> Result<UploadOutcome, RemoteError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_once(job, attempt).await {
                Ok(cleaned_local) => {
                    return Ok(UploadOutcome {
                        attempts: attempt,
                        cleaned_local,
                    })
                }
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    warn!(
                        "{}: attempt {}/{} failed: {}",
                        job.id, attempt, self.retry.max_attempts, err
                    );
                    tokio::time::sleep(self.retry.backoff).await;
                }
                Err(err) => {
                    error!("{}: giving up after {} attempt(s): {}", job.id, attempt, err);
                    return Err(err);
                }
            }
        }
    }

    /// One full session lifecycle: open, transfer, clean up, revoke.
    ///
    /// Authentication failure means no session exists, so there is nothing to
    /// revoke. From any later step the session is revoked on both the success
    /// and the failure path.
    async fn try_once(&self, job: &UploadJob, attempt: u32) -> Result<bool, RemoteError> {
        let session = self.client.authenticate(&self.credentials).await?;
        let result = self.transfer(&session, job, attempt).await;
        self.client.logout(session).await;
        result
    }

    async fn transfer(
        &self,
        session: &RemoteSession,
        job: &UploadJob,
        attempt: u32,
    ) -> Result<bool, RemoteError> {
        self.client.probe(session).await?;

        if let Some(secret) = &self.credentials.keypair_secret {
            self.client.fetch_keypair(session, secret).await?;
            debug!("{}: encryption keypair retrieved", job.id);
        }

        info!(
            "{}: uploading {} to {} (attempt {})",
            job.id,
            job.local_path.display(),
            job.remote_target,
            attempt
        );
        self.client
            .upload(session, &job.local_path, &job.remote_target)
            .await?;

        Ok(self.remove_local(&job.local_path).await)
    }

    /// Remove the local copy after a confirmed upload. Returns whether the
    /// removal succeeded; failure is logged with the OS reason and the loop
    /// keeps going.
    async fn remove_local(&self, path: &Path) -> bool {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!("Removed local copy {}", path.display());
                true
            }
            Err(e) => {
                warn!("Could not remove {}: {}", path.display(), e);
                false
            }
        }
    }
}
