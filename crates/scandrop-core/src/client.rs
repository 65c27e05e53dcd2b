use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::RemoteError;

/// Login material for the remote store.
///
/// Constructed once at startup from the environment and passed by reference;
/// never read from ambient global state.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    /// Unlock secret for the account's encryption keypair. `None` skips the
    /// keypair step of the upload protocol.
    pub keypair_secret: Option<String>,
}

/// An authenticated handle to the remote store, scoped to one upload job.
///
/// Owned exclusively by the pipeline invocation that opened it and revoked
/// on every exit path once it exists. Never reused across jobs.
#[derive(Debug, Clone)]
pub struct RemoteSession {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl RemoteSession {
    pub fn new(access_token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token,
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

/// Authenticated transfer of single local files into a fixed remote directory.
///
/// The pipeline only depends on this five-operation contract; the wire
/// protocol behind it is an implementation detail of the client.
#[async_trait]
pub trait UploadClient: Send + Sync {
    /// Open a session by authenticating with the given credentials.
    async fn authenticate(&self, credentials: &Credentials)
        -> Result<RemoteSession, RemoteError>;

    /// Verify the session is live before transferring anything.
    async fn probe(&self, session: &RemoteSession) -> Result<(), RemoteError>;

    /// Retrieve the account encryption keypair needed for encrypted targets.
    async fn fetch_keypair(
        &self,
        session: &RemoteSession,
        secret: &str,
    ) -> Result<(), RemoteError>;

    /// Transfer one local file into `remote_dir`, keeping its base name.
    async fn upload(
        &self,
        session: &RemoteSession,
        local_path: &Path,
        remote_dir: &str,
    ) -> Result<(), RemoteError>;

    /// Revoke the session. Best-effort; implementations log failures instead
    /// of returning them so teardown never masks the primary result.
    async fn logout(&self, session: RemoteSession);
}
