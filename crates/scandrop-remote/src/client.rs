//! REST client for the remote store.
//!
//! Every job authenticates its own session via the OAuth2 password grant;
//! nothing is cached between jobs. Uploads are a two-step flow: open an
//! upload slot under the target directory, then PUT the file body to the
//! returned URL.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use scandrop_core::{Credentials, RemoteError, RemoteSession, UploadClient};

/// HTTP client for the remote store API.
pub struct HttpUploadClient {
    http: Client,
    base_url: String,
}

/// Body of a successful token grant.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Body returned when an upload slot is opened.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadSlot {
    upload_url: String,
}

impl HttpUploadClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl UploadClient for HttpUploadClient {
    #[instrument(skip(self, credentials), level = "debug")]
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<RemoteSession, RemoteError> {
        let resp = self
            .http
            .post(self.url("/oauth/token"))
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RemoteError::Auth(format!("token endpoint unreachable: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| RemoteError::Auth(format!("malformed token response: {}", e)))?;

        let expires_at = token
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));

        debug!("Authenticated as {}", credentials.username);
        Ok(RemoteSession::new(token.access_token, expires_at))
    }

    #[instrument(skip(self, session), level = "debug")]
    async fn probe(&self, session: &RemoteSession) -> Result<(), RemoteError> {
        let resp = self
            .http
            .get(self.url("/api/v4/user/account"))
            .bearer_auth(session.token())
            .send()
            .await
            .map_err(|e| RemoteError::Probe(format!("account endpoint unreachable: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Probe(format!(
                "account endpoint returned {}: {}",
                status, body
            )));
        }

        debug!("Connectivity probe ok");
        Ok(())
    }

    #[instrument(skip(self, session, secret), level = "debug")]
    async fn fetch_keypair(
        &self,
        session: &RemoteSession,
        secret: &str,
    ) -> Result<(), RemoteError> {
        let resp = self
            .http
            .post(self.url("/api/v4/user/account/keypair/unlock"))
            .bearer_auth(session.token())
            .json(&serde_json::json!({ "secret": secret }))
            .send()
            .await
            .map_err(|e| RemoteError::KeyPair(format!("keypair endpoint unreachable: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::KeyPair(format!(
                "keypair endpoint returned {}: {}",
                status, body
            )));
        }

        debug!("Encryption keypair unlocked");
        Ok(())
    }

    #[instrument(skip(self, session), level = "debug")]
    async fn upload(
        &self,
        session: &RemoteSession,
        local_path: &Path,
        remote_dir: &str,
    ) -> Result<(), RemoteError> {
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                RemoteError::Upload(format!(
                    "path has no usable file name: {}",
                    local_path.display()
                ))
            })?;

        let data = tokio::fs::read(local_path).await.map_err(|e| {
            RemoteError::Upload(format!("cannot read {}: {}", local_path.display(), e))
        })?;
        let size = data.len();

        info!("Uploading {} ({} bytes) to {}", file_name, size, remote_dir);

        // Step 1: open an upload slot under the target directory.
        let resp = self
            .http
            .post(self.url("/api/v4/nodes/files/uploads"))
            .bearer_auth(session.token())
            .json(&serde_json::json!({
                "parentPath": remote_dir,
                "name": file_name,
                "size": size,
            }))
            .send()
            .await
            .map_err(|e| RemoteError::Upload(format!("upload slot request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Upload(format!(
                "upload slot returned {}: {}",
                status, body
            )));
        }

        let slot: UploadSlot = resp
            .json()
            .await
            .map_err(|e| RemoteError::Upload(format!("malformed upload slot response: {}", e)))?;

        // Step 2: transfer the body to the slot URL.
        let resp = self
            .http
            .put(&slot.upload_url)
            .bearer_auth(session.token())
            .header("Content-Type", "application/octet-stream")
            .body(data)
            .send()
            .await
            .map_err(|e| RemoteError::Upload(format!("transfer failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Upload(format!(
                "transfer returned {}: {}",
                status, body
            )));
        }

        debug!("Upload of {} complete ({} bytes)", file_name, size);
        Ok(())
    }

    #[instrument(skip(self, session), level = "debug")]
    async fn logout(&self, session: RemoteSession) {
        let result = self
            .http
            .post(self.url("/oauth/revoke"))
            .form(&[("token", session.token())])
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => debug!("Session revoked"),
            Ok(resp) => warn!("Token revocation returned {}", resp.status()),
            Err(e) => warn!("Token revocation failed: {}", e),
        }
    }
}
