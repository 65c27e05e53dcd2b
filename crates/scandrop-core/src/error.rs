use thiserror::Error;

/// Errors raised at the remote store boundary.
///
/// The pipeline's retry policy keys off [`RemoteError::is_transient`]: a
/// credential or connectivity problem is assumed systemic (it will recur for
/// every subsequent file) and aborts the process, while a failed transfer may
/// be retried.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Login failed: credentials rejected or the token endpoint unreachable.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Post-login connectivity check failed.
    #[error("connectivity probe failed: {0}")]
    Probe(String),

    /// The account encryption keypair could not be retrieved or unlocked.
    #[error("keypair retrieval failed: {0}")]
    KeyPair(String),

    /// The transfer itself failed (network, quota, remote permission).
    #[error("upload failed: {0}")]
    Upload(String),
}

impl RemoteError {
    /// Whether a bounded retry is worthwhile for this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Upload(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_upload_errors_are_transient() {
        assert!(RemoteError::Upload("quota exceeded".into()).is_transient());
        assert!(!RemoteError::Auth("bad password".into()).is_transient());
        assert!(!RemoteError::Probe("timeout".into()).is_transient());
        assert!(!RemoteError::KeyPair("missing".into()).is_transient());
    }
}
