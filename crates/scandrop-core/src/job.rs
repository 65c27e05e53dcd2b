use std::path::PathBuf;

use uuid::Uuid;

/// One unit of work: get a single local file safely onto the remote store,
/// then remove the local copy.
#[derive(Debug, Clone)]
pub struct UploadJob {
    /// Identifier used for log correlation only.
    pub id: Uuid,
    /// The file to transfer.
    pub local_path: PathBuf,
    /// Destination directory on the remote store.
    pub remote_target: String,
}

impl UploadJob {
    pub fn new(local_path: PathBuf, remote_target: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            local_path,
            remote_target: remote_target.into(),
        }
    }
}

/// Terminal result of a job whose upload was acknowledged.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Attempts spent before the transfer was acknowledged.
    pub attempts: u32,
    /// Whether the local copy was removed afterwards. `false` means the
    /// removal failed; the remote copy exists either way.
    pub cleaned_local: bool,
}
