use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// A filesystem change observed under the watch root.
///
/// Events for the same path arrive in the order the OS reported them; there
/// is no global order across different paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Deleted(PathBuf),
    Moved { from: PathBuf, to: PathBuf },
}

impl FileEvent {
    /// The path the event is primarily about (the destination for moves).
    pub fn path(&self) -> &Path {
        match self {
            FileEvent::Created(p) | FileEvent::Modified(p) | FileEvent::Deleted(p) => p,
            FileEvent::Moved { to, .. } => to,
        }
    }
}

/// Per-kind callbacks invoked by the event source.
///
/// One handler instance is injected into the source at construction; the
/// source calls exactly one method per delivered event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_created(&self, path: &Path);
    async fn on_modified(&self, path: &Path);
    async fn on_deleted(&self, path: &Path);
    async fn on_moved(&self, from: &Path, to: &Path);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_report_the_destination_path() {
        let event = FileEvent::Moved {
            from: PathBuf::from("/w/old.txt"),
            to: PathBuf::from("/w/new.txt"),
        };
        assert_eq!(event.path(), Path::new("/w/new.txt"));

        let event = FileEvent::Created(PathBuf::from("/w/a.txt"));
        assert_eq!(event.path(), Path::new("/w/a.txt"));
    }
}
