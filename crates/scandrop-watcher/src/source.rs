//! Filesystem event intake built on `notify`.
//!
//! The OS backend delivers raw notifications into a bounded channel via the
//! watcher callback; an async loop translates them into [`FileEvent`]s and
//! hands them to the injected [`EventHandler`]. Delivery is best-effort:
//! per-path order is preserved as reported by the backend, but a backend that
//! drops events under extreme load (inotify queue overflow and the like) is
//! tolerated rather than papered over.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use scandrop_core::{EventHandler, FileEvent};

/// Buffer for raw notifications while a slow upload holds the handler.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Watches one directory root and feeds translated events to a handler.
pub struct EventSource {
    root: PathBuf,
    recursive: bool,
}

impl EventSource {
    pub fn new(root: PathBuf, recursive: bool) -> Self {
        Self { root, recursive }
    }

    /// Watch the root and deliver events until `shutdown` fires.
    ///
    /// On shutdown the watch is dropped first, then the channel is drained,
    /// so every notification already reported by the OS is still delivered
    /// before this returns.
    pub async fn run(
        &self,
        handler: Arc<dyn EventHandler>,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<Result<Event, notify::Error>>(EVENT_CHANNEL_CAPACITY);

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                // Blocking send applies backpressure to the notify thread
                // instead of dropping events during bursts.
                let _ = tx.blocking_send(res);
            },
            NotifyConfig::default(),
        )
        .context("failed to create filesystem watcher")?;

        let mode = if self.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&self.root, mode)
            .with_context(|| format!("failed to watch {}", self.root.display()))?;

        info!(
            "Watching {} ({})",
            self.root.display(),
            if self.recursive {
                "recursive"
            } else {
                "top level only"
            }
        );

        loop {
            tokio::select! {
                _ = async { let _ = shutdown.wait_for(|&stop| stop).await; } => break,
                received = rx.recv() => match received {
                    Some(Ok(event)) => deliver(event, handler.as_ref()).await,
                    Some(Err(e)) => warn!("Watch backend error: {}", e),
                    None => break,
                },
            }
        }

        // Quiesce: stop the OS watch, then drain what was already queued.
        drop(watcher);
        while let Some(received) = rx.recv().await {
            if let Ok(event) = received {
                deliver(event, handler.as_ref()).await;
            }
        }

        info!("Watcher for {} stopped", self.root.display());
        Ok(())
    }
}

async fn deliver(event: Event, handler: &dyn EventHandler) {
    for file_event in translate(event) {
        match file_event {
            FileEvent::Created(path) => handler.on_created(&path).await,
            FileEvent::Modified(path) => handler.on_modified(&path).await,
            FileEvent::Deleted(path) => handler.on_deleted(&path).await,
            FileEvent::Moved { from, to } => handler.on_moved(&from, &to).await,
        }
    }
}

/// Map one raw notification onto the event vocabulary.
///
/// Renames fold into it: a rename away from a path is a deletion, a rename
/// onto a path is a creation, and a two-path rename is a move. When the
/// platform cannot tell the direction, the path's existence decides.
fn translate(event: Event) -> Vec<FileEvent> {
    match event.kind {
        EventKind::Create(_) => event.paths.into_iter().map(FileEvent::Created).collect(),
        EventKind::Modify(ModifyKind::Name(rename_mode)) => match rename_mode {
            RenameMode::Both if event.paths.len() == 2 => {
                let mut paths = event.paths.into_iter();
                let from = paths.next().unwrap_or_default();
                let to = paths.next().unwrap_or_default();
                vec![FileEvent::Moved { from, to }]
            }
            RenameMode::From => event.paths.into_iter().map(FileEvent::Deleted).collect(),
            RenameMode::To => event.paths.into_iter().map(FileEvent::Created).collect(),
            _ => event
                .paths
                .into_iter()
                .map(|path| {
                    if path.exists() {
                        FileEvent::Created(path)
                    } else {
                        FileEvent::Deleted(path)
                    }
                })
                .collect(),
        },
        EventKind::Modify(_) => event.paths.into_iter().map(FileEvent::Modified).collect(),
        EventKind::Remove(_) => event.paths.into_iter().map(FileEvent::Deleted).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn creations_and_removals_map_directly() {
        assert_eq!(
            translate(event(EventKind::Create(CreateKind::File), &["/w/a.txt"])),
            vec![FileEvent::Created(PathBuf::from("/w/a.txt"))]
        );
        assert_eq!(
            translate(event(EventKind::Remove(RemoveKind::File), &["/w/a.txt"])),
            vec![FileEvent::Deleted(PathBuf::from("/w/a.txt"))]
        );
    }

    #[test]
    fn content_modification_maps_to_modified() {
        assert_eq!(
            translate(event(
                EventKind::Modify(ModifyKind::Data(DataChange::Any)),
                &["/w/a.txt"]
            )),
            vec![FileEvent::Modified(PathBuf::from("/w/a.txt"))]
        );
    }

    #[test]
    fn rename_direction_decides_created_or_deleted() {
        assert_eq!(
            translate(event(
                EventKind::Modify(ModifyKind::Name(RenameMode::From)),
                &["/w/old.txt"]
            )),
            vec![FileEvent::Deleted(PathBuf::from("/w/old.txt"))]
        );
        assert_eq!(
            translate(event(
                EventKind::Modify(ModifyKind::Name(RenameMode::To)),
                &["/w/new.txt"]
            )),
            vec![FileEvent::Created(PathBuf::from("/w/new.txt"))]
        );
    }

    #[test]
    fn two_path_rename_is_a_move() {
        assert_eq!(
            translate(event(
                EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                &["/w/old.txt", "/w/new.txt"]
            )),
            vec![FileEvent::Moved {
                from: PathBuf::from("/w/old.txt"),
                to: PathBuf::from("/w/new.txt"),
            }]
        );
    }

    #[test]
    fn ambiguous_rename_falls_back_to_existence() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        std::fs::write(&present, b"here").unwrap();
        let gone = dir.path().join("gone.txt");

        let translated = translate(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Any)),
            &[present.to_str().unwrap(), gone.to_str().unwrap()],
        ));

        assert_eq!(
            translated,
            vec![
                FileEvent::Created(present),
                FileEvent::Deleted(gone),
            ]
        );
    }

    #[test]
    fn other_event_kinds_are_ignored() {
        assert!(translate(event(EventKind::Access(notify::event::AccessKind::Any), &["/w/a.txt"])).is_empty());
    }
}
