use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use scandrop_core::EventHandler;
use scandrop_watcher::source::EventSource;

/// Handler double that forwards every call into a channel.
struct RecordingHandler {
    tx: mpsc::Sender<(String, PathBuf)>,
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn on_created(&self, path: &Path) {
        let _ = self.tx.send(("created".into(), path.to_path_buf())).await;
    }

    async fn on_modified(&self, path: &Path) {
        let _ = self.tx.send(("modified".into(), path.to_path_buf())).await;
    }

    async fn on_deleted(&self, path: &Path) {
        let _ = self.tx.send(("deleted".into(), path.to_path_buf())).await;
    }

    async fn on_moved(&self, _from: &Path, to: &Path) {
        let _ = self.tx.send(("moved".into(), to.to_path_buf())).await;
    }
}

/// Receive events until one matches, with an overall deadline.
async fn wait_for_event(
    rx: &mut mpsc::Receiver<(String, PathBuf)>,
    kind: &str,
    path: &Path,
) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Some((got_kind, got_path))) => {
                if got_kind == kind && got_path == path {
                    return true;
                }
            }
            _ => return false,
        }
    }
}

#[tokio::test]
async fn creation_in_the_watched_root_is_delivered() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, mut rx) = mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let source = EventSource::new(dir.path().to_path_buf(), true);
    let handler: Arc<dyn EventHandler> = Arc::new(RecordingHandler { tx });
    let task = tokio::spawn(async move { source.run(handler, shutdown_rx).await });

    // Give the watch time to register before producing events.
    tokio::time::sleep(Duration::from_millis(250)).await;

    let report = dir.path().join("report.pdf");
    std::fs::write(&report, b"%PDF-1.7 report").unwrap();

    assert!(
        wait_for_event(&mut rx, "created", &report).await,
        "creation event was not delivered"
    );

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("source must quiesce after shutdown")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn modification_of_an_existing_file_is_delivered() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("report.pdf");
    std::fs::write(&report, b"initial").unwrap();

    let (tx, mut rx) = mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let source = EventSource::new(dir.path().to_path_buf(), false);
    let handler: Arc<dyn EventHandler> = Arc::new(RecordingHandler { tx });
    let task = tokio::spawn(async move { source.run(handler, shutdown_rx).await });

    tokio::time::sleep(Duration::from_millis(250)).await;

    std::fs::write(&report, b"rewritten").unwrap();

    assert!(
        wait_for_event(&mut rx, "modified", &report).await,
        "modification event was not delivered"
    );

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("source must quiesce after shutdown")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn watching_a_missing_root_is_an_error() {
    let (tx, _rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let source = EventSource::new(PathBuf::from("/nonexistent/scandrop-root"), true);
    let handler: Arc<dyn EventHandler> = Arc::new(RecordingHandler { tx });

    assert!(source.run(handler, shutdown_rx).await.is_err());
}
