//! Best-effort content sniffing for log lines.
//!
//! Only the first few bytes are read. The result never influences filtering
//! or the upload protocol.

use std::path::Path;

use tokio::io::AsyncReadExt;

/// Detected file kind, for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileKind {
    pub extension: &'static str,
    pub mime: &'static str,
}

const PDF: FileKind = FileKind {
    extension: "pdf",
    mime: "application/pdf",
};
const PNG: FileKind = FileKind {
    extension: "png",
    mime: "image/png",
};
const JPEG: FileKind = FileKind {
    extension: "jpg",
    mime: "image/jpeg",
};
const TIFF: FileKind = FileKind {
    extension: "tif",
    mime: "image/tiff",
};
const ZIP: FileKind = FileKind {
    extension: "zip",
    mime: "application/zip",
};

/// Sniff the magic bytes of a file. `None` for unreadable or unknown content.
pub async fn detect(path: &Path) -> Option<FileKind> {
    let mut file = tokio::fs::File::open(path).await.ok()?;
    let mut head = [0u8; 12];
    let n = file.read(&mut head).await.ok()?;
    detect_bytes(&head[..n])
}

/// Classify a header already in memory.
pub fn detect_bytes(head: &[u8]) -> Option<FileKind> {
    if head.starts_with(b"%PDF-") {
        Some(PDF)
    } else if head.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some(PNG)
    } else if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(JPEG)
    } else if head.starts_with(b"II*\x00") || head.starts_with(b"MM\x00*") {
        Some(TIFF)
    } else if head.starts_with(b"PK\x03\x04") {
        Some(ZIP)
    } else {
        None
    }
}
