//! Core traits and types shared by the scandrop crates.
//!
//! This crate defines the abstractions the watcher daemon and the remote
//! client are built against:
//! - `UploadClient`: authenticated transfer of one local file to the remote store
//! - `EventHandler`: per-kind callbacks for filesystem change events
//! - `PathFilter`: glob-based accept/reject decisions for watched paths
//! - `RemoteError`: error taxonomy with its fatal/transient split

mod client;
mod error;
mod event;
mod filter;
mod job;

pub use client::{Credentials, RemoteSession, UploadClient};
pub use error::RemoteError;
pub use event::{EventHandler, FileEvent};
pub use filter::{FilterConfig, PathFilter};
pub use job::{UploadJob, UploadOutcome};
