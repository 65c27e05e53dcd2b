//! HTTP implementation of the scandrop upload client.
//!
//! Speaks the remote store's REST API: OAuth2 password grant for sessions,
//! a two-step slot-then-transfer upload flow, and token revocation.

mod client;

pub use client::HttpUploadClient;
