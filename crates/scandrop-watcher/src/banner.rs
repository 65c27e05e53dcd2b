//! Startup diagnostics banner. Purely informational.

use std::path::Path;

use tracing::info;

/// Log OS and deployment details once at startup.
pub fn log_system_info(watch_path: &Path, remote_target: &str) {
    info!("scandrop {} starting", env!("CARGO_PKG_VERSION"));
    info!("  System: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
    info!("  Family: {}", std::env::consts::FAMILY);
    if let Ok(host) = std::env::var("HOSTNAME") {
        info!("  Host: {}", host);
    }
    info!("  Watched folder: {}", watch_path.display());
    info!("  Remote target: {}", remote_target);
}
