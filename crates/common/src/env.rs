//! Environment/runtime helpers
//!
//! Sanity checks run once at startup before the store is opened.

use std::path::Path;
use tracing::warn;

/// Ensure the directory holding the memory-store snapshot exists.
/// A missing `.env` is only worth a warning.
pub async fn ensure_env(snapshot_path: Option<&str>) -> anyhow::Result<()> {
    if tokio::fs::metadata(".env").await.is_err() {
        warn!("no .env file found; relying on process environment");
    }
    if let Some(path) = snapshot_path {
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
