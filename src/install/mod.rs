// Install module: server jar and plugin installation

pub mod plugins;
pub mod server;
pub mod vendors;

pub use plugins::{
    Failure, InstallOutcome, InstallView, NoopRenderer, PluginInstaller, Progress, Renderer,
    UnitState, UnitStatus,
};
pub use server::{ServerInstaller, ServerStatus};
pub use vendors::{PaperVendor, ServerVendor, vendor_for};

use crate::cache::Cache;
use crate::checksum::{self, HashAlgorithm};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Digest of the file at `path`, or `None` when it is missing or unreadable.
pub(crate) async fn local_digest(
    cache: Arc<Cache>,
    path: PathBuf,
    algorithm: HashAlgorithm,
) -> Option<String> {
    let display = path.display().to_string();
    let hashed =
        tokio::task::spawn_blocking(move || checksum::file_digest(&cache, &path, algorithm)).await;

    match hashed {
        Ok(Ok(digest)) => Some(digest),
        Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => None,
        Ok(Err(e)) => {
            log::debug!("Failed to hash {}: {}", display, e);
            None
        }
        Err(e) => {
            log::debug!("Hashing task for {} failed: {}", display, e);
            None
        }
    }
}
