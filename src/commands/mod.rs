// Command implementations behind the CLI

pub mod cache;
pub mod init;
pub mod install;
pub mod plugin;

use crate::cache::Cache;
use crate::config::ServerDir;
use crate::manifest::Manifest;
use std::sync::Arc;

/// Open the server's cache, falling back to no caching if it is unusable.
pub(crate) fn open_cache(dir: &ServerDir) -> Arc<Cache> {
    let cache = Cache::open(&dir.cache_root()).unwrap_or_else(|e| {
        log::debug!("Cache unavailable, continuing without it: {:#}", e);
        Cache::disabled()
    });
    Arc::new(cache)
}

pub(crate) fn load_manifest(dir: &ServerDir) -> anyhow::Result<Manifest> {
    let path = dir.manifest_path();
    if !path.exists() {
        anyhow::bail!(
            "{} not found in {}. Run 'mcstage init' first.",
            crate::constants::MANIFEST_FILE,
            dir.root().display()
        );
    }
    Manifest::load(&path)
}
