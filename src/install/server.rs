// Server jar installer

use crate::cache::Cache;
use crate::download;
use crate::install::local_digest;
use crate::install::vendors::ServerVendor;
use crate::manifest::ServerConfig;
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    /// The jar in place already matches the resolved build
    Checked,
    Installed,
}

pub struct ServerInstaller {
    vendor: Box<dyn ServerVendor>,
    cache: Arc<Cache>,
    jar_path: PathBuf,
}

impl ServerInstaller {
    pub fn new(vendor: Box<dyn ServerVendor>, cache: Arc<Cache>, jar_path: PathBuf) -> Self {
        Self {
            vendor,
            cache,
            jar_path,
        }
    }

    pub async fn install<F>(&self, server: &ServerConfig, on_progress: F) -> anyhow::Result<ServerStatus>
    where
        F: FnMut(u64, u64) + Send,
    {
        let artifact = self
            .vendor
            .resolve(server)
            .await
            .context("Failed to resolve server jar")?;
        log::debug!("Server jar resolved to {} ({})", artifact.url, artifact.checksum);

        let existing = local_digest(self.cache.clone(), self.jar_path.clone(), artifact.algorithm).await;
        if existing.as_deref().is_some_and(|digest| artifact.matches(digest)) {
            return Ok(ServerStatus::Checked);
        }

        download::download_with_progress(&artifact.url, &self.jar_path, on_progress)
            .await
            .context("Failed to download server jar")?;

        let digest = local_digest(self.cache.clone(), self.jar_path.clone(), artifact.algorithm)
            .await
            .with_context(|| format!("Failed to hash {}", self.jar_path.display()))?;
        if !artifact.matches(&digest) {
            anyhow::bail!(
                "checksum mismatch for server jar: expected {}, got {}",
                artifact.checksum,
                digest
            );
        }

        Ok(ServerStatus::Installed)
    }
}
