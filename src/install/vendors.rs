// Server jar vendors

use crate::cache::{Cache, FOREVER, SHORT_TTL, namespace};
use crate::checksum::HashAlgorithm;
use crate::http;
use crate::manifest::ServerConfig;
use crate::sources::{Artifact, Endpoints};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

pub const PAPERMC: &str = "papermc";

/// Download key of the server jar inside a Fill build.
const SERVER_DOWNLOAD: &str = "server:default";

/// Build identifier that tracks the newest build.
const LATEST: &str = "latest";

#[async_trait]
pub trait ServerVendor: Send + Sync {
    /// Resolve the configured server build into a downloadable jar.
    async fn resolve(&self, server: &ServerConfig) -> anyhow::Result<Artifact>;
}

#[derive(Debug, Deserialize)]
struct Build {
    #[serde(default)]
    downloads: HashMap<String, BuildDownload>,
}

#[derive(Debug, Deserialize)]
struct BuildDownload {
    url: String,
    checksums: Checksums,
}

#[derive(Debug, Deserialize)]
struct Checksums {
    sha256: String,
}

/// PaperMC projects (paper, folia, velocity) served by the Fill v3 API.
pub struct PaperVendor {
    api_url: String,
    cache: Arc<Cache>,
}

impl PaperVendor {
    pub fn new(api_url: impl Into<String>, cache: Arc<Cache>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            cache,
        }
    }
}

#[async_trait]
impl ServerVendor for PaperVendor {
    async fn resolve(&self, server: &ServerConfig) -> anyhow::Result<Artifact> {
        let cache_key = format!(
            "paper:{}:{}:{}",
            server.project, server.minecraft_version, server.version
        );
        if let Some(artifact) = self.cache.get_async(namespace::SERVER, cache_key.clone()).await {
            return Ok(artifact);
        }

        let url = format!(
            "{}/v3/projects/{}/versions/{}/builds/{}",
            self.api_url,
            urlencoding::encode(&server.project),
            urlencoding::encode(&server.minecraft_version),
            urlencoding::encode(&server.version)
        );
        let build: Build = http::fetch_json(&url).await?;
        let download = build.downloads.get(SERVER_DOWNLOAD).ok_or_else(|| {
            anyhow::anyhow!(
                "no server download available for {} {} build {}",
                server.project,
                server.minecraft_version,
                server.version
            )
        })?;

        let artifact = Artifact {
            url: download.url.clone(),
            checksum: download.checksums.sha256.clone(),
            algorithm: HashAlgorithm::Sha256,
            version: Some(server.version.clone()),
        };

        let ttl = if server.version == LATEST { SHORT_TTL } else { FOREVER };
        self.cache
            .set_async(namespace::SERVER, cache_key, artifact.clone(), ttl)
            .await;

        Ok(artifact)
    }
}

/// Look up the vendor named in `[server] vendor`.
pub fn vendor_for(
    name: &str,
    endpoints: &Endpoints,
    cache: Arc<Cache>,
) -> anyhow::Result<Box<dyn ServerVendor>> {
    match name {
        PAPERMC => Ok(Box::new(PaperVendor::new(endpoints.paper.clone(), cache))),
        _ => anyhow::bail!("unknown server vendor: {}", name),
    }
}
