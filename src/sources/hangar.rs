// Hangar source implementation (PaperMC plugin repository)

use crate::cache::{Cache, FOREVER, SHORT_TTL, namespace};
use crate::checksum::HashAlgorithm;
use crate::http;
use crate::manifest::{PluginSpec, Source};
use crate::sources::source_trait::{Artifact, PluginSource};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Platform whose download is installed.
const PLATFORM: &str = "PAPER";

#[derive(Debug, Deserialize)]
pub struct Version {
    #[serde(default)]
    pub downloads: HashMap<String, Download>,
}

#[derive(Debug, Deserialize)]
pub struct Download {
    #[serde(rename = "fileInfo")]
    pub file_info: Option<FileInfo>,
    #[serde(rename = "downloadUrl")]
    pub download_url: Option<String>,
    #[serde(rename = "externalUrl")]
    pub external_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FileInfo {
    #[serde(rename = "sha256Hash")]
    pub sha256_hash: String,
}

pub struct HangarSource {
    api_url: String,
    cache: Arc<Cache>,
}

impl HangarSource {
    pub fn new(api_url: impl Into<String>, cache: Arc<Cache>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            cache,
        }
    }

    async fn latest_version(&self, resource: &str) -> anyhow::Result<String> {
        let cache_key = format!("hangar:{}:latest", resource);
        if let Some(version) = self
            .cache
            .get_async::<String>(namespace::PLUGINS, cache_key.clone())
            .await
        {
            return Ok(version);
        }

        let url = format!(
            "{}/projects/{}/latestrelease",
            self.api_url,
            urlencoding::encode(resource)
        );
        // Plain text body, not JSON
        let version = http::fetch_text(&url).await?;
        if version.is_empty() {
            anyhow::bail!("empty latest release for {}", resource);
        }

        self.cache
            .set_async(namespace::PLUGINS, cache_key, version.clone(), SHORT_TTL)
            .await;
        Ok(version)
    }
}

/// Extract the Paper download from a version manifest.
pub fn select_artifact(manifest: &Version, version: &str) -> anyhow::Result<Artifact> {
    let download = manifest
        .downloads
        .get(PLATFORM)
        .ok_or_else(|| anyhow::anyhow!("download not found on version {}", version))?;

    let url = download.download_url.as_deref().ok_or_else(|| match &download.external_url {
        Some(external) => anyhow::anyhow!(
            "version {} is hosted externally ({}) and cannot be verified",
            version,
            external
        ),
        None => anyhow::anyhow!("version {} has no download URL", version),
    })?;

    let file_info = download
        .file_info
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("version {} has no file checksum", version))?;

    Ok(Artifact {
        url: url.to_string(),
        checksum: file_info.sha256_hash.clone(),
        algorithm: HashAlgorithm::Sha256,
        version: Some(version.to_string()),
    })
}

#[async_trait]
impl PluginSource for HangarSource {
    fn source(&self) -> Source {
        Source::Hangar
    }

    async fn resolve(&self, spec: &PluginSpec) -> anyhow::Result<Artifact> {
        let resource = spec.resource.as_str();
        let version = match spec.pinned_version() {
            Some(version) => version.to_string(),
            None => self
                .latest_version(resource)
                .await
                .map_err(|e| anyhow::anyhow!("failed to get latest version: {}", e))?,
        };

        let cache_key = format!("hangar:{}:{}:download", resource, version);
        if let Some(artifact) = self.cache.get_async(namespace::PLUGINS, cache_key.clone()).await {
            return Ok(artifact);
        }

        let url = format!(
            "{}/projects/{}/versions/{}",
            self.api_url,
            urlencoding::encode(resource),
            urlencoding::encode(&version)
        );
        let manifest: Version = http::fetch_json(&url).await?;
        let artifact = select_artifact(&manifest, &version)?;

        self.cache
            .set_async(namespace::PLUGINS, cache_key, artifact.clone(), FOREVER)
            .await;
        Ok(artifact)
    }
}
