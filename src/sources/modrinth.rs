// Modrinth source implementation

use crate::cache::{Cache, FOREVER, SHORT_TTL, namespace};
use crate::checksum::HashAlgorithm;
use crate::http;
use crate::manifest::{PluginSpec, Source};
use crate::sources::source_trait::{Artifact, PluginSource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    pub version_number: String,
    pub files: Vec<VersionFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionFile {
    pub url: String,
    pub hashes: FileHashes,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHashes {
    pub sha512: String,
}

pub struct ModrinthSource {
    api_url: String,
    cache: Arc<Cache>,
}

impl ModrinthSource {
    pub fn new(api_url: impl Into<String>, cache: Arc<Cache>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            cache,
        }
    }

    /// Version list for a project, newest first as the API orders it.
    async fn get_versions(&self, resource: &str) -> anyhow::Result<Vec<Version>> {
        let cache_key = format!("modrinth:{}:versions", resource);
        if let Some(versions) = self.cache.get_async(namespace::PLUGINS, cache_key.clone()).await {
            return Ok(versions);
        }

        let url = format!(
            "{}/project/{}/version",
            self.api_url,
            urlencoding::encode(resource)
        );
        let versions: Vec<Version> = http::fetch_json(&url).await?;

        self.cache
            .set_async(namespace::PLUGINS, cache_key, versions.clone(), SHORT_TTL)
            .await;
        Ok(versions)
    }
}

fn download_cache_key(resource: &str, version: &str) -> String {
    format!("modrinth:{}:{}:download", resource, version)
}

pub fn find_version<'a>(versions: &'a [Version], version: &str) -> Option<&'a Version> {
    versions.iter().find(|v| v.version_number == version)
}

/// First file flagged primary; Modrinth may flag more than one.
pub fn find_primary_file(files: &[VersionFile]) -> Option<&VersionFile> {
    files.iter().find(|f| f.primary)
}

/// Pick the artifact for a pinned version, or the newest one when unpinned.
pub fn select_artifact(versions: &[Version], pinned: Option<&str>) -> anyhow::Result<Artifact> {
    if versions.is_empty() {
        anyhow::bail!("no versions found for plugin");
    }

    let version = match pinned {
        Some(pinned) => find_version(versions, pinned)
            .ok_or_else(|| anyhow::anyhow!("plugin version not found: {}", pinned))?,
        None => &versions[0],
    };

    let file = find_primary_file(&version.files).ok_or_else(|| {
        anyhow::anyhow!(
            "plugin version {} has no primary file",
            version.version_number
        )
    })?;

    Ok(Artifact {
        url: file.url.clone(),
        checksum: file.hashes.sha512.clone(),
        algorithm: HashAlgorithm::Sha512,
        version: Some(version.version_number.clone()),
    })
}

#[async_trait]
impl PluginSource for ModrinthSource {
    fn source(&self) -> Source {
        Source::Modrinth
    }

    async fn resolve(&self, spec: &PluginSpec) -> anyhow::Result<Artifact> {
        let resource = spec.resource.as_str();
        let pinned = spec.pinned_version();

        if let Some(version) = pinned {
            if let Some(artifact) = self
                .cache
                .get_async(namespace::PLUGINS, download_cache_key(resource, version))
                .await
            {
                return Ok(artifact);
            }
        }

        let versions = self.get_versions(resource).await?;
        let artifact = select_artifact(&versions, pinned)?;

        if let Some(version) = &artifact.version {
            self.cache
                .set_async(
                    namespace::PLUGINS,
                    download_cache_key(resource, version),
                    artifact.clone(),
                    FOREVER,
                )
                .await;
        }

        Ok(artifact)
    }
}
