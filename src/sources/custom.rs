// Custom URL source implementation

use crate::checksum::HashAlgorithm;
use crate::manifest::{PluginSpec, Source};
use crate::sources::source_trait::{Artifact, NO_CHECKSUM, PluginSource};
use async_trait::async_trait;

/// Plugins downloaded straight from a configured URL.
///
/// There is no authoritative digest for these, so the artifact carries the
/// sentinel checksum and every install re-downloads the file.
pub struct CustomSource;

#[async_trait]
impl PluginSource for CustomSource {
    fn source(&self) -> Source {
        Source::Custom
    }

    async fn resolve(&self, spec: &PluginSpec) -> anyhow::Result<Artifact> {
        let url = spec
            .download_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("download URL is required for custom plugin source"))?;

        Ok(Artifact {
            url: url.to_string(),
            checksum: NO_CHECKSUM.to_string(),
            algorithm: HashAlgorithm::Sha256,
            version: None,
        })
    }
}
