// Trait definition for plugin sources

use crate::checksum::HashAlgorithm;
use crate::manifest::{PluginSpec, Source};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Checksum carried by artifacts that have no authoritative digest.
/// It is never a valid hex digest, so a local file never matches it.
pub const NO_CHECKSUM: &str = "nocheck";

/// A concrete downloadable file for a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub url: String,
    pub checksum: String,
    pub algorithm: HashAlgorithm,
    #[serde(default)]
    pub version: Option<String>,
}

impl Artifact {
    /// Whether a local digest (lowercase hex) is this artifact's checksum.
    pub fn matches(&self, digest: &str) -> bool {
        self.checksum != NO_CHECKSUM && self.checksum.eq_ignore_ascii_case(digest)
    }
}

/// Trait for plugin sources (Modrinth, Hangar, custom URLs)
#[async_trait::async_trait]
pub trait PluginSource: Send + Sync {
    /// Translate a configured plugin into a downloadable artifact.
    ///
    /// Fails on network errors, non-success responses, unparseable bodies,
    /// unknown pinned versions and versions without a usable file; partial
    /// results are never returned.
    async fn resolve(&self, spec: &PluginSpec) -> Result<Artifact>;

    /// The marketplace this source serves
    fn source(&self) -> Source;
}
