// Sources module for plugin source implementations

use crate::cache::Cache;
use crate::constants;
use crate::manifest::Source;
use std::collections::HashMap;
use std::sync::Arc;

pub mod custom;
pub mod hangar;
pub mod modrinth;
pub mod search;
pub mod source_trait;

pub use custom::CustomSource;
pub use hangar::HangarSource;
pub use modrinth::ModrinthSource;
pub use source_trait::{Artifact, NO_CHECKSUM, PluginSource};

/// Base URLs of the marketplace APIs.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub modrinth: String,
    pub hangar: String,
    pub paper: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            modrinth: constants::MODRINTH_API.to_string(),
            hangar: constants::HANGAR_API.to_string(),
            paper: constants::PAPER_FILL_API.to_string(),
        }
    }
}

/// Registry for plugin sources
pub struct SourceRegistry {
    sources: HashMap<Source, Arc<dyn PluginSource>>,
}

impl SourceRegistry {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self::with_endpoints(cache, &Endpoints::default())
    }

    pub fn with_endpoints(cache: Arc<Cache>, endpoints: &Endpoints) -> Self {
        let mut registry = Self {
            sources: HashMap::new(),
        };

        registry.register(Arc::new(ModrinthSource::new(
            endpoints.modrinth.clone(),
            cache.clone(),
        )));
        registry.register(Arc::new(HangarSource::new(endpoints.hangar.clone(), cache)));
        registry.register(Arc::new(CustomSource));

        registry
    }

    pub fn register(&mut self, source: Arc<dyn PluginSource>) {
        self.sources.insert(source.source(), source);
    }

    pub fn get(&self, source: Source) -> Option<&Arc<dyn PluginSource>> {
        self.sources.get(&source)
    }

    pub fn get_or_error(&self, source: Source) -> anyhow::Result<&Arc<dyn PluginSource>> {
        self.get(source)
            .ok_or_else(|| anyhow::anyhow!("Unsupported source: '{}'", source))
    }
}
