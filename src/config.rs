// Config module for resolving paths inside a server directory

use crate::constants;
use std::path::{Path, PathBuf};

/// Filesystem layout of one managed server directory.
#[derive(Debug, Clone)]
pub struct ServerDir {
    root: PathBuf,
}

impl ServerDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(constants::MANIFEST_FILE)
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join(constants::PLUGINS_DIR)
    }

    pub fn server_jar(&self) -> PathBuf {
        self.root.join(constants::SERVER_JAR)
    }

    /// Root of the per-server cache store.
    pub fn cache_root(&self) -> PathBuf {
        self.root.join(constants::STATE_DIR)
    }
}
