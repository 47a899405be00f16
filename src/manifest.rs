// Manifest module for the declarative server description

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub server: ServerConfig,
    #[serde(default)]
    pub plugins: Vec<PluginSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub minecraft_version: String,
    #[serde(default)]
    pub version: String,
}

/// Marketplace a plugin is fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "modrinth")]
    Modrinth,
    #[serde(rename = "paper-hangar", alias = "hangar")]
    Hangar,
    #[serde(rename = "custom")]
    Custom,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Modrinth, Source::Hangar, Source::Custom];

    /// Name used in the plugin shorthand (`hangar:ViaVersion`).
    pub fn shorthand(&self) -> &'static str {
        match self {
            Source::Modrinth => "modrinth",
            Source::Hangar => "hangar",
            Source::Custom => "custom",
        }
    }

    pub fn from_shorthand(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.shorthand() == name)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Source::Modrinth => "MODRINTH",
            Source::Hangar => "HANGAR",
            Source::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.shorthand())
    }
}

/// One configured plugin.
///
/// `version` keeps the three states the config file can express: absent,
/// present but empty (both mean "latest") and pinned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSpec {
    pub source: Source,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl PluginSpec {
    pub fn new(source: Source, resource: impl Into<String>) -> Self {
        Self {
            source,
            resource: resource.into(),
            version: None,
            download_url: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }

    /// The pinned version, if one is set and non-empty.
    pub fn pinned_version(&self) -> Option<&str> {
        self.version.as_deref().filter(|v| !v.is_empty())
    }

    /// Name of the file this plugin occupies inside the plugins directory.
    pub fn file_name(&self) -> String {
        format!("{}.jar", self.resource)
    }
}

impl Manifest {
    pub fn new(server: ServerConfig) -> Self {
        Self {
            server,
            plugins: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        log::debug!("Loading manifest from {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let manifest: Manifest = toml::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if manifest.server == ServerConfig::default() {
            anyhow::bail!("Missing [server] configuration in {}", path.display());
        }
        validate_plugins(&manifest.plugins)
            .with_context(|| format!("Invalid plugin list in {}", path.display()))?;

        Ok(manifest)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn find_plugin(&self, resource: &str) -> Option<&PluginSpec> {
        self.plugins.iter().find(|p| p.resource == resource)
    }

    /// Remove a plugin by resource name, returning it if it was configured.
    pub fn remove_plugin(&mut self, resource: &str) -> Option<PluginSpec> {
        let index = self.plugins.iter().position(|p| p.resource == resource)?;
        Some(self.plugins.remove(index))
    }

    /// Advisory warnings about the configuration.
    pub fn lint(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.server.version == "latest" {
            issues.push(
                "Using version = latest on server jar, can be good for security, possible API versioning issues"
                    .to_string(),
            );
        }
        issues
    }
}

/// Whether `resource` names exactly one file inside the plugins directory.
pub fn is_valid_resource(resource: &str) -> bool {
    if resource.is_empty() || resource.contains(['/', '\\']) || resource.contains("..") {
        return false;
    }
    let mut components = Path::new(resource).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Every plugin must own a distinct file inside the plugins directory.
pub fn validate_plugins(plugins: &[PluginSpec]) -> anyhow::Result<()> {
    let invalid: Vec<&str> = plugins
        .iter()
        .map(|p| p.resource.as_str())
        .filter(|r| !is_valid_resource(r))
        .collect();
    anyhow::ensure!(
        invalid.is_empty(),
        "invalid plugin name(s): {}",
        invalid.join(", ")
    );

    let mut seen = HashSet::new();
    let mut duplicates: Vec<&str> = Vec::new();
    for plugin in plugins {
        let resource = plugin.resource.as_str();
        if !seen.insert(resource) && !duplicates.contains(&resource) {
            duplicates.push(resource);
        }
    }
    anyhow::ensure!(
        duplicates.is_empty(),
        "plugin(s) configured more than once: {}",
        duplicates.join(", ")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paper(version: &str) -> ServerConfig {
        ServerConfig {
            vendor: "papermc".into(),
            project: "paper".into(),
            minecraft_version: "1.21".into(),
            version: version.into(),
        }
    }

    #[test]
    fn test_load_full_manifest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mcstage.toml");
        std::fs::write(
            &path,
            r#"
[server]
vendor = "papermc"
project = "paper"
minecraft_version = "1.21"
version = "123"

[[plugins]]
source = "modrinth"
resource = "chunky"
version = "1.4.16"

[[plugins]]
source = "paper-hangar"
resource = "ViaVersion"

[[plugins]]
source = "custom"
resource = "mytool"
download_url = "https://example.com/mytool.jar"
"#,
        )
        .unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.server, paper("123"));
        assert_eq!(manifest.plugins.len(), 3);
        assert_eq!(manifest.plugins[0].source, Source::Modrinth);
        assert_eq!(manifest.plugins[0].pinned_version(), Some("1.4.16"));
        assert_eq!(manifest.plugins[1].source, Source::Hangar);
        assert_eq!(manifest.plugins[1].version, None);
        assert_eq!(manifest.plugins[2].source, Source::Custom);
        assert_eq!(
            manifest.plugins[2].download_url.as_deref(),
            Some("https://example.com/mytool.jar")
        );
    }

    #[test]
    fn test_hangar_alias_is_accepted() {
        let manifest: Manifest = toml::from_str(
            r#"
[server]
vendor = "papermc"

[[plugins]]
source = "hangar"
resource = "ViaVersion"
"#,
        )
        .unwrap();
        assert_eq!(manifest.plugins[0].source, Source::Hangar);
    }

    #[test]
    fn test_missing_server_table_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mcstage.toml");
        std::fs::write(&path, "[server]\n").unwrap();

        let err = Manifest::load(&path).unwrap_err();
        assert!(err.to_string().contains("Missing [server]"));
    }

    #[test]
    fn test_unknown_source_fails_to_parse() {
        let result: Result<Manifest, _> = toml::from_str(
            r#"
[server]
vendor = "papermc"

[[plugins]]
source = "curseforge"
resource = "x"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_save_then_load_keeps_version_states() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mcstage.toml");

        let mut manifest = Manifest::new(paper("123"));
        manifest.plugins.push(PluginSpec::new(Source::Modrinth, "a"));
        manifest
            .plugins
            .push(PluginSpec::new(Source::Modrinth, "b").with_version(""));
        manifest
            .plugins
            .push(PluginSpec::new(Source::Modrinth, "c").with_version("2.0"));
        manifest.save(&path).unwrap();

        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded.plugins[0].version, None);
        assert_eq!(loaded.plugins[1].version.as_deref(), Some(""));
        assert_eq!(loaded.plugins[1].pinned_version(), None);
        assert_eq!(loaded.plugins[2].pinned_version(), Some("2.0"));
    }

    #[test]
    fn test_lint_flags_latest_server_version() {
        let manifest = Manifest::new(paper("latest"));
        assert_eq!(manifest.lint().len(), 1);

        // Matching is case-sensitive
        let manifest = Manifest::new(paper("LATEST"));
        assert!(manifest.lint().is_empty());

        let manifest = Manifest::new(paper("123"));
        assert!(manifest.lint().is_empty());
    }

    #[test]
    fn test_remove_plugin() {
        let mut manifest = Manifest::new(paper("123"));
        manifest.plugins.push(PluginSpec::new(Source::Modrinth, "chunky"));
        manifest.plugins.push(PluginSpec::new(Source::Hangar, "ViaVersion"));

        assert!(manifest.remove_plugin("missing").is_none());
        let removed = manifest.remove_plugin("chunky").unwrap();
        assert_eq!(removed.resource, "chunky");
        assert_eq!(manifest.plugins.len(), 1);
        assert!(manifest.find_plugin("ViaVersion").is_some());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            PluginSpec::new(Source::Hangar, "ViaVersion").file_name(),
            "ViaVersion.jar"
        );
    }

    #[test]
    fn test_resource_names() {
        assert!(is_valid_resource("chunky"));
        assert!(is_valid_resource("my-plugin_v2.0"));
        assert!(!is_valid_resource(""));
        assert!(!is_valid_resource("."));
        assert!(!is_valid_resource(".."));
        assert!(!is_valid_resource("../../escaped"));
        assert!(!is_valid_resource("a/b"));
        assert!(!is_valid_resource("a\\b"));
        assert!(!is_valid_resource("/etc/passwd"));
        assert!(!is_valid_resource("a..b"));
    }

    #[test]
    fn test_duplicate_resources_are_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mcstage.toml");
        std::fs::write(
            &path,
            r#"
[server]
vendor = "papermc"

[[plugins]]
source = "modrinth"
resource = "chunky"
version = "1.4.15"

[[plugins]]
source = "paper-hangar"
resource = "ViaVersion"

[[plugins]]
source = "modrinth"
resource = "chunky"
version = "1.4.16"
"#,
        )
        .unwrap();

        let err = format!("{:#}", Manifest::load(&path).unwrap_err());
        assert!(err.contains("configured more than once: chunky"), "{}", err);
        assert!(!err.contains("ViaVersion"));
    }

    #[test]
    fn test_escaping_resource_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mcstage.toml");
        std::fs::write(
            &path,
            r#"
[server]
vendor = "papermc"

[[plugins]]
source = "custom"
resource = "../../escaped"
download_url = "https://example.com/x.jar"
"#,
        )
        .unwrap();

        let err = format!("{:#}", Manifest::load(&path).unwrap_err());
        assert!(err.contains("invalid plugin name(s): ../../escaped"), "{}", err);
    }
}
