// Parser for the `source:name[@version]` plugin shorthand

use crate::manifest::{PluginSpec, Source, is_valid_resource};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("invalid format: expected source:name[@version]")]
    MissingSource,
    #[error("invalid source: {0} (valid: modrinth, hangar, custom)")]
    UnknownSource(String),
    #[error("plugin name is required")]
    MissingName,
    #[error("invalid plugin name: {0} (must be a single file name)")]
    InvalidName(String),
}

/// Parse a plugin shorthand.
///
/// The first `:` separates the source, the first `@` after it separates the
/// version, so versions may themselves contain `@`. An empty version after
/// `@` is kept as "latest".
pub fn parse(spec: &str) -> Result<PluginSpec, SpecError> {
    let (source, remainder) = spec.split_once(':').ok_or(SpecError::MissingSource)?;

    let (name, version) = match remainder.split_once('@') {
        Some((name, version)) => (name, Some(version)),
        None => (remainder, None),
    };

    let source =
        Source::from_shorthand(source).ok_or_else(|| SpecError::UnknownSource(source.to_string()))?;

    if name.is_empty() {
        return Err(SpecError::MissingName);
    }
    if !is_valid_resource(name) {
        return Err(SpecError::InvalidName(name.to_string()));
    }

    let mut plugin = PluginSpec::new(source, name);
    if let Some(version) = version.filter(|v| !v.is_empty()) {
        plugin.version = Some(version.to_string());
    }
    Ok(plugin)
}
