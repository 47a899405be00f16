// Plugin commands: install, remove, list and search

use crate::commands::install::install_plugins;
use crate::commands::{load_manifest, open_cache};
use crate::config::ServerDir;
use crate::constants;
use crate::shorthand;
use crate::sources::search;
use crate::sources::{Endpoints, SourceRegistry};
use crate::ui;
use anyhow::Context;
use std::io;

pub async fn install(
    dir: &ServerDir,
    spec: &str,
    url: Option<String>,
    concurrency: usize,
) -> anyhow::Result<()> {
    // Malformed shorthand is rejected before anything is read or fetched
    let mut plugin = shorthand::parse(spec)?;
    if let Some(url) = url {
        plugin = plugin.with_download_url(url);
    }

    let mut manifest = load_manifest(dir)?;
    if manifest.find_plugin(&plugin.resource).is_some() {
        anyhow::bail!(
            "Plugin '{}' is already in {}",
            plugin.resource,
            constants::MANIFEST_FILE
        );
    }

    let cache = open_cache(dir);
    let endpoints = Endpoints::default();
    let registry = SourceRegistry::with_endpoints(cache.clone(), &endpoints);

    let pb = ui::spinner(&format!("Resolving {}...", plugin.resource));
    let resolved = match registry.get_or_error(plugin.source)?.resolve(&plugin).await {
        Ok(artifact) => artifact,
        Err(e) => {
            ui::finish_spinner_error(&pb, &format!("Could not resolve {}", plugin.resource));
            return Err(e).with_context(|| format!("Failed to add plugin '{}'", plugin.resource));
        }
    };
    ui::finish_spinner_success(
        &pb,
        &format!(
            "Resolved {} {}",
            plugin.resource,
            resolved.version.as_deref().unwrap_or("")
        ),
    );

    log::info!("Adding {} from {}", plugin.resource, plugin.source);
    manifest.plugins.push(plugin);
    manifest.save(&dir.manifest_path())?;

    install_plugins(dir, &manifest.plugins, &endpoints, cache, concurrency).await
}

pub fn remove(dir: &ServerDir, name: &str) -> anyhow::Result<()> {
    let mut manifest = load_manifest(dir)?;
    let Some(plugin) = manifest.remove_plugin(name) else {
        anyhow::bail!(
            "Plugin '{}' not found in {}",
            name,
            constants::MANIFEST_FILE
        );
    };
    manifest.save(&dir.manifest_path())?;

    let jar = dir.plugins_dir().join(plugin.file_name());
    match std::fs::remove_file(&jar) {
        Ok(()) => log::debug!("Deleted {}", jar.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => ui::warning(&format!("Failed to delete {}: {}", jar.display(), e)),
    }

    ui::success(&format!("Removed {}", name));
    Ok(())
}

pub fn list(dir: &ServerDir) -> anyhow::Result<()> {
    let manifest = load_manifest(dir)?;
    ui::plugin_list(&manifest);
    Ok(())
}

pub async fn search(query: &[String]) -> anyhow::Result<()> {
    let query = query.join(" ");
    let endpoints = Endpoints::default();

    let pb = ui::spinner(&format!("Searching for '{}'...", query));
    let (modrinth, hangar) = search::search_all(&endpoints, &query).await;
    ui::finish_spinner_success(
        &pb,
        &format!("{} result(s)", modrinth.len() + hangar.len()),
    );

    ui::search_section("Modrinth", &modrinth);
    ui::search_section("Hangar", &hangar);
    Ok(())
}
