// Install command: server jar first, then every configured plugin

use crate::cache::Cache;
use crate::commands::{load_manifest, open_cache};
use crate::config::ServerDir;
use crate::install::{PluginInstaller, ServerInstaller, ServerStatus, vendor_for};
use crate::manifest::{PluginSpec, ServerConfig};
use crate::sources::{Endpoints, SourceRegistry};
use crate::ui;
use std::sync::Arc;

pub async fn install(dir: &ServerDir, concurrency: usize) -> anyhow::Result<()> {
    let manifest = load_manifest(dir)?;
    for issue in manifest.lint() {
        ui::warning(&issue);
    }

    let cache = open_cache(dir);
    let endpoints = Endpoints::default();

    // A broken server jar does not keep plugins from being brought up to date
    let server = install_server(dir, &manifest.server, &endpoints, cache.clone()).await;
    let plugins = install_plugins(dir, &manifest.plugins, &endpoints, cache, concurrency).await;

    server.and(plugins)
}

pub async fn install_server(
    dir: &ServerDir,
    server: &ServerConfig,
    endpoints: &Endpoints,
    cache: Arc<Cache>,
) -> anyhow::Result<()> {
    ui::server_config_box(server);

    let vendor = vendor_for(&server.vendor, endpoints, cache.clone())?;
    let installer = ServerInstaller::new(vendor, cache, dir.server_jar());

    let mut bar = ui::ServerBar::new("Installing server jar");
    let result = installer
        .install(server, |downloaded, total| bar.update(downloaded, total))
        .await;

    match result {
        Ok(ServerStatus::Checked) => bar.finish_success("Checked server jar"),
        Ok(ServerStatus::Installed) => bar.finish_success("Downloaded server jar"),
        Err(e) => {
            bar.finish_error("Server jar install failed");
            return Err(e);
        }
    }
    Ok(())
}

pub async fn install_plugins(
    dir: &ServerDir,
    plugins: &[PluginSpec],
    endpoints: &Endpoints,
    cache: Arc<Cache>,
    concurrency: usize,
) -> anyhow::Result<()> {
    ui::action(&format!("Installing {} plugin(s)", plugins.len()));

    let registry = Arc::new(SourceRegistry::with_endpoints(cache.clone(), endpoints));
    let installer =
        PluginInstaller::new(registry, cache, dir.plugins_dir()).with_concurrency(concurrency);

    let mut board = ui::PluginBoard::new(plugins.len());
    let outcome = installer.install(plugins, &mut board).await?;

    ui::install_summary(&outcome);
    outcome.into_result().map(|_| ())
}
