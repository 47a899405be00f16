// Init command for writing a starter server configuration

use crate::config::ServerDir;
use crate::constants;
use crate::install::vendors::PAPERMC;
use crate::manifest::{Manifest, ServerConfig};
use crate::ui;

pub fn init(dir: &ServerDir, minecraft_version: String, project: String) -> anyhow::Result<()> {
    let path = dir.manifest_path();
    if path.exists() {
        ui::dim(&format!(
            "{} detected. Skipping initialization.",
            constants::MANIFEST_FILE
        ));
        return Ok(());
    }

    let manifest = Manifest::new(ServerConfig {
        vendor: PAPERMC.to_string(),
        project: project.clone(),
        minecraft_version: minecraft_version.clone(),
        version: "latest".to_string(),
    });
    manifest.save(&path)?;

    ui::success(&format!(
        "Initialized {} for {} {}",
        constants::MANIFEST_FILE,
        project,
        minecraft_version
    ));
    Ok(())
}
