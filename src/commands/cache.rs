// Cache command for dropping cached lookups and hashes

use crate::cache::{Cache, namespace};
use crate::config::ServerDir;
use crate::ui;

pub fn flush(dir: &ServerDir, target: Option<String>) -> anyhow::Result<()> {
    let namespaces: Vec<&str> = match target.as_deref() {
        None => namespace::ALL.to_vec(),
        Some(name) => match namespace::ALL.iter().find(|ns| **ns == name) {
            Some(ns) => vec![*ns],
            None => anyhow::bail!(
                "Unknown cache namespace '{}'. Expected one of: {}",
                name,
                namespace::ALL.join(", ")
            ),
        },
    };

    let cache = Cache::open(&dir.cache_root())?;
    for ns in namespaces {
        let removed = cache.flush(ns)?;
        ui::success(&format!("Flushed {} ({} entries)", ns, removed));
    }
    cache.close()
}
