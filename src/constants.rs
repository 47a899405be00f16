// Constants module for shared string constants

pub const MANIFEST_FILE: &str = "mcstage.toml";
pub const PLUGINS_DIR: &str = "plugins";
pub const SERVER_JAR: &str = "server.jar";
pub const STATE_DIR: &str = ".mcstage";
pub const CACHE_DB_FILE: &str = "cache.db";

pub const DEFAULT_MC_VERSION: &str = "1.21.4";
pub const DEFAULT_SERVER_PROJECT: &str = "paper";

pub const MODRINTH_API: &str = "https://api.modrinth.com/v2";
pub const HANGAR_API: &str = "https://hangar.papermc.io/api/v1";
pub const PAPER_FILL_API: &str = "https://fill.papermc.io";

/// Upper bound on plugin units working at the same time.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Schema version for the on-disk cache database.
/// Increment on any change to the `entries` table layout or value encoding.
pub const CACHE_SCHEMA_VERSION: i32 = 1;
