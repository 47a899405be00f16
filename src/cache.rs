// Namespaced key/value cache persisted in a local SQLite file
//
// Every operation degrades to a miss or a no-op when the store is missing or
// broken; the cache only ever removes work, it never blocks an install.

use crate::constants;
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Cache namespaces, one per consumer.
pub mod namespace {
    pub const PLUGINS: &str = "plugins";
    pub const SERVER: &str = "server";
    pub const FILEHASH: &str = "filehash";

    pub const ALL: [&str; 3] = [PLUGINS, SERVER, FILEHASH];
}

/// TTL for answers that drift over time, such as "latest version".
pub const SHORT_TTL: Duration = Duration::from_secs(15 * 60);

/// A zero TTL never expires.
pub const FOREVER: Duration = Duration::ZERO;

/// Source of the current time, in milliseconds since the epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

pub struct Cache {
    conn: Option<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
}

impl Cache {
    /// Open (or create) the cache database under `root`.
    ///
    /// A file written with a different schema version, or one that is not a
    /// database at all, is discarded and recreated.
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("Failed to create cache directory {}", root.display()))?;
        let path = root.join(constants::CACHE_DB_FILE);

        let conn = match Connection::open(&path).map_err(anyhow::Error::from).and_then(|conn| {
            prepare_schema(&conn)?;
            Ok(conn)
        }) {
            Ok(conn) => conn,
            Err(e) => {
                log::debug!("Discarding unreadable cache {}: {}", path.display(), e);
                std::fs::remove_file(&path)?;
                let conn = Connection::open(&path)?;
                prepare_schema(&conn)?;
                conn
            }
        };

        Ok(Self::from_connection(conn))
    }

    /// A cache that lives only as long as this value.
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        prepare_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    /// A cache that stores nothing and always misses.
    pub fn disabled() -> Self {
        Self {
            conn: None,
            clock: Arc::new(SystemClock),
        }
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Some(Mutex::new(conn)),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[cfg(test)]
    fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    fn lock(&self) -> Option<MutexGuard<'_, Connection>> {
        self.conn.as_ref()?.lock().ok()
    }

    pub fn get<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let conn = self.lock()?;
        let id = derive_key(key);

        let row = conn
            .query_row(
                "SELECT value, written_at, ttl_ms FROM entries WHERE namespace = ?1 AND key = ?2",
                params![namespace, id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?)),
            )
            .optional();

        let (value, written_at, ttl_ms) = match row {
            Ok(Some(row)) => row,
            Ok(None) => return None,
            Err(e) => {
                log::debug!("Cache read failed: {}", e);
                return None;
            }
        };

        if ttl_ms > 0 && self.clock.now_millis() > written_at.saturating_add(ttl_ms) {
            if let Err(e) = conn.execute(
                "DELETE FROM entries WHERE namespace = ?1 AND key = ?2",
                params![namespace, id],
            ) {
                log::debug!("Failed to evict expired cache entry: {}", e);
            }
            return None;
        }

        match serde_json::from_str(&value) {
            Ok(value) => {
                log::debug!("Cache hit: {}/{}", namespace, key);
                Some(value)
            }
            Err(e) => {
                log::debug!("Cache entry {}/{} did not decode: {}", namespace, key, e);
                None
            }
        }
    }

    /// Store a value, replacing any previous entry for the same key.
    pub fn set<T: Serialize + ?Sized>(&self, namespace: &str, key: &str, value: &T, ttl: Duration) {
        let Some(conn) = self.lock() else {
            return;
        };

        let value = match serde_json::to_string(value) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("Failed to encode cache value: {}", e);
                return;
            }
        };

        let result = conn.execute(
            "INSERT INTO entries (namespace, key, value, written_at, ttl_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(namespace, key) DO UPDATE SET
                value = excluded.value,
                written_at = excluded.written_at,
                ttl_ms = excluded.ttl_ms",
            params![
                namespace,
                derive_key(key),
                value,
                self.clock.now_millis(),
                ttl.as_millis() as i64
            ],
        );
        if let Err(e) = result {
            log::debug!("Failed to write cache: {}", e);
        }
    }

    pub fn set_permanent<T: Serialize + ?Sized>(&self, namespace: &str, key: &str, value: &T) {
        self.set(namespace, key, value, FOREVER);
    }

    /// [`Cache::get`] on the blocking pool, for callers on async workers.
    pub async fn get_async<T>(self: &Arc<Self>, namespace: &'static str, key: String) -> Option<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let cache = self.clone();
        match tokio::task::spawn_blocking(move || cache.get(namespace, &key)).await {
            Ok(value) => value,
            Err(e) => {
                log::debug!("Cache read task failed: {}", e);
                None
            }
        }
    }

    /// [`Cache::set`] on the blocking pool, for callers on async workers.
    pub async fn set_async<T>(
        self: &Arc<Self>,
        namespace: &'static str,
        key: String,
        value: T,
        ttl: Duration,
    ) where
        T: Serialize + Send + 'static,
    {
        let cache = self.clone();
        if let Err(e) =
            tokio::task::spawn_blocking(move || cache.set(namespace, &key, &value, ttl)).await
        {
            log::debug!("Cache write task failed: {}", e);
        }
    }

    /// Remove every entry in a namespace.
    pub fn flush(&self, namespace: &str) -> anyhow::Result<usize> {
        let Some(conn) = self.lock() else {
            return Ok(0);
        };
        let removed = conn.execute("DELETE FROM entries WHERE namespace = ?1", params![namespace])?;
        log::debug!("Cache flushed: {} ({} entries)", namespace, removed);
        Ok(removed)
    }

    pub fn close(self) -> anyhow::Result<()> {
        if let Some(conn) = self.conn {
            let conn = conn
                .into_inner()
                .map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;
            conn.close().map_err(|(_, e)| e)?;
        }
        Ok(())
    }
}

fn prepare_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;

    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version == constants::CACHE_SCHEMA_VERSION {
        return Ok(());
    }

    if version != 0 {
        log::debug!(
            "Cache schema {} does not match {}, resetting",
            version,
            constants::CACHE_SCHEMA_VERSION
        );
    }

    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS entries;
         CREATE TABLE entries (
            namespace  TEXT NOT NULL,
            key        TEXT NOT NULL,
            value      TEXT NOT NULL,
            written_at INTEGER NOT NULL,
            ttl_ms     INTEGER NOT NULL,
            PRIMARY KEY (namespace, key)
         );
         PRAGMA user_version = {};",
        constants::CACHE_SCHEMA_VERSION
    ))?;
    Ok(())
}

/// Fixed-width storage key for an arbitrary cache key.
fn derive_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..8])
}
