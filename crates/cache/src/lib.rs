//! Durable result cache keyed by request fingerprint.
//!
//! Entries live in a single SQLite table. Each `(namespace, payload)` pair maps
//! to exactly one stored JSON value; writes replace. There is no expiry: stale
//! entries stay until [`SqliteCache::clear`] is called.

mod fingerprint;

pub use fingerprint::{canonicalize, fingerprint, Fingerprint};

use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("cache directory error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache connection lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Storage seam used by callers that cache JSON results.
///
/// `lookup` returns `Ok(None)` on a miss; an `Err` always means the store
/// itself failed.
pub trait ResultCache: Send + Sync {
    fn lookup(&self, namespace: &str, payload: &Value) -> Result<Option<Value>>;
    fn store(&self, namespace: &str, payload: &Value, result: &Value) -> Result<()>;
}

pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open (or create) a cache database at `path`.
    ///
    /// Missing parent directories are created.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.init_schema()?;
        tracing::debug!(path = %path.display(), "Opened result cache");
        Ok(cache)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Per-user cache location, e.g. `~/.cache/transit/cache.sqlite` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join("transit").join("cache.sqlite"))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                fingerprint TEXT PRIMARY KEY,
                namespace TEXT NOT NULL,
                value_json TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_cache_entries_namespace ON cache_entries(namespace);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Fetch the value stored for `(namespace, payload)`, if any.
    pub fn get<P, T>(&self, namespace: &str, payload: &P) -> Result<Option<T>>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_value(payload)?;
        match self.lookup(namespace, &payload)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Store `result` for `(namespace, payload)`, replacing any previous value.
    pub fn set<P, T>(&self, namespace: &str, payload: &P, result: &T) -> Result<()>
    where
        P: Serialize + ?Sized,
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(payload)?;
        let result = serde_json::to_value(result)?;
        self.store(namespace, &payload, &result)
    }

    /// Whether a value is stored under `fingerprint`.
    pub fn contains(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let conn = self.lock()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM cache_entries WHERE fingerprint = ?1",
                [fingerprint.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop every entry. Returns the number of rows removed.
    pub fn clear(&self) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM cache_entries", [])?;
        tracing::info!(removed, "Cleared result cache");
        Ok(removed)
    }
}

impl ResultCache for SqliteCache {
    fn lookup(&self, namespace: &str, payload: &Value) -> Result<Option<Value>> {
        let key = Fingerprint::from_value(namespace, payload);
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT value_json FROM cache_entries WHERE fingerprint = ?1",
                [key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        drop(conn);

        match json {
            Some(json) => {
                tracing::debug!(namespace, fingerprint = %key, "Cache hit");
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => {
                tracing::debug!(namespace, fingerprint = %key, "Cache miss");
                Ok(None)
            }
        }
    }

    fn store(&self, namespace: &str, payload: &Value, result: &Value) -> Result<()> {
        let key = Fingerprint::from_value(namespace, payload);
        let json = serde_json::to_string(result)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (fingerprint, namespace, value_json, created_at) VALUES (?1, ?2, ?3, ?4)",
            (
                key.as_str(),
                namespace,
                json,
                chrono::Utc::now().timestamp(),
            ),
        )?;
        tracing::debug!(namespace, fingerprint = %key, "Cache write");
        Ok(())
    }
}
