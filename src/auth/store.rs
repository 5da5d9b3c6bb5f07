// Persistent token storage

use anyhow::{Context, Result};
use dashmap::DashMap;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::types::{Credentials, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

/// Key-value storage for credentials.
///
/// Implementations must survive process restarts when used by the CLI;
/// the in-memory store exists for tests and one-shot embeddings.
pub trait TokenStore: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<String>>;
    fn set(&self, name: &str, value: &str) -> Result<()>;
    fn remove(&self, name: &str) -> Result<()>;

    /// Read both tokens at once
    fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            access_token: self.get(ACCESS_TOKEN_KEY)?,
            refresh_token: self.get(REFRESH_TOKEN_KEY)?,
        })
    }

    /// Drop both tokens
    fn purge(&self) -> Result<()> {
        self.remove(ACCESS_TOKEN_KEY)?;
        self.remove(REFRESH_TOKEN_KEY)
    }
}

/// Process-local token store
#[derive(Default)]
pub struct MemoryTokenStore {
    values: DashMap<String, String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an access/refresh pair
    pub fn with_tokens(access_token: Option<&str>, refresh_token: Option<&str>) -> Self {
        let store = Self::new();
        if let Some(token) = access_token {
            store.values.insert(ACCESS_TOKEN_KEY.to_string(), token.to_string());
        }
        if let Some(token) = refresh_token {
            store.values.insert(REFRESH_TOKEN_KEY.to_string(), token.to_string());
        }
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.values.get(name).map(|entry| entry.value().clone()))
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.values.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.values.remove(name);
        Ok(())
    }
}

/// SQLite-backed token store using a single `auth_kv` table
pub struct SqliteTokenStore {
    conn: Mutex<Connection>,
}

impl SqliteTokenStore {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create token directory: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open token database: {}", path.display()))?;
        tracing::debug!("Opened token store at {}", path.display());
        Self::init(conn)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS auth_kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .context("Failed to create auth_kv table")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))?;
        f(&conn)
    }
}

impl TokenStore for SqliteTokenStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM auth_kv WHERE key = ?",
                [name],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read {} from token store", name))
        })
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO auth_kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![name, value],
            )
            .with_context(|| format!("Failed to write {} to token store", name))?;
            Ok(())
        })
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM auth_kv WHERE key = ?", [name])
                .with_context(|| format!("Failed to remove {} from token store", name))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);

        store.set(ACCESS_TOKEN_KEY, "A1").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("A1"));

        store.remove(ACCESS_TOKEN_KEY).unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_purge_clears_both_tokens() {
        let store = MemoryTokenStore::with_tokens(Some("A1"), Some("R1"));
        assert_eq!(
            store.credentials().unwrap(),
            Credentials {
                access_token: Some("A1".to_string()),
                refresh_token: Some("R1".to_string()),
            }
        );

        store.purge().unwrap();
        assert_eq!(store.credentials().unwrap(), Credentials::default());
    }

    #[test]
    fn test_sqlite_store_overwrites_value() {
        let store = SqliteTokenStore::open_in_memory().unwrap();
        store.set(ACCESS_TOKEN_KEY, "A1").unwrap();
        store.set(ACCESS_TOKEN_KEY, "A2").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("A2"));

        // Removing a missing key is not an error
        store.remove(REFRESH_TOKEN_KEY).unwrap();
    }

    #[test]
    fn test_sqlite_store_survives_reopen() {
        let path = std::env::temp_dir()
            .join(format!("unibro-{}", uuid::Uuid::new_v4()))
            .join("tokens.sqlite3");

        {
            let store = SqliteTokenStore::open(&path).unwrap();
            store.set(ACCESS_TOKEN_KEY, "A1").unwrap();
            store.set(REFRESH_TOKEN_KEY, "R1").unwrap();
        }

        let store = SqliteTokenStore::open(&path).unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("A1"));
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("R1"));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
