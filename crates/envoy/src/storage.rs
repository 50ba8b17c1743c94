use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{ClientError, Result};

pub const CHATS_KEY: &str = "chats";
pub const CURRENT_CHAT_KEY: &str = "currentChatId";
pub const USER_KEY: &str = "user";

/// String key/value store with browser-storage semantics.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Survives restarts. One sqlite table of key/value rows.
#[derive(Clone, Debug)]
pub struct DurableStorage {
    conn: Arc<Mutex<Connection>>,
}

impl DurableStorage {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| ClientError::Lock)
    }
}

impl Storage for DurableStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Lives as long as the process.
#[derive(Clone, Debug, Default)]
pub struct SessionStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.items.lock().map_err(|_| ClientError::Lock)
    }
}

impl Storage for SessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(storage: &dyn Storage) {
        assert_eq!(storage.get_item("chats").unwrap(), None);

        storage.set_item("chats", "[]").unwrap();
        assert_eq!(storage.get_item("chats").unwrap().as_deref(), Some("[]"));

        storage.set_item("chats", "[1]").unwrap();
        assert_eq!(storage.get_item("chats").unwrap().as_deref(), Some("[1]"));

        storage.remove_item("chats").unwrap();
        assert_eq!(storage.get_item("chats").unwrap(), None);

        // Removing a missing key is not an error
        storage.remove_item("chats").unwrap();
    }

    #[test]
    fn session_storage_behaves_like_a_map() {
        exercise(&SessionStorage::new());
    }

    #[test]
    fn durable_storage_behaves_like_a_map() {
        exercise(&DurableStorage::open_in_memory().unwrap());
    }

    #[test]
    fn durable_storage_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("storage.db");

        let first = DurableStorage::open(&path).unwrap();
        first.set_item(USER_KEY, r#"{"id":"1"}"#).unwrap();
        drop(first);

        let second = DurableStorage::open(&path).unwrap();
        assert_eq!(
            second.get_item(USER_KEY).unwrap().as_deref(),
            Some(r#"{"id":"1"}"#)
        );
    }
}
