//! Local key/value storage
//!
//! A small SQLite-backed equivalent of browser local storage. The session
//! identity is kept here so it survives restarts.

use crate::store::{Session, UserId};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

const KEY_USER_ID: &str = "userId";
const KEY_TOKEN: &str = "token";
const KEY_USERNAME: &str = "username";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt value for {key}: {value}")]
    Corrupt { key: String, value: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Where the store keeps identity between runs
pub trait SessionPersistence: Send + Sync {
    /// Read a previously saved session, if any
    fn load(&self) -> StorageResult<Option<Session>>;

    fn save(&self, session: &Session) -> StorageResult<()>;

    /// Forget the saved session
    fn clear(&self) -> StorageResult<()>;
}

/// Thread-safe storage handle
#[derive(Clone)]
pub struct LocalStorage {
    conn: Arc<Mutex<Connection>>,
}

impl LocalStorage {
    /// Open or create storage at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory storage (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.lock();
        let value = conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.lock();
        upsert(&conn, key, value)?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> StorageResult<()> {
        let conn = self.lock();
        conn.execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn upsert(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, Utc::now().to_rfc3339()],
    )
}

impl SessionPersistence for LocalStorage {
    fn load(&self) -> StorageResult<Option<Session>> {
        let Some(raw_id) = self.get_item(KEY_USER_ID)? else {
            return Ok(None);
        };
        let user_id: UserId = raw_id.parse().map_err(|_| StorageError::Corrupt {
            key: KEY_USER_ID.to_string(),
            value: raw_id.clone(),
        })?;
        let token = self.get_item(KEY_TOKEN)?;
        let username = self.get_item(KEY_USERNAME)?.unwrap_or_default();

        Ok(Some(Session {
            user_id,
            token,
            username,
        }))
    }

    fn save(&self, session: &Session) -> StorageResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        upsert(&tx, KEY_USER_ID, &session.user_id.to_string())?;
        match &session.token {
            Some(token) => {
                upsert(&tx, KEY_TOKEN, token)?;
            }
            None => {
                tx.execute("DELETE FROM local_storage WHERE key = ?1", params![KEY_TOKEN])?;
            }
        }
        upsert(&tx, KEY_USERNAME, &session.username)?;
        tx.commit()?;
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let conn = self.lock();
        conn.execute(
            "DELETE FROM local_storage WHERE key IN (?1, ?2, ?3)",
            params![KEY_USER_ID, KEY_TOKEN, KEY_USERNAME],
        )?;
        Ok(())
    }
}
