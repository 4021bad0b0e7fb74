use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use launcher_common::{Entry, NewEntry, PositionUpdate};
use rusqlite::{Connection, params};

use super::{EntryStore, materialize, new_id};
use crate::errors::StoreError;

/// SQLite-backed store. Every statement runs on tokio's blocking pool.
#[derive(Clone)]
pub struct SqliteStore {
    inner: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// In-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS apps (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                url TEXT NOT NULL,
                category TEXT,
                position INTEGER NOT NULL DEFAULT 0
            );
            ",
        )?;
        Ok(Self {
            inner: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    async fn call<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&mut *guard)
        })
        .await?
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        category: row.get(3)?,
        position: row.get(4)?,
    })
}

#[async_trait]
impl EntryStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn list(&self) -> Result<Vec<Entry>, StoreError> {
        self.call(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, url, category, position FROM apps ORDER BY rowid")?;
            let rows = stmt.query_map([], row_to_entry)?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?);
            }
            Ok(entries)
        })
        .await
    }

    async fn create(&self, new: NewEntry) -> Result<Entry, StoreError> {
        let entry = materialize(new_id(), new);
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO apps (id, name, url, category, position) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![entry.id, entry.name, entry.url, entry.category, entry.position],
            )?;
            Ok(entry)
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let id = id.to_string();
        self.call(move |conn| {
            let count = conn.execute("DELETE FROM apps WHERE id = ?1", params![id])?;
            Ok(count > 0)
        })
        .await
    }

    async fn update_positions(&self, updates: &[PositionUpdate]) -> Result<(), StoreError> {
        let updates = updates.to_vec();
        let count = updates.len();
        self.call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare("UPDATE apps SET position = ?1 WHERE id = ?2")?;
                for update in &updates {
                    stmt.execute(params![update.position, update.id])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await?;
        tracing::debug!(count, "Applied position batch");
        Ok(())
    }
}
