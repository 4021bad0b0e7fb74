//! Storage adapters for launcher entries.
//!
//! Every backend implements [`EntryStore`]; the API layer only ever sees an
//! `Arc<dyn EntryStore>` handed to it at startup.
//!
//! | Backend          | Module     | Natural list order |
//! |------------------|------------|--------------------|
//! | `MemoryStore`    | `memory`   | insertion          |
//! | `SqliteStore`    | `sqlite`   | rowid              |
//! | `PostgresStore`  | `postgres` | heap (unspecified) |

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use launcher_common::{Entry, NewEntry, PositionUpdate};

use crate::config::StorageBackend;
use crate::errors::StoreError;

pub mod memory;
pub mod postgres;
pub mod sqlite;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// Position assigned to every newly created entry.
pub const DEFAULT_POSITION: i32 = 0;

/// CRUD plus batch reorder over the single `apps` table.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Short backend label for logs.
    fn backend(&self) -> &'static str;

    async fn list(&self) -> Result<Vec<Entry>, StoreError>;

    /// Persist `new` with a fresh id and [`DEFAULT_POSITION`].
    async fn create(&self, new: NewEntry) -> Result<Entry, StoreError>;

    /// Returns `false` when no entry had this id.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Apply the whole batch or none of it. Unknown ids are skipped.
    async fn update_positions(&self, updates: &[PositionUpdate]) -> Result<(), StoreError>;
}

pub type SharedStore = Arc<dyn EntryStore>;

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn materialize(id: String, new: NewEntry) -> Entry {
    Entry {
        id,
        name: new.name,
        url: new.url,
        category: new.category,
        position: DEFAULT_POSITION,
    }
}

/// Construct the configured backend.
pub async fn open(backend: &StorageBackend) -> Result<SharedStore> {
    let store: SharedStore = match backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Sqlite(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            Arc::new(
                SqliteStore::open(path)
                    .with_context(|| format!("Failed to open SQLite database {}", path.display()))?,
            )
        }
        StorageBackend::Postgres(url) => Arc::new(
            PostgresStore::connect(url)
                .await
                .with_context(|| format!("Failed to connect to {}", url.redacted()))?,
        ),
    };
    tracing::info!(backend = store.backend(), "Storage ready");
    Ok(store)
}
