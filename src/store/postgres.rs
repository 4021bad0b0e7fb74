use std::time::Duration;

use async_trait::async_trait;
use launcher_common::{Entry, NewEntry, PositionUpdate};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{EntryStore, materialize, new_id};
use crate::config::DatabaseUrl;
use crate::errors::StoreError;

type EntryRow = (String, String, String, Option<String>, i32);

fn into_entry((id, name, url, category, position): EntryRow) -> Entry {
    Entry {
        id,
        name,
        url,
        category,
        position,
    }
}

/// Postgres-backed store over a small connection pool.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(url: &DatabaseUrl) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(20))
            .connect(url.expose())
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS apps (
                   id VARCHAR PRIMARY KEY,
                   name TEXT NOT NULL,
                   url TEXT NOT NULL,
                   category TEXT,
                   position INTEGER NOT NULL DEFAULT 0
               )"#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl EntryStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self) -> Result<Vec<Entry>, StoreError> {
        let rows: Vec<EntryRow> =
            sqlx::query_as("SELECT id, name, url, category, position FROM apps")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(into_entry).collect())
    }

    async fn create(&self, new: NewEntry) -> Result<Entry, StoreError> {
        let entry = materialize(new_id(), new);
        let row: EntryRow = sqlx::query_as(
            r#"INSERT INTO apps (id, name, url, category, position)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, name, url, category, position"#,
        )
        .bind(&entry.id)
        .bind(&entry.name)
        .bind(&entry.url)
        .bind(&entry.category)
        .bind(entry.position)
        .fetch_one(&self.pool)
        .await?;
        Ok(into_entry(row))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM apps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_positions(&self, updates: &[PositionUpdate]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for update in updates {
            sqlx::query("UPDATE apps SET position = $1 WHERE id = $2")
                .bind(update.position)
                .bind(&update.id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        tracing::debug!(count = updates.len(), "Applied position batch");
        Ok(())
    }
}
