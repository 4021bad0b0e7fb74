use std::sync::Mutex;

use async_trait::async_trait;
use launcher_common::{Entry, NewEntry, PositionUpdate};

use super::{EntryStore, materialize, new_id};
use crate::errors::StoreError;

/// Process-local store; contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Entry>>, StoreError> {
        self.entries.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> Result<Vec<Entry>, StoreError> {
        Ok(self.lock()?.clone())
    }

    async fn create(&self, new: NewEntry) -> Result<Entry, StoreError> {
        let entry = materialize(new_id(), new);
        self.lock()?.push(entry.clone());
        Ok(entry)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        Ok(entries.len() != before)
    }

    async fn update_positions(&self, updates: &[PositionUpdate]) -> Result<(), StoreError> {
        // Held for the whole batch.
        let mut entries = self.lock()?;
        for update in updates {
            if let Some(entry) = entries.iter_mut().find(|e| e.id == update.id) {
                entry.position = update.position;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_unique_ids_and_default_position() {
        let store = MemoryStore::new();
        let a = store.create(NewEntry::new("A", "https://a.com")).await.unwrap();
        let b = store.create(NewEntry::new("B", "https://b.com")).await.unwrap();
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
        assert_eq!(a.position, 0);
        assert_eq!(b.position, 0);
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = MemoryStore::new();
        for name in ["one", "two", "three"] {
            store
                .create(NewEntry::new(name, "https://example.com"))
                .await
                .unwrap();
        }
        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let store = MemoryStore::new();
        let a = store.create(NewEntry::new("A", "https://a.com")).await.unwrap();
        assert!(store.delete(&a.id).await.unwrap());
        assert!(!store.delete(&a.id).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_positions_skips_unknown_ids() {
        let store = MemoryStore::new();
        let a = store.create(NewEntry::new("A", "https://a.com")).await.unwrap();
        store
            .update_positions(&[
                PositionUpdate::new("ghost", 5),
                PositionUpdate::new(a.id.clone(), 3),
            ])
            .await
            .unwrap();
        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].position, 3);
    }
}
