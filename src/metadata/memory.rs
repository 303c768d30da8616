//! In-memory metadata store.
//!
//! Stores all records in memory with no persistence. Useful for testing
//! and ephemeral deployments. Uses `RwLock<HashMap>` for thread-safe access.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

use super::store::{now_iso8601, FileRecord, MetadataStore, NewFileRecord};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    by_name: HashMap<String, FileRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    inner: RwLock<Inner>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for MemoryMetadataStore {
    fn create(
        &self,
        record: NewFileRecord,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<FileRecord>> + Send + '_>> {
        Box::pin(async move {
            let mut inner = self.inner.write().expect("rwlock poisoned");
            if inner.by_name.contains_key(&record.name) {
                anyhow::bail!("file record {} already exists", record.name);
            }
            inner.next_id += 1;
            let created = FileRecord {
                id: inner.next_id,
                name: record.name,
                content_type: record.content_type,
                path: record.path,
                created_at: now_iso8601(),
            };
            inner.by_name.insert(created.name.clone(), created.clone());
            Ok(created)
        })
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<FileRecord>>> + Send + '_>> {
        let name = name.to_string();
        Box::pin(async move {
            let inner = self.inner.read().expect("rwlock poisoned");
            Ok(inner.by_name.get(&name).cloned())
        })
    }

    fn count(&self) -> Pin<Box<dyn Future<Output = anyhow::Result<u64>> + Send + '_>> {
        Box::pin(async move {
            let inner = self.inner.read().expect("rwlock poisoned");
            Ok(inner.by_name.len() as u64)
        })
    }
}
