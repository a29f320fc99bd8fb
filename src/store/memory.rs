use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::{Mutex, watch};
use uuid::Uuid;

use super::{CollectionPath, Document, DocumentStore, SnapshotEvent, Subscription, merge_fields};
use crate::{
    error::{AppError, AppResult},
    session::Principal,
};

struct Collection {
    docs: Vec<Document>,
    tx: watch::Sender<SnapshotEvent>,
}

impl Collection {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(SnapshotEvent::empty());
        Self {
            docs: Vec::new(),
            tx,
        }
    }

    fn publish(&self) {
        self.tx
            .send_replace(SnapshotEvent::Snapshot(Arc::new(self.docs.clone())));
    }
}

/// In-process document store. Every collection keeps its own snapshot
/// channel; each write republishes the whole collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<CollectionPath, Collection>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail until switched off again.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delivers an error to the subscribers of `path` in place of a snapshot.
    pub async fn emit_read_error(&self, path: &CollectionPath, message: &str) {
        let mut collections = self.collections.lock().await;
        let collection = collections
            .entry(path.clone())
            .or_insert_with(Collection::new);
        collection
            .tx
            .send_replace(SnapshotEvent::Error(message.to_string()));
    }

    /// Current documents of `path`, bypassing subscriptions.
    pub async fn documents(&self, path: &CollectionPath) -> Vec<Document> {
        self.collections
            .lock()
            .await
            .get(path)
            .map(|c| c.docs.clone())
            .unwrap_or_default()
    }

    fn check_writable(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::StoreWrite("store is rejecting writes".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribe(
        &self,
        _principal: &Principal,
        path: &CollectionPath,
    ) -> AppResult<Subscription> {
        let mut collections = self.collections.lock().await;
        let collection = collections
            .entry(path.clone())
            .or_insert_with(Collection::new);
        Ok(Subscription::new(collection.tx.subscribe()))
    }

    async fn create(
        &self,
        principal: &Principal,
        path: &CollectionPath,
        data: Value,
    ) -> AppResult<Uuid> {
        self.check_writable()?;
        if !data.is_object() {
            return Err(AppError::Validation("document must be a JSON object".into()));
        }

        let now = Utc::now();
        let id = Uuid::new_v4();
        let mut collections = self.collections.lock().await;
        let collection = collections
            .entry(path.clone())
            .or_insert_with(Collection::new);
        collection.docs.push(Document {
            id,
            data,
            updated_by: Some(principal.uid),
            created_at: Some(now),
            updated_at: Some(now),
        });
        collection.publish();
        Ok(id)
    }

    async fn update(
        &self,
        principal: &Principal,
        path: &CollectionPath,
        id: Uuid,
        patch: Value,
    ) -> AppResult<()> {
        self.check_writable()?;
        let mut collections = self.collections.lock().await;
        let collection = collections.get_mut(path).ok_or(AppError::NotFound)?;
        let doc = collection
            .docs
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or(AppError::NotFound)?;

        merge_fields(&mut doc.data, patch)?;
        doc.updated_by = Some(principal.uid);
        doc.updated_at = Some(Utc::now());
        collection.publish();
        Ok(())
    }

    async fn delete(
        &self,
        _principal: &Principal,
        path: &CollectionPath,
        id: Uuid,
    ) -> AppResult<()> {
        self.check_writable()?;
        let mut collections = self.collections.lock().await;
        let collection = collections.get_mut(path).ok_or(AppError::NotFound)?;
        let before = collection.docs.len();
        collection.docs.retain(|doc| doc.id != id);
        if collection.docs.len() == before {
            return Err(AppError::NotFound);
        }
        collection.publish();
        Ok(())
    }
}
