//! Binding to the real-time document store.
//!
//! Collections are addressed by path and always observed as full snapshots:
//! a subscriber never receives a diff, only the whole collection again.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    session::Principal,
};

pub mod memory;
pub mod postgres;

pub const PRODUCTS: &str = "products";
pub const ORDERS: &str = "orders";
pub const AUDIT_LOGS: &str = "audit_logs";

/// `stores/{store_id}/{collection}`. The store id keeps deployments that
/// share one backend apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn new(store_id: &str, collection: &str) -> Self {
        Self(format!("stores/{store_id}/{collection}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub data: Value,
    pub updated_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub enum SnapshotEvent {
    Snapshot(Arc<Vec<Document>>),
    Error(String),
}

impl SnapshotEvent {
    pub fn empty() -> Self {
        SnapshotEvent::Snapshot(Arc::new(Vec::new()))
    }
}

/// Live feed of one collection. The first `next` yields the current state.
pub struct Subscription {
    rx: watch::Receiver<SnapshotEvent>,
}

impl Subscription {
    pub fn new(mut rx: watch::Receiver<SnapshotEvent>) -> Self {
        rx.mark_changed();
        Self { rx }
    }

    /// Waits for the next delivery. `None` once the store side is gone.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn subscribe(
        &self,
        principal: &Principal,
        path: &CollectionPath,
    ) -> AppResult<Subscription>;

    /// Stores `data` as a new document; the store picks the id and stamps
    /// both timestamps.
    async fn create(
        &self,
        principal: &Principal,
        path: &CollectionPath,
        data: Value,
    ) -> AppResult<Uuid>;

    /// Shallow-merges `patch` into the document and re-stamps `updated_at`.
    async fn update(
        &self,
        principal: &Principal,
        path: &CollectionPath,
        id: Uuid,
        patch: Value,
    ) -> AppResult<()>;

    async fn delete(&self, principal: &Principal, path: &CollectionPath, id: Uuid)
    -> AppResult<()>;
}

/// Copies every top-level field of `patch` into `target`.
pub fn merge_fields(target: &mut Value, patch: Value) -> AppResult<()> {
    let Value::Object(fields) = patch else {
        return Err(AppError::Validation("update must be a JSON object".into()));
    };
    if !target.is_object() {
        *target = Value::Object(Default::default());
    }
    if let Value::Object(existing) = target {
        existing.extend(fields);
    }
    Ok(())
}

/// A store handle bound to the identity it acts for. Holding one is the
/// proof that identity bootstrap already happened.
#[derive(Clone)]
pub struct StoreClient {
    store: Arc<dyn DocumentStore>,
    principal: Principal,
    store_id: String,
}

impl StoreClient {
    pub fn new(store: Arc<dyn DocumentStore>, principal: Principal, store_id: &str) -> Self {
        Self {
            store,
            principal,
            store_id: store_id.to_string(),
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn path(&self, collection: &str) -> CollectionPath {
        CollectionPath::new(&self.store_id, collection)
    }

    pub async fn subscribe(&self, collection: &str) -> AppResult<Subscription> {
        self.store
            .subscribe(&self.principal, &self.path(collection))
            .await
    }

    pub async fn create(&self, collection: &str, data: Value) -> AppResult<Uuid> {
        self.store
            .create(&self.principal, &self.path(collection), data)
            .await
    }

    pub async fn update(&self, collection: &str, id: Uuid, patch: Value) -> AppResult<()> {
        self.store
            .update(&self.principal, &self.path(collection), id, patch)
            .await
    }

    pub async fn delete(&self, collection: &str, id: Uuid) -> AppResult<()> {
        self.store
            .delete(&self.principal, &self.path(collection), id)
            .await
    }
}
