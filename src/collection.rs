//! Read-only local mirror of a subscribed collection.

use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle};

use crate::store::{Document, SnapshotEvent, StoreClient, Subscription};

const RESUBSCRIBE_MIN: Duration = Duration::from_millis(500);
const RESUBSCRIBE_MAX: Duration = Duration::from_secs(30);

pub trait FromDocument: Sized {
    fn from_document(doc: &Document) -> Result<Self, serde_json::Error>;
}

/// Latest known state of a collection. Never mutated once published.
#[derive(Debug)]
pub struct ViewState<T> {
    pub items: Arc<Vec<T>>,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl<T> ViewState<T> {
    pub fn loading() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            loading: true,
            last_error: None,
        }
    }
}

impl<T: FromDocument> ViewState<T> {
    /// A snapshot replaces everything; an error keeps the items already held.
    pub fn apply(&self, event: &SnapshotEvent) -> Self {
        match event {
            SnapshotEvent::Snapshot(docs) => Self {
                items: Arc::new(decode_all(docs)),
                loading: false,
                last_error: None,
            },
            SnapshotEvent::Error(message) => Self {
                items: self.items.clone(),
                loading: false,
                last_error: Some(message.clone()),
            },
        }
    }
}

fn decode_all<T: FromDocument>(docs: &[Document]) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match T::from_document(doc) {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::warn!(id = %doc.id, error = %err, "skipping undecodable document");
                None
            }
        })
        .collect()
}

pub struct CollectionView<T> {
    state: watch::Receiver<Arc<ViewState<T>>>,
    task: Option<JoinHandle<()>>,
}

impl<T> CollectionView<T>
where
    T: FromDocument + Send + Sync + 'static,
{
    /// Starts mirroring `subscription` in the background.
    pub fn spawn(name: &'static str, subscription: Subscription) -> Self {
        let (tx, rx) = watch::channel(Arc::new(ViewState::loading()));
        let task = tokio::spawn(async move { pump(name, subscription, &tx).await });
        Self {
            state: rx,
            task: Some(task),
        }
    }

    /// Subscribes to `collection` through `client` and keeps the view
    /// alive: a failed or closed subscription is reported on the view and
    /// retried with backoff.
    pub fn open(name: &'static str, client: StoreClient, collection: &'static str) -> Self {
        let (tx, rx) = watch::channel(Arc::new(ViewState::loading()));
        let task = tokio::spawn(async move {
            let mut delay = RESUBSCRIBE_MIN;
            loop {
                match client.subscribe(collection).await {
                    Ok(subscription) => {
                        delay = RESUBSCRIBE_MIN;
                        pump(name, subscription, &tx).await;
                    }
                    Err(err) => {
                        tracing::error!(collection = name, error = %err, "subscribe failed");
                        let next = tx.borrow().apply(&SnapshotEvent::Error(err.to_string()));
                        tx.send_replace(Arc::new(next));
                    }
                }
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(RESUBSCRIBE_MAX);
            }
        });
        Self {
            state: rx,
            task: Some(task),
        }
    }

    /// A view with nothing behind it, used while no identity is available.
    /// It stays empty and loading.
    pub fn detached() -> Self {
        let (_tx, rx) = watch::channel(Arc::new(ViewState::loading()));
        Self {
            state: rx,
            task: None,
        }
    }

    pub fn current(&self) -> Arc<ViewState<T>> {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Arc<Vec<T>> {
        self.current().items.clone()
    }

    /// Waits until a published state satisfies `predicate`. Returns `None`
    /// if the view stops before that happens.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&ViewState<T>) -> bool,
    ) -> Option<Arc<ViewState<T>>> {
        let mut rx = self.state.clone();
        let state = rx.wait_for(|state| predicate(state)).await.ok()?;
        Some(state.clone())
    }
}

impl<T> Drop for CollectionView<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn pump<T: FromDocument>(
    name: &'static str,
    mut subscription: Subscription,
    tx: &watch::Sender<Arc<ViewState<T>>>,
) {
    while let Some(event) = subscription.next().await {
        match &event {
            SnapshotEvent::Snapshot(docs) => {
                tracing::debug!(collection = name, documents = docs.len(), "snapshot");
            }
            SnapshotEvent::Error(message) => {
                tracing::error!(collection = name, error = %message, "snapshot delivery failed");
            }
        }
        let next = tx.borrow().apply(&event);
        tx.send_replace(Arc::new(next));
    }
    tracing::debug!(collection = name, "subscription closed");
}
