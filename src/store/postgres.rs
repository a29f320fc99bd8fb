use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, Statement,
};
use sea_orm::ActiveValue::NotSet;
use serde_json::Value;
use sqlx::postgres::PgListener;
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};
use uuid::Uuid;

use super::{CollectionPath, Document, DocumentStore, SnapshotEvent, Subscription};
use crate::{
    db::{create_orm_conn, run_migrations},
    entity::documents::{ActiveModel, Column, Entity as Documents, Model as DocumentModel},
    error::{AppError, AppResult},
    session::Principal,
};

/// Postgres notification channel; the payload is the collection path.
pub const NOTIFY_CHANNEL: &str = "storefront_documents";

const RETRY_DELAY: Duration = Duration::from_secs(2);

type Channels = Arc<Mutex<HashMap<String, Arc<watch::Sender<SnapshotEvent>>>>>;

/// Document store on a single `documents` table. Writers announce changes
/// with `pg_notify`; a listener task re-reads the touched collection and
/// publishes it to every subscriber, in this process or any other.
pub struct PgDocumentStore {
    orm: DatabaseConnection,
    channels: Channels,
    listener: JoinHandle<()>,
}

impl PgDocumentStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let orm = create_orm_conn(database_url).await?;
        run_migrations(&orm).await?;
        Self::from_conn(orm).await
    }

    pub async fn from_conn(orm: DatabaseConnection) -> anyhow::Result<Self> {
        let mut listener = PgListener::connect_with(orm.get_postgres_connection_pool()).await?;
        listener.listen(NOTIFY_CHANNEL).await?;

        let channels: Channels = Arc::default();
        let listener = tokio::spawn(listen(orm.clone(), channels.clone(), listener));
        Ok(Self {
            orm,
            channels,
            listener,
        })
    }

    async fn announce(&self, path: &CollectionPath) {
        let statement = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT pg_notify($1, $2)",
            [NOTIFY_CHANNEL.into(), path.as_str().into()],
        );
        if let Err(err) = self.orm.execute(statement).await {
            // Other processes miss this change until their next refresh;
            // local subscribers are served directly.
            tracing::warn!(error = %err, %path, "pg_notify failed");
            refresh(&self.orm, &self.channels, path.as_str()).await;
        }
    }
}

impl Drop for PgDocumentStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn subscribe(
        &self,
        _principal: &Principal,
        path: &CollectionPath,
    ) -> AppResult<Subscription> {
        let sender = self
            .channels
            .lock()
            .await
            .entry(path.as_str().to_string())
            .or_insert_with(|| Arc::new(watch::channel(SnapshotEvent::empty()).0))
            .clone();

        let docs = load(&self.orm, path.as_str())
            .await
            .map_err(|e| AppError::StoreRead(e.to_string()))?;
        sender.send_replace(SnapshotEvent::Snapshot(Arc::new(docs)));

        Ok(Subscription::new(sender.subscribe()))
    }

    async fn create(
        &self,
        principal: &Principal,
        path: &CollectionPath,
        data: Value,
    ) -> AppResult<Uuid> {
        if !data.is_object() {
            return Err(AppError::Validation("document must be a JSON object".into()));
        }

        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            collection: Set(path.as_str().to_string()),
            data: Set(data),
            updated_by: Set(Some(principal.uid)),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&self.orm)
        .await
        .map_err(write_err)?;

        self.announce(path).await;
        Ok(model.id)
    }

    async fn update(
        &self,
        principal: &Principal,
        path: &CollectionPath,
        id: Uuid,
        patch: Value,
    ) -> AppResult<()> {
        if !patch.is_object() {
            return Err(AppError::Validation("update must be a JSON object".into()));
        }

        // jsonb `||` is a shallow merge, done in one statement so concurrent
        // writers to different fields do not overwrite each other.
        let statement = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            UPDATE documents
            SET data = data || $1, updated_by = $2, updated_at = now()
            WHERE id = $3 AND collection = $4
            "#,
            [
                sea_orm::Value::Json(Some(Box::new(patch))),
                principal.uid.into(),
                id.into(),
                path.as_str().into(),
            ],
        );
        let result = self.orm.execute(statement).await.map_err(write_err)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        self.announce(path).await;
        Ok(())
    }

    async fn delete(
        &self,
        _principal: &Principal,
        path: &CollectionPath,
        id: Uuid,
    ) -> AppResult<()> {
        let result = Documents::delete_many()
            .filter(Column::Id.eq(id))
            .filter(Column::Collection.eq(path.as_str()))
            .exec(&self.orm)
            .await
            .map_err(write_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        self.announce(path).await;
        Ok(())
    }
}

async fn listen(orm: DatabaseConnection, channels: Channels, mut listener: PgListener) {
    loop {
        match listener.recv().await {
            Ok(notification) => refresh(&orm, &channels, notification.payload()).await,
            Err(err) => {
                tracing::error!(error = %err, "document listener lost its connection");
                let message = format!("live updates interrupted: {err}");
                for sender in channels.lock().await.values() {
                    sender.send_replace(SnapshotEvent::Error(message.clone()));
                }

                tokio::time::sleep(RETRY_DELAY).await;
                // The next recv reconnects; anything written meanwhile was
                // never announced to us, so reload every open collection.
                let paths: Vec<String> = channels.lock().await.keys().cloned().collect();
                for path in paths {
                    refresh(&orm, &channels, &path).await;
                }
            }
        }
    }
}

async fn refresh(orm: &DatabaseConnection, channels: &Channels, path: &str) {
    let Some(sender) = channels.lock().await.get(path).cloned() else {
        return;
    };

    let event = match load(orm, path).await {
        Ok(docs) => SnapshotEvent::Snapshot(Arc::new(docs)),
        Err(err) => {
            tracing::error!(error = %err, path, "collection reload failed");
            SnapshotEvent::Error(err.to_string())
        }
    };
    sender.send_replace(event);
}

async fn load(orm: &DatabaseConnection, path: &str) -> Result<Vec<Document>, DbErr> {
    let docs = Documents::find()
        .filter(Column::Collection.eq(path))
        .order_by_asc(Column::CreatedAt)
        .all(orm)
        .await?
        .into_iter()
        .map(document_from_entity)
        .collect();
    Ok(docs)
}

fn document_from_entity(model: DocumentModel) -> Document {
    Document {
        id: model.id,
        data: model.data,
        updated_by: model.updated_by,
        created_at: Some(model.created_at.with_timezone(&Utc)),
        updated_at: Some(model.updated_at.with_timezone(&Utc)),
    }
}

fn write_err(err: DbErr) -> AppError {
    AppError::StoreWrite(err.to_string())
}
