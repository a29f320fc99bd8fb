use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    error::AppResult,
    store::{AUDIT_LOGS, StoreClient},
};

/// Appends an entry to the store's audit collection. Callers log and ignore
/// failures; an audit write never fails the action it describes.
pub async fn log_audit(
    client: &StoreClient,
    actor: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    client
        .create(
            AUDIT_LOGS,
            json!({
                "actor": actor,
                "action": action,
                "resource": resource,
                "metadata": metadata,
            }),
        )
        .await?;

    Ok(())
}
