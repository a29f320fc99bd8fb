use std::sync::Arc;

use crate::{
    config::{AppConfig, ResolvedConfig, StoreSettings},
    error::{AppError, AppResult},
    session::{AdminGate, IdentityService, SessionRegistry, TokenIdentityService},
    store::{DocumentStore, memory::MemoryStore, postgres::PgDocumentStore},
    storefront::Storefront,
};

pub struct ReadyState {
    pub storefront: Storefront,
    pub identity: Arc<dyn IdentityService>,
    pub admin_gate: AdminGate,
    pub sessions: SessionRegistry,
}

pub enum AppContext {
    /// Required settings are absent. Nothing store-related is started.
    Unconfigured { missing: Vec<&'static str> },
    Ready(ReadyState),
}

#[derive(Clone)]
pub struct AppState {
    pub context: Arc<AppContext>,
}

impl AppState {
    pub fn unconfigured(missing: Vec<&'static str>) -> Self {
        Self {
            context: Arc::new(AppContext::Unconfigured { missing }),
        }
    }

    pub fn ready(ready: ReadyState) -> Self {
        Self {
            context: Arc::new(AppContext::Ready(ready)),
        }
    }

    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let resolved = match config.resolve() {
            Ok(resolved) => resolved,
            Err(AppError::Configuration(missing)) => {
                tracing::warn!(missing = ?missing, "configuration missing; serving notice only");
                return Ok(Self::unconfigured(missing));
            }
            Err(err) => return Err(err.into()),
        };

        let store: Arc<dyn DocumentStore> = match &resolved.store {
            StoreSettings::Memory => {
                tracing::warn!("using the in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
            StoreSettings::Postgres { database_url } => {
                Arc::new(PgDocumentStore::connect(database_url).await?)
            }
        };

        Ok(Self::assemble(store, &resolved).await?)
    }

    /// Wires the application around an already connected store.
    pub async fn assemble(store: Arc<dyn DocumentStore>, config: &ResolvedConfig) -> AppResult<Self> {
        let identity: Arc<dyn IdentityService> =
            Arc::new(TokenIdentityService::new(&config.session_secret));
        let storefront = Storefront::bootstrap(store, identity.as_ref(), &config.store_id).await;
        let admin_gate = AdminGate::new(&config.admin_password)?;

        Ok(Self::ready(ReadyState {
            storefront,
            identity,
            admin_gate,
            sessions: SessionRegistry::new(),
        }))
    }

    pub fn ready_state(&self) -> AppResult<&ReadyState> {
        match self.context.as_ref() {
            AppContext::Unconfigured { missing } => Err(AppError::Configuration(missing.clone())),
            AppContext::Ready(ready) => Ok(ready),
        }
    }
}
