use std::env;

use crate::error::{AppError, AppResult};

pub const DEFAULT_STORE_ID: &str = "storefront";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Raw deployment configuration. Required values stay optional here so a
/// missing one can be reported instead of aborting start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub store_id: String,
    pub admin_password: Option<String>,
    pub session_secret: Option<String>,
}

/// Connection parameters for the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSettings {
    Postgres { database_url: String },
    Memory,
}

/// Configuration with every required value present.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub store: StoreSettings,
    pub store_id: String,
    pub admin_password: String,
    pub session_secret: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match non_empty("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => anyhow::bail!("unknown STORE_BACKEND {other:?}"),
        };
        let host = non_empty("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = non_empty("APP_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        Ok(Self {
            host,
            port,
            backend,
            database_url: non_empty("DATABASE_URL"),
            store_id: non_empty("STORE_ID").unwrap_or_else(|| DEFAULT_STORE_ID.to_string()),
            admin_password: non_empty("ADMIN_PASSWORD"),
            session_secret: non_empty("SESSION_SECRET"),
        })
    }

    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.backend == StoreBackend::Postgres && self.database_url.is_none() {
            missing.push("DATABASE_URL");
        }
        if self.admin_password.is_none() {
            missing.push("ADMIN_PASSWORD");
        }
        if self.session_secret.is_none() {
            missing.push("SESSION_SECRET");
        }
        missing
    }

    pub fn resolve(&self) -> AppResult<ResolvedConfig> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(AppError::Configuration(missing));
        }

        let store = match (self.backend, &self.database_url) {
            (StoreBackend::Memory, _) => StoreSettings::Memory,
            (StoreBackend::Postgres, Some(url)) => StoreSettings::Postgres {
                database_url: url.clone(),
            },
            (StoreBackend::Postgres, None) => {
                return Err(AppError::Configuration(vec!["DATABASE_URL"]));
            }
        };

        Ok(ResolvedConfig {
            store,
            store_id: self.store_id.clone(),
            admin_password: self.admin_password.clone().unwrap_or_default(),
            session_secret: self.session_secret.clone().unwrap_or_default(),
        })
    }
}
