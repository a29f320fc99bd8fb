//! Anonymous identity bootstrap and the shared-secret admin gate.
//!
//! The admin gate only toggles dashboard access for one visitor session. It
//! is not an authorization layer: the store does not know about it.

use std::{collections::HashMap, sync::Arc};

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    cart::Cart,
    error::{AppError, AppResult},
};

/// Opaque anonymous identity. Carries no profile data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub uid: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub anonymous: bool,
    pub iat: usize,
    pub exp: usize,
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn sign_in_anonymously(&self) -> AppResult<Principal>;

    fn verify(&self, token: &str) -> AppResult<Principal>;
}

/// Issues anonymous principals as HS256 tokens signed with the session secret.
pub struct TokenIdentityService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIdentityService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(24),
        }
    }
}

#[async_trait]
impl IdentityService for TokenIdentityService {
    async fn sign_in_anonymously(&self) -> AppResult<Principal> {
        let uid = Uuid::new_v4();
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Auth("failed to set expiration".into()))?;

        let claims = Claims {
            sub: uid.to_string(),
            anonymous: true,
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Auth(e.to_string()))?;

        tracing::debug!(%uid, "anonymous sign-in");
        Ok(Principal {
            uid,
            token,
            expires_at: DateTime::from_timestamp(claims.exp as i64, 0).unwrap_or(expiration),
        })
    }

    fn verify(&self, token: &str) -> AppResult<Principal> {
        let token = token.trim_start_matches("Bearer ").trim();
        let decoded = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AppError::Auth("invalid or expired session token".into()))?;

        let uid = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::Auth("invalid subject in session token".into()))?;
        let expires_at = DateTime::from_timestamp(decoded.claims.exp as i64, 0)
            .ok_or_else(|| AppError::Auth("invalid expiry in session token".into()))?;

        Ok(Principal {
            uid,
            token: token.to_string(),
            expires_at,
        })
    }
}

/// Client-local admin flag. No expiry and no server-side meaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdminFlag(bool);

impl AdminFlag {
    pub fn is_set(&self) -> bool {
        self.0
    }

    pub fn clear(&mut self) {
        self.0 = false;
    }
}

pub struct AdminGate {
    secret_hash: String,
}

impl AdminGate {
    /// Hashes the configured secret once so it is not kept in plain text.
    pub fn new(secret: &str) -> AppResult<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let secret_hash = Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
            .to_string();
        Ok(Self { secret_hash })
    }

    /// Compares `candidate` with the configured secret. On a match the flag
    /// is set; on a mismatch nothing changes.
    pub fn check_admin_password(&self, candidate: &str, flag: &mut AdminFlag) -> bool {
        let parsed = match PasswordHash::new(&self.secret_hash) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::error!(error = %err, "stored admin hash is unreadable");
                return false;
            }
        };

        let matched = Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok();
        if matched {
            flag.0 = true;
        } else {
            tracing::warn!("admin password rejected");
        }
        matched
    }
}

/// State owned by one anonymous visitor.
#[derive(Debug)]
pub struct VisitorSession {
    pub uid: Uuid,
    pub cart: Cart,
    pub admin: AdminFlag,
}

impl VisitorSession {
    pub fn new(uid: Uuid) -> Self {
        Self {
            uid,
            cart: Cart::new(),
            admin: AdminFlag::default(),
        }
    }
}

struct SessionEntry {
    expires_at: DateTime<Utc>,
    session: Arc<Mutex<VisitorSession>>,
}

/// Visitor sessions keyed by principal. Each session is behind its own lock,
/// so one visitor's handlers run one at a time. A session lives as long as
/// the token that opened it; expired ones are dropped whenever a new visitor
/// arrives.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_create(&self, principal: &Principal) -> Arc<Mutex<VisitorSession>> {
        let now = Utc::now();
        if let Some(entry) = self.sessions.read().await.get(&principal.uid) {
            if entry.expires_at > now {
                return entry.session.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        if sessions.len() != before {
            tracing::debug!(evicted = before - sessions.len(), "expired visitor sessions dropped");
        }

        sessions
            .entry(principal.uid)
            .or_insert_with(|| SessionEntry {
                expires_at: principal.expires_at,
                session: Arc::new(Mutex::new(VisitorSession::new(principal.uid))),
            })
            .session
            .clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
