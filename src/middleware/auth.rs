use std::sync::Arc;

use axum::{extract::FromRequestParts, http::header};
use tokio::sync::Mutex;

use crate::{
    error::AppError,
    session::{Principal, VisitorSession},
    state::AppState,
};

/// The anonymous visitor behind a request, with their session state.
#[derive(Clone)]
pub struct SessionUser {
    pub principal: Principal,
    pub session: Arc<Mutex<VisitorSession>>,
}

/// Dashboard access is a per-session flag set by the shared-secret check.
pub async fn ensure_admin(user: &SessionUser) -> Result<(), AppError> {
    if !user.session.lock().await.admin.is_set() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ready = state.ready_state()?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Auth("missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Auth("invalid Authorization header".into()))?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::Auth("invalid Authorization scheme".into()));
        }

        let principal = ready.identity.verify(auth_str)?;
        let session = ready.sessions.get_or_create(&principal).await;

        Ok(SessionUser { principal, session })
    }
}
