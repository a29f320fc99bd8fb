use axum::{
    Json, Router,
    extract::State,
    routing::post,
};

use crate::{
    dto::session::{AdminLoginRequest, AdminStatus, SessionResponse},
    error::{AppError, AppResult},
    middleware::auth::SessionUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(start_session))
        .route("/admin", post(admin_login).delete(admin_logout))
}

#[utoipa::path(
    post,
    path = "/api/session",
    responses(
        (status = 200, description = "Anonymous session started", body = ApiResponse<SessionResponse>),
        (status = 503, description = "Configuration missing"),
    ),
    tag = "Session"
)]
pub async fn start_session(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<SessionResponse>>> {
    let ready = state.ready_state()?;
    let principal = ready.identity.sign_in_anonymously().await?;
    ready.sessions.get_or_create(&principal).await;

    Ok(Json(ApiResponse::success(
        "Session started",
        SessionResponse {
            uid: principal.uid,
            token: format!("Bearer {}", principal.token),
        },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/session/admin",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Dashboard unlocked", body = ApiResponse<AdminStatus>),
        (status = 401, description = "Wrong password"),
    ),
    security(("bearer_auth" = [])),
    tag = "Session"
)]
pub async fn admin_login(
    State(state): State<AppState>,
    user: SessionUser,
    Json(payload): Json<AdminLoginRequest>,
) -> AppResult<Json<ApiResponse<AdminStatus>>> {
    let ready = state.ready_state()?;
    let mut session = user.session.lock().await;

    if !ready
        .admin_gate
        .check_admin_password(&payload.password, &mut session.admin)
    {
        return Err(AppError::AdminAuth);
    }

    tracing::info!(uid = %user.principal.uid, "dashboard unlocked");
    Ok(Json(ApiResponse::success(
        "Dashboard unlocked",
        AdminStatus { admin: true },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/session/admin",
    responses(
        (status = 200, description = "Dashboard locked", body = ApiResponse<AdminStatus>),
    ),
    security(("bearer_auth" = [])),
    tag = "Session"
)]
pub async fn admin_logout(user: SessionUser) -> AppResult<Json<ApiResponse<AdminStatus>>> {
    user.session.lock().await.admin.clear();
    Ok(Json(ApiResponse::success(
        "Dashboard locked",
        AdminStatus { admin: false },
        Some(Meta::empty()),
    )))
}
