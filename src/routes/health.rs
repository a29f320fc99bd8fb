use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    response::{ApiResponse, Meta},
    state::{AppContext, AppState},
};

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
    /// Settings that must be provided before the store can be used.
    pub missing_config: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
        tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthData>> {
    let data = match state.context.as_ref() {
        AppContext::Ready(_) => HealthData {
            status: "ok".to_string(),
            missing_config: Vec::new(),
        },
        AppContext::Unconfigured { missing } => HealthData {
            status: "configuration_required".to_string(),
            missing_config: missing.iter().map(|key| key.to_string()).collect(),
        },
    };

    Json(ApiResponse::success(
        "Health check",
        data,
        Some(Meta::empty()),
    ))
}
