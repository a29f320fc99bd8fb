use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub uid: Uuid,
    pub token: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct AdminLoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStatus {
    pub admin: bool,
}
