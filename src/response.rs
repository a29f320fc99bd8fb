use serde::Serialize;
use utoipa::ToSchema;

/// Envelope metadata. Collections are never paginated, so `total` is the
/// only counter; `loading` and `stale` describe the live view a list came from.
#[derive(Debug, Serialize, ToSchema, Clone, Default)]
pub struct Meta {
    pub total: Option<i64>,
    pub loading: Option<bool>,
    pub stale: Option<String>,
}

impl Meta {
    pub fn new(total: i64) -> Self {
        Self {
            total: Some(total),
            ..Self::empty()
        }
    }

    pub fn empty() -> Self {
        Self {
            total: None,
            loading: None,
            stale: None,
        }
    }

    pub fn view(total: i64, loading: bool, stale: Option<String>) -> Self {
        Self {
            total: Some(total),
            loading: Some(loading),
            stale,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}
