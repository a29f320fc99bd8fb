use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::models::OrderStatus;

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct ProductQuery {
    /// Exact category match, case-insensitive.
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct DeleteProductQuery {
    /// Must be `true`; deletion cannot be undone.
    pub confirm: Option<bool>,
}
