use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{models::Product, services::product_service::ProductForm};

/// Admin product form plus an optional image upload, given as a `data:`
/// URI or bare base64 with `image_mime`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductRequest {
    #[serde(flatten)]
    pub form: ProductForm,
    pub image: Option<String>,
    pub image_mime: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductSaved {
    pub id: Uuid,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
