use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::products::ProductList,
    error::{AppError, AppResult},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    services::product_service::find_product,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/{id}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Current catalog snapshot", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let view = state.ready_state()?.storefront.catalog.current();

    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let items: Vec<Product> = view
        .items
        .iter()
        .filter(|p| category.is_none_or(|c| p.category.eq_ignore_ascii_case(c)))
        .cloned()
        .collect();

    let meta = Meta::view(items.len() as i64, view.loading, view.last_error.clone());
    Ok(Json(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let catalog = state.ready_state()?.storefront.catalog.items();
    let product = find_product(&catalog, id).cloned().ok_or(AppError::NotFound)?;
    Ok(Json(ApiResponse::success("Product", product, None)))
}
