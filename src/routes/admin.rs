use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::{
        orders::{OrderList, OrderStatusChanged, UpdateOrderStatusRequest},
        products::{ProductRequest, ProductSaved},
    },
    error::{AppError, AppResult},
    image::{DownscaledImage, decode_upload},
    middleware::auth::{SessionUser, ensure_admin},
    response::{ApiResponse, Meta},
    routes::params::{DeleteProductQuery, OrderListQuery},
    services::{order_service::dashboard_orders, product_service::find_product},
    state::AppState,
    storefront::Storefront,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/products", post(create_product))
        .route("/products/{id}", put(update_product).delete(delete_product))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "All orders, newest first", body = ApiResponse<OrderList>),
        (status = 403, description = "Dashboard locked"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: SessionUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    ensure_admin(&user).await?;
    let view = state.ready_state()?.storefront.orders.current();

    let items = dashboard_orders(&view.items, query.status);
    let meta = Meta::view(items.len() as i64, view.loading, view.last_error.clone());
    Ok(Json(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status written; visible with the next snapshot", body = ApiResponse<OrderStatusChanged>),
        (status = 403, description = "Dashboard locked"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderStatusChanged>>> {
    ensure_admin(&user).await?;
    let storefront = &state.ready_state()?.storefront;
    storefront
        .order_manager()?
        .update_order_status(id, payload.status)
        .await?;

    audit(
        storefront,
        &user,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": id, "status": payload.status }),
    )
    .await;

    Ok(Json(ApiResponse::success(
        "Order updated",
        OrderStatusChanged {
            id,
            status: payload.status,
        },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product created", body = ApiResponse<ProductSaved>),
        (status = 400, description = "Invalid form"),
        (status = 403, description = "Dashboard locked"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: SessionUser,
    Json(payload): Json<ProductRequest>,
) -> AppResult<Json<ApiResponse<ProductSaved>>> {
    ensure_admin(&user).await?;
    let storefront = &state.ready_state()?.storefront;
    let image = attach_image(storefront, &payload)?;

    let id = storefront
        .products()?
        .submit_product(&payload.form, image, None)
        .await?;

    audit(storefront, &user, "product_create", "products", serde_json::json!({ "product_id": id })).await;

    Ok(Json(ApiResponse::success(
        "Product created",
        ProductSaved { id },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductSaved>),
        (status = 400, description = "Invalid form"),
        (status = 403, description = "Dashboard locked"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductRequest>,
) -> AppResult<Json<ApiResponse<ProductSaved>>> {
    ensure_admin(&user).await?;
    let storefront = &state.ready_state()?.storefront;
    let catalog = storefront.catalog.items();
    let existing = find_product(&catalog, id).ok_or(AppError::NotFound)?;
    let image = attach_image(storefront, &payload)?;

    storefront
        .products()?
        .submit_product(&payload.form, image, Some(existing))
        .await?;

    audit(storefront, &user, "product_update", "products", serde_json::json!({ "product_id": id })).await;

    Ok(Json(ApiResponse::success(
        "Updated",
        ProductSaved { id },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        DeleteProductQuery
    ),
    responses(
        (status = 200, description = "Deleted product"),
        (status = 400, description = "Deletion not confirmed"),
        (status = 403, description = "Dashboard locked"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteProductQuery>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user).await?;
    let storefront = &state.ready_state()?.storefront;
    storefront
        .products()?
        .delete_product(id, query.confirm.unwrap_or(false))
        .await?;

    audit(storefront, &user, "product_delete", "products", serde_json::json!({ "product_id": id })).await;

    Ok(Json(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

fn attach_image(
    storefront: &Storefront,
    payload: &ProductRequest,
) -> AppResult<Option<DownscaledImage>> {
    let Some(upload) = payload.image.as_deref().filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    let (raw, mime) = decode_upload(upload, payload.image_mime.as_deref())?;
    let image = storefront
        .downscaler
        .downscale(&raw, &mime, &storefront.downscale_options)?;
    Ok(Some(image))
}

async fn audit(
    storefront: &Storefront,
    user: &SessionUser,
    action: &str,
    resource: &str,
    metadata: serde_json::Value,
) {
    let Ok(client) = storefront.client() else {
        return;
    };
    if let Err(err) = log_audit(
        client,
        Some(user.principal.uid),
        action,
        Some(resource),
        Some(metadata),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}
