use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartView, UpdateQuantityRequest},
    error::{AppError, AppResult},
    middleware::auth::SessionUser,
    response::{ApiResponse, Meta},
    services::product_service::find_product,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_view).post(add_to_cart))
        .route("/{product_id}", patch(update_quantity).delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart of the current session", body = ApiResponse<CartView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_view(user: SessionUser) -> AppResult<Json<ApiResponse<CartView>>> {
    let session = user.session.lock().await;
    let view = CartView::from(&session.cart);
    let meta = Meta::new(view.badge_count as i64);
    Ok(Json(ApiResponse::success("OK", view, Some(meta))))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Product added", body = ApiResponse<CartView>),
        (status = 400, description = "Out of stock"),
        (status = 404, description = "Product not in catalog"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: SessionUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let catalog = state.ready_state()?.storefront.catalog.items();
    let product = find_product(&catalog, payload.product_id).ok_or(AppError::NotFound)?;

    let mut session = user.session.lock().await;
    session.cart.add_to_cart(product)?;

    let view = CartView::from(&session.cart);
    let meta = Meta::new(view.badge_count as i64);
    Ok(Json(ApiResponse::success("Added to cart", view, Some(meta))))
}

#[utoipa::path(
    patch,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity changed, never below 1", body = ApiResponse<CartView>),
        (status = 404, description = "Product not in cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_quantity(
    user: SessionUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let mut session = user.session.lock().await;
    session.cart.update_quantity(product_id, payload.delta)?;

    let view = CartView::from(&session.cart);
    let meta = Meta::new(view.badge_count as i64);
    Ok(Json(ApiResponse::success("Updated", view, Some(meta))))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Line removed", body = ApiResponse<CartView>),
        (status = 404, description = "Product not in cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    user: SessionUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let mut session = user.session.lock().await;
    if !session.cart.remove_from_cart(product_id) {
        return Err(AppError::NotFound);
    }

    let view = CartView::from(&session.cart);
    let meta = Meta::new(view.badge_count as i64);
    Ok(Json(ApiResponse::success("Removed from cart", view, Some(meta))))
}
