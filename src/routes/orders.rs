use axum::{
    Json, Router,
    extract::State,
    routing::post,
};

use crate::{
    audit::log_audit,
    dto::orders::CheckoutRequest,
    error::AppResult,
    middleware::auth::SessionUser,
    models::{CustomerInfo, Order},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn route() -> Router<AppState> {
    Router::new().route("/checkout", post(checkout))
}

#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Cash-on-delivery order placed; cart emptied", body = ApiResponse<Order>),
        (status = 400, description = "Empty cart or missing customer details"),
        (status = 502, description = "Store rejected the order; cart kept"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: SessionUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let storefront = &state.ready_state()?.storefront;
    let customer = CustomerInfo::from(payload);

    let order = {
        let mut session = user.session.lock().await;
        storefront
            .order_manager()?
            .place_order(&customer, &mut session.cart)
            .await?
    };

    if let Err(err) = log_audit(
        storefront.client()?,
        Some(user.principal.uid),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": order.total })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success(
        "Checkout success",
        order,
        Some(Meta::empty()),
    )))
}
