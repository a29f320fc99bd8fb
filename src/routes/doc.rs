use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddToCartRequest, CartView, UpdateQuantityRequest},
        orders::{CheckoutRequest, OrderList, OrderStatusChanged, UpdateOrderStatusRequest},
        products::{ProductList, ProductRequest, ProductSaved},
        session::{AdminLoginRequest, AdminStatus, SessionResponse},
    },
    models::{CartLine, CustomerInfo, Order, OrderItem, OrderStatus, Product},
    response::{ApiResponse, Meta},
    routes::{admin, cart, health, orders, params, products, session},
    services::product_service::{FormValue, ProductForm},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        session::start_session,
        session::admin_login,
        session::admin_logout,
        products::list_products,
        products::get_product,
        cart::cart_view,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        orders::checkout,
        admin::list_all_orders,
        admin::update_order_status,
        admin::create_product,
        admin::update_product,
        admin::delete_product
    ),
    components(
        schemas(
            Product,
            CartLine,
            CustomerInfo,
            Order,
            OrderItem,
            OrderStatus,
            FormValue,
            ProductForm,
            ProductRequest,
            ProductSaved,
            ProductList,
            AddToCartRequest,
            UpdateQuantityRequest,
            CartView,
            CheckoutRequest,
            OrderList,
            OrderStatusChanged,
            UpdateOrderStatusRequest,
            SessionResponse,
            AdminLoginRequest,
            AdminStatus,
            params::ProductQuery,
            params::OrderListQuery,
            params::DeleteProductQuery,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<Order>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Session", description = "Anonymous sessions and dashboard unlock"),
        (name = "Products", description = "Live catalog"),
        (name = "Cart", description = "Per-session cart"),
        (name = "Orders", description = "Cash-on-delivery checkout"),
        (name = "Admin", description = "Dashboard: products and order statuses"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
