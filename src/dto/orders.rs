use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{CustomerInfo, Order, OrderStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub name: String,
    pub phone: String,
    pub address: String,
}

impl From<CheckoutRequest> for CustomerInfo {
    fn from(req: CheckoutRequest) -> Self {
        Self {
            name: req.name,
            phone: req.phone,
            address: req.address,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStatusChanged {
    pub id: Uuid,
    pub status: OrderStatus,
}
