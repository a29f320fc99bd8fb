use std::cmp::Ordering;

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    cart::Cart,
    collection::FromDocument,
    error::{AppError, AppResult},
    models::{CustomerInfo, Order, OrderItem, OrderStatus},
    store::{Document, ORDERS, StoreClient},
};

#[derive(Debug, Deserialize)]
struct OrderFields {
    customer: CustomerInfo,
    items: Vec<OrderItem>,
    total: i64,
    #[serde(default)]
    status: OrderStatus,
}

impl FromDocument for Order {
    fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        let fields: OrderFields = serde_json::from_value(doc.data.clone())?;
        Ok(Order {
            id: doc.id,
            customer: fields.customer,
            items: fields.items,
            total: fields.total,
            status: fields.status,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

impl CustomerInfo {
    pub fn validate(&self) -> AppResult<CustomerInfo> {
        let field = |name: &str, value: &str| {
            let value = value.trim();
            if value.is_empty() {
                Err(AppError::Validation(format!("{name} is required")))
            } else {
                Ok(value.to_string())
            }
        };

        Ok(CustomerInfo {
            name: field("name", &self.name)?,
            phone: field("phone", &self.phone)?,
            address: field("address", &self.address)?,
        })
    }
}

/// Checkout and admin status changes.
pub struct OrderService<'a> {
    client: &'a StoreClient,
}

impl<'a> OrderService<'a> {
    pub fn new(client: &'a StoreClient) -> Self {
        Self { client }
    }

    /// Persists the cart as a new `Pending` order and empties the cart.
    ///
    /// Items and total are copied out of the cart at this moment; the stored
    /// order never looks at the catalog again. On any failure the cart is
    /// left as it was.
    pub async fn place_order(&self, customer: &CustomerInfo, cart: &mut Cart) -> AppResult<Order> {
        if cart.is_empty() {
            return Err(AppError::Validation("cart is empty".into()));
        }
        let customer = customer.validate()?;

        let items: Vec<OrderItem> = cart.lines().iter().map(OrderItem::from).collect();
        let total = cart.compute_total();
        let status = OrderStatus::Pending;

        let data = json!({
            "customer": customer,
            "items": items,
            "total": total,
            "status": status,
        });
        let id = self.client.create(ORDERS, data).await?;
        cart.clear();

        tracing::info!(order_id = %id, total, items = items.len(), "order placed");
        Ok(Order {
            id,
            customer,
            items,
            total,
            status,
            created_at: None,
            updated_at: None,
        })
    }

    /// Sets the status of an order. Any status may follow any other; there
    /// is no transition table.
    pub async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> AppResult<()> {
        self.client
            .update(ORDERS, id, json!({ "status": status }))
            .await?;
        tracing::info!(order_id = %id, %status, "order status updated");
        Ok(())
    }
}

/// Newest first by creation time. Orders the store has not stamped yet sort
/// as oldest; equal timestamps fall back to id order.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| match b.created_at.cmp(&a.created_at) {
        Ordering::Equal => a.id.cmp(&b.id),
        other => other,
    });
}

/// Orders for the admin list, optionally narrowed to one status.
pub fn dashboard_orders(orders: &[Order], status: Option<OrderStatus>) -> Vec<Order> {
    let mut list: Vec<Order> = orders
        .iter()
        .filter(|order| status.is_none_or(|s| order.status == s))
        .cloned()
        .collect();
    sort_newest_first(&mut list);
    list
}
