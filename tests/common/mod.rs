#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use cod_storefront::{
    collection::{CollectionView, ViewState},
    models::Product,
    services::product_service::{FormValue, ProductForm},
    session::{IdentityService, TokenIdentityService},
    store::{StoreClient, memory::MemoryStore},
    storefront::Storefront,
};
use uuid::Uuid;

pub const STORE_ID: &str = "test_store";
pub const SESSION_SECRET: &str = "test-session-secret";
pub const ADMIN_PASSWORD: &str = "husna-admin";

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub client: StoreClient,
    pub storefront: Storefront,
}

pub async fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let principal = TokenIdentityService::new(SESSION_SECRET)
        .sign_in_anonymously()
        .await
        .expect("anonymous sign-in");
    let client = StoreClient::new(store.clone(), principal, STORE_ID);
    let storefront = Storefront::with_client(client.clone());
    Harness {
        store,
        client,
        storefront,
    }
}

/// Waits (bounded) for a view to reach a state.
pub async fn settle<T>(
    view: &CollectionView<T>,
    predicate: impl FnMut(&ViewState<T>) -> bool,
) -> Arc<ViewState<T>>
where
    T: cod_storefront::collection::FromDocument + Send + Sync + 'static,
{
    tokio::time::timeout(Duration::from_secs(5), view.wait_for(predicate))
        .await
        .expect("view did not settle in time")
        .expect("view stopped")
}

pub fn form(name: &str, price: i64, category: &str, stock: i64) -> ProductForm {
    ProductForm {
        name: Some(name.to_string()),
        price: Some(FormValue::Int(price)),
        category: Some(category.to_string()),
        description: Some(format!("{name} description")),
        stock: Some(FormValue::Int(stock)),
    }
}

pub fn product(name: &str, price: i64, stock: i32) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        price,
        category: "Skincare".to_string(),
        description: String::new(),
        image: format!("https://img.example/{name}.jpg"),
        stock,
        created_at: None,
        updated_at: None,
    }
}
