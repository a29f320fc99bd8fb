mod common;

use std::{sync::Arc, time::Duration};

use cod_storefront::{
    cart::Cart,
    models::{CustomerInfo, OrderStatus},
    session::{IdentityService, TokenIdentityService},
    store::{StoreClient, postgres::PgDocumentStore},
    storefront::Storefront,
};
use common::{SESSION_SECRET, form};
use uuid::Uuid;

// Round trip through Postgres: writes come back to the views via LISTEN/NOTIFY.
#[tokio::test]
async fn postgres_store_feeds_live_views() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run Postgres store tests.");
            return Ok(());
        }
    };

    let store = Arc::new(PgDocumentStore::connect(&database_url).await?);
    let principal = TokenIdentityService::new(SESSION_SECRET)
        .sign_in_anonymously()
        .await?;
    // A fresh store id per run keeps runs apart on a shared database.
    let store_id = format!("test_{}", Uuid::new_v4().simple());
    let storefront = Storefront::with_client(StoreClient::new(store, principal, &store_id));

    let id = storefront
        .products()?
        .submit_product(&form("Argan Oil", 600, "Haircare", 3), None, None)
        .await?;
    let catalog = tokio::time::timeout(
        Duration::from_secs(10),
        storefront.catalog.wait_for(|s| s.items.len() == 1),
    )
    .await?
    .expect("catalog alive");
    assert_eq!(catalog.items[0].id, id);
    assert!(catalog.items[0].created_at.is_some());

    let mut cart = Cart::new();
    cart.add_to_cart(&catalog.items[0])?;
    let customer = CustomerInfo {
        name: "Husna".into(),
        phone: "0700000000".into(),
        address: "Kabul".into(),
    };
    let order = storefront.order_manager()?.place_order(&customer, &mut cart).await?;
    storefront
        .order_manager()?
        .update_order_status(order.id, OrderStatus::Processing)
        .await?;

    let orders = tokio::time::timeout(
        Duration::from_secs(10),
        storefront.orders.wait_for(|s| {
            s.items
                .first()
                .is_some_and(|o| o.status == OrderStatus::Processing)
        }),
    )
    .await?
    .expect("orders alive");
    assert_eq!(orders.items[0].total, 600);

    storefront.products()?.delete_product(id, true).await?;
    tokio::time::timeout(
        Duration::from_secs(10),
        storefront.catalog.wait_for(|s| s.items.is_empty()),
    )
    .await?;

    Ok(())
}
