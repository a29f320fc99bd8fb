mod common;

use std::sync::Arc;

use cod_storefront::{
    collection::{CollectionView, FromDocument, ViewState},
    models::Product,
    store::{Document, PRODUCTS, SnapshotEvent},
    storefront::Storefront,
};
use common::{form, harness, settle};
use serde_json::json;
use uuid::Uuid;

fn doc(data: serde_json::Value) -> Document {
    Document {
        id: Uuid::new_v4(),
        data,
        updated_by: None,
        created_at: None,
        updated_at: None,
    }
}

#[tokio::test]
async fn views_start_loading_and_fill_on_first_snapshot() -> anyhow::Result<()> {
    let h = harness().await;
    let catalog = settle(&h.storefront.catalog, |s| !s.loading).await;
    assert!(catalog.items.is_empty());
    assert!(catalog.last_error.is_none());

    h.storefront
        .products()?
        .submit_product(&form("Serum", 850, "Skincare", 3), None, None)
        .await?;
    let catalog = settle(&h.storefront.catalog, |s| s.items.len() == 1).await;
    assert_eq!(catalog.items[0].name, "Serum");
    Ok(())
}

#[tokio::test]
async fn snapshot_replaces_the_whole_list() -> anyhow::Result<()> {
    let h = harness().await;
    let products = h.storefront.products()?;
    let a = products.submit_product(&form("A", 100, "Skincare", 1), None, None).await?;
    products.submit_product(&form("B", 200, "Makeup", 1), None, None).await?;
    settle(&h.storefront.catalog, |s| s.items.len() == 2).await;

    products.delete_product(a, true).await?;
    let catalog = settle(&h.storefront.catalog, |s| s.items.len() == 1).await;
    assert_eq!(catalog.items[0].name, "B");
    Ok(())
}

#[tokio::test]
async fn read_error_keeps_items_and_is_recorded() -> anyhow::Result<()> {
    let h = harness().await;
    h.storefront
        .products()?
        .submit_product(&form("A", 100, "Skincare", 1), None, None)
        .await?;
    settle(&h.storefront.catalog, |s| s.items.len() == 1).await;

    h.store
        .emit_read_error(&h.client.path(PRODUCTS), "permission denied")
        .await;
    let catalog = settle(&h.storefront.catalog, |s| s.last_error.is_some()).await;
    assert_eq!(catalog.items.len(), 1);
    assert_eq!(catalog.last_error.as_deref(), Some("permission denied"));
    assert!(!catalog.loading);

    h.storefront
        .products()?
        .submit_product(&form("B", 200, "Skincare", 1), None, None)
        .await?;
    let catalog = settle(&h.storefront.catalog, |s| s.items.len() == 2).await;
    assert!(catalog.last_error.is_none());
    Ok(())
}

#[tokio::test]
async fn view_without_identity_stays_empty_and_refuses_writes() {
    let storefront = Storefront::without_identity("sign-in unavailable".into());

    let catalog = storefront.catalog.current();
    assert!(catalog.loading);
    assert!(catalog.items.is_empty());
    assert!(storefront.orders.current().loading);

    let err = storefront.products().err().expect("no client");
    assert_eq!(err.to_string(), "Identity unavailable: sign-in unavailable");
}

#[test]
fn undecodable_documents_are_skipped() {
    let good = doc(json!({ "name": "Oil", "price": 450, "stock": 2 }));
    let bad = doc(json!({ "name": "Broken", "price": "not a number" }));
    let event = SnapshotEvent::Snapshot(Arc::new(vec![good.clone(), bad]));

    let state = ViewState::<Product>::loading().apply(&event);
    assert!(!state.loading);
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].id, good.id);
    assert_eq!(state.items[0].category, "");
}

#[test]
fn missing_product_fields_take_defaults() {
    let d = doc(json!({}));
    let product = Product::from_document(&d).expect("decodes");
    assert_eq!(product.price, 0);
    assert_eq!(product.stock, 0);
    assert!(!product.is_available());
}

#[tokio::test]
async fn spawned_view_follows_a_raw_subscription() -> anyhow::Result<()> {
    let h = harness().await;
    let subscription = h.client.subscribe(PRODUCTS).await?;
    let view: CollectionView<Product> = CollectionView::spawn("products", subscription);

    h.client
        .create(PRODUCTS, json!({ "name": "Lipstick", "price": 600, "stock": 8 }))
        .await?;
    let state = settle(&view, |s| s.items.len() == 1).await;
    assert_eq!(state.items[0].price, 600);
    Ok(())
}
