mod common;

use cod_storefront::{
    error::AppError,
    image::{
        DownscaleOptions, DownscaledImage, ImageDownscaler, InlineImageEncoder,
        MAX_INLINE_IMAGE_BYTES, PLACEHOLDER_IMAGE, decode_upload,
    },
    services::product_service::{FormValue, MAX_PRICE, ProductForm},
    store::PRODUCTS,
};
use common::{form, harness, settle};
use serde_json::json;

fn assert_invalid(form: &ProductForm, needle: &str) {
    match form.validate() {
        Err(AppError::Validation(message)) => {
            assert!(message.contains(needle), "{message:?} lacks {needle:?}")
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn form_requires_name_category_price_and_stock() {
    let complete = form("Serum", 850, "Skincare", 3);

    assert_invalid(&ProductForm { name: None, ..complete.clone() }, "name");
    assert_invalid(&ProductForm { name: Some("  ".into()), ..complete.clone() }, "name");
    assert_invalid(&ProductForm { category: None, ..complete.clone() }, "category");
    assert_invalid(&ProductForm { price: None, ..complete.clone() }, "price");
    assert_invalid(&ProductForm { stock: Some(FormValue::Text(" ".into())), ..complete.clone() }, "stock");

    let ok = ProductForm { description: None, ..complete }.validate().expect("valid");
    assert_eq!(ok.description, None);
}

#[test]
fn numbers_must_be_whole_and_non_negative() {
    let complete = form("Serum", 850, "Skincare", 3);

    assert_invalid(&ProductForm { price: Some(FormValue::Int(-1)), ..complete.clone() }, "negative");
    assert_invalid(&ProductForm { stock: Some(FormValue::Text("-4".into())), ..complete.clone() }, "negative");
    assert_invalid(&ProductForm { price: Some(FormValue::Text("cheap".into())), ..complete.clone() }, "whole number");
    assert_invalid(&ProductForm { price: Some(FormValue::Float(9.5)), ..complete.clone() }, "whole number");
    assert_invalid(&ProductForm { stock: Some(FormValue::Int(i64::from(i32::MAX) + 1)), ..complete.clone() }, "too large");

    assert_invalid(&ProductForm { price: Some(FormValue::Int(MAX_PRICE + 1)), ..complete.clone() }, "exceed");
    assert_invalid(&ProductForm { price: Some(FormValue::Int(i64::MAX)), ..complete.clone() }, "exceed");
    assert_eq!(
        ProductForm { price: Some(FormValue::Int(MAX_PRICE)), ..complete.clone() }
            .validate()
            .expect("valid")
            .price,
        MAX_PRICE
    );

    let parsed = ProductForm {
        price: Some(FormValue::Text(" 1200 ".into())),
        stock: Some(FormValue::Float(7.0)),
        ..complete
    }
    .validate()
    .expect("valid");
    assert_eq!(parsed.price, 1200);
    assert_eq!(parsed.stock, 7);
}

#[test]
fn form_accepts_json_numbers_and_strings() {
    let form: ProductForm = serde_json::from_value(json!({
        "name": "Clips",
        "price": "250",
        "category": "Accessories",
        "stock": 0
    }))
    .expect("deserializes");
    let product = form.validate().expect("valid");
    assert_eq!(product.price, 250);
    assert_eq!(product.stock, 0);
}

#[tokio::test]
async fn new_product_without_image_gets_placeholder() -> anyhow::Result<()> {
    let h = harness().await;
    let id = h
        .storefront
        .products()?
        .submit_product(&form("Clips", 250, "Accessories", 0), None, None)
        .await?;

    let catalog = settle(&h.storefront.catalog, |s| s.items.len() == 1).await;
    let product = &catalog.items[0];
    assert_eq!(product.id, id);
    assert_eq!(product.image, PLACEHOLDER_IMAGE);
    assert!(!product.is_available());
    Ok(())
}

#[tokio::test]
async fn edit_keeps_current_image_unless_a_new_one_is_attached() -> anyhow::Result<()> {
    let h = harness().await;
    let products = h.storefront.products()?;
    let first = DownscaledImage::from_uri("https://img.example/first.jpg".into());
    products
        .submit_product(&form("Oil", 450, "Hair", 2), Some(first), None)
        .await?;
    let catalog = settle(&h.storefront.catalog, |s| s.items.len() == 1).await;
    let existing = catalog.items[0].clone();
    assert_eq!(existing.image, "https://img.example/first.jpg");

    products
        .submit_product(&form("Oil", 500, "Hair", 2), None, Some(&existing))
        .await?;
    let catalog = settle(&h.storefront.catalog, |s| s.items[0].price == 500).await;
    assert_eq!(catalog.items[0].image, "https://img.example/first.jpg");

    let second = DownscaledImage::from_uri("https://img.example/second.jpg".into());
    let existing = catalog.items[0].clone();
    products
        .submit_product(&form("Oil", 500, "Hair", 2), Some(second), Some(&existing))
        .await?;
    let catalog = settle(&h.storefront.catalog, |s| {
        s.items[0].image == "https://img.example/second.jpg"
    })
    .await;
    assert_eq!(catalog.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn edit_preserves_fields_outside_the_form() -> anyhow::Result<()> {
    let h = harness().await;
    let id = h
        .client
        .create(
            PRODUCTS,
            json!({ "name": "Lipstick", "price": 600, "category": "Makeup", "stock": 8, "featured": true }),
        )
        .await?;
    let catalog = settle(&h.storefront.catalog, |s| s.items.len() == 1).await;
    let existing = catalog.items[0].clone();

    let saved = h
        .storefront
        .products()?
        .submit_product(&form("Lipstick", 650, "Makeup", 8), None, Some(&existing))
        .await?;
    assert_eq!(saved, id);

    let docs = h.store.documents(&h.client.path(PRODUCTS)).await;
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].data["featured"], json!(true));
    assert_eq!(docs[0].data["price"], json!(650));
    assert_eq!(docs[0].created_at, existing.created_at);
    assert!(docs[0].updated_at >= existing.updated_at);
    Ok(())
}

#[tokio::test]
async fn edit_without_description_keeps_the_stored_one() -> anyhow::Result<()> {
    let h = harness().await;
    h.client
        .create(
            PRODUCTS,
            json!({ "name": "Lipstick", "price": 600, "category": "Makeup", "description": "keep me", "stock": 8 }),
        )
        .await?;
    let catalog = settle(&h.storefront.catalog, |s| s.items.len() == 1).await;
    let existing = catalog.items[0].clone();

    let products = h.storefront.products()?;
    let without = ProductForm {
        description: None,
        ..form("Lipstick", 700, "Makeup", 8)
    };
    products.submit_product(&without, None, Some(&existing)).await?;

    let docs = h.store.documents(&h.client.path(PRODUCTS)).await;
    assert_eq!(docs[0].data["description"], json!("keep me"));
    assert_eq!(docs[0].data["price"], json!(700));

    let cleared = ProductForm {
        description: Some("  ".into()),
        ..form("Lipstick", 700, "Makeup", 8)
    };
    products.submit_product(&cleared, None, Some(&existing)).await?;
    let docs = h.store.documents(&h.client.path(PRODUCTS)).await;
    assert_eq!(docs[0].data["description"], json!(""));

    let created = products
        .submit_product(&ProductForm { description: None, ..form("Oil", 450, "Hair", 2) }, None, None)
        .await?;
    let docs = h.store.documents(&h.client.path(PRODUCTS)).await;
    let doc = docs.iter().find(|d| d.id == created).expect("created");
    assert_eq!(doc.data["description"], json!(""));
    Ok(())
}

#[tokio::test]
async fn invalid_form_writes_nothing() -> anyhow::Result<()> {
    let h = harness().await;
    let err = h
        .storefront
        .products()?
        .submit_product(&form("Serum", -5, "Skincare", 1), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(h.store.documents(&h.client.path(PRODUCTS)).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn delete_requires_confirmation() -> anyhow::Result<()> {
    let h = harness().await;
    let products = h.storefront.products()?;
    let id = products.submit_product(&form("Serum", 850, "Skincare", 3), None, None).await?;

    let err = products.delete_product(id, false).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.store.documents(&h.client.path(PRODUCTS)).await.len(), 1);

    products.delete_product(id, true).await?;
    assert!(h.store.documents(&h.client.path(PRODUCTS)).await.is_empty());

    let err = products.delete_product(id, true).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[test]
fn inline_encoder_produces_data_uri() {
    let options = DownscaleOptions::default();
    assert_eq!(options.max_width, 800);
    assert_eq!(options.output_mime, "image/jpeg");

    let image = InlineImageEncoder
        .downscale(b"\xff\xd8\xff\xe0jpeg", "image/jpeg", &options)
        .expect("encodes");
    assert_eq!(image.as_uri(), "data:image/jpeg;base64,/9j/4GpwZWc=");
}

#[test]
fn inline_encoder_rejects_bad_input() {
    let options = DownscaleOptions::default();
    let encoder = InlineImageEncoder;

    assert!(encoder.downscale(b"%PDF", "application/pdf", &options).is_err());
    assert!(encoder.downscale(b"", "image/png", &options).is_err());

    let huge = vec![0u8; MAX_INLINE_IMAGE_BYTES];
    match encoder.downscale(&huge, "image/png", &options) {
        Err(AppError::Validation(message)) => assert!(message.contains("too large")),
        other => panic!("expected size rejection, got {other:?}"),
    }
}

#[test]
fn uploads_decode_from_data_uri_or_bare_base64() {
    let (raw, mime) = decode_upload("data:image/png;base64,aGk=", None).expect("data uri");
    assert_eq!(raw, b"hi");
    assert_eq!(mime, "image/png");

    let (raw, mime) = decode_upload("aGk=", Some("image/webp")).expect("bare base64");
    assert_eq!(raw, b"hi");
    assert_eq!(mime, "image/webp");

    let (_, mime) = decode_upload("aGk=", None).expect("default mime");
    assert_eq!(mime, "image/jpeg");

    assert!(decode_upload("data:image/png;base64", None).is_err());
    assert!(decode_upload("***", None).is_err());
}

struct WidthStamp;

impl ImageDownscaler for WidthStamp {
    fn downscale(
        &self,
        raw: &[u8],
        _mime: &str,
        options: &DownscaleOptions,
    ) -> cod_storefront::error::AppResult<DownscaledImage> {
        Ok(DownscaledImage::from_uri(format!(
            "https://img.example/{}w/{}/{}",
            options.max_width,
            options.output_mime,
            raw.len()
        )))
    }
}

#[tokio::test]
async fn installed_downscaler_receives_the_options() -> anyhow::Result<()> {
    let h = harness().await;
    let storefront = cod_storefront::storefront::Storefront::with_client(h.client.clone())
        .with_downscaler(std::sync::Arc::new(WidthStamp));

    let image = storefront
        .downscaler
        .downscale(b"raw-bytes", "image/png", &storefront.downscale_options)?;
    assert_eq!(image.as_uri(), "https://img.example/800w/image/jpeg/9");

    storefront
        .products()?
        .submit_product(&form("Oil", 450, "Hair", 2), Some(image), None)
        .await?;
    let catalog = settle(&storefront.catalog, |s| s.items.len() == 1).await;
    assert_eq!(catalog.items[0].image, "https://img.example/800w/image/jpeg/9");
    Ok(())
}

#[test]
fn inline_encoder_keeps_the_upload_format() {
    let options = DownscaleOptions {
        max_width: 10,
        quality: 0.1,
        output_mime: "image/jpeg",
    };
    let image = InlineImageEncoder
        .downscale(b"hi", "image/png", &options)
        .expect("encodes");
    assert_eq!(image.as_uri(), "data:image/png;base64,aGk=");
}
