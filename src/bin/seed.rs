use std::sync::Arc;

use cod_storefront::{
    config::AppConfig,
    services::product_service::{FormValue, ProductForm, ProductService},
    session::{IdentityService, TokenIdentityService},
    store::{StoreClient, postgres::PgDocumentStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let database_url = config
        .database_url
        .clone()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
    let secret = config
        .session_secret
        .clone()
        .ok_or_else(|| anyhow::anyhow!("SESSION_SECRET is not set"))?;

    let store = Arc::new(PgDocumentStore::connect(&database_url).await?);
    let principal = TokenIdentityService::new(&secret)
        .sign_in_anonymously()
        .await?;
    let client = StoreClient::new(store, principal, &config.store_id);
    let products = ProductService::new(&client);

    let catalog = [
        ("Rose Glow Serum", "Skincare", "Brightening face serum, 30 ml", 850, 25),
        ("Velvet Matte Lipstick", "Makeup", "Long-wear lipstick in deep rose", 450, 60),
        ("Argan Hair Oil", "Haircare", "Cold-pressed argan oil, 50 ml", 600, 40),
        ("Pearl Hair Clips", "Accessories", "Set of six pearl clips", 250, 0),
    ];

    for (name, category, description, price, stock) in catalog {
        let form = ProductForm {
            name: Some(name.into()),
            price: Some(FormValue::Int(price)),
            category: Some(category.into()),
            description: Some(description.into()),
            stock: Some(FormValue::Int(stock)),
        };
        let id = products.submit_product(&form, None, None).await?;
        println!("Seeded {name} ({id})");
    }

    println!("Seed completed for store {}", config.store_id);
    Ok(())
}
