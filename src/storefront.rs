//! The store-facing half of the application, wired once at start-up.

use std::sync::Arc;

use crate::{
    collection::CollectionView,
    error::{AppError, AppResult},
    image::{DownscaleOptions, ImageDownscaler, InlineImageEncoder},
    models::{Order, Product},
    services::{order_service::OrderService, product_service::ProductService},
    session::IdentityService,
    store::{DocumentStore, ORDERS, PRODUCTS, StoreClient},
};

/// Live catalog and order views plus the managers that write to them.
///
/// Writes are acknowledged by the store before the views change; the change
/// itself only shows up with the next snapshot.
pub struct Storefront {
    client: Option<StoreClient>,
    identity_error: Option<String>,
    pub catalog: CollectionView<Product>,
    pub orders: CollectionView<Order>,
    pub downscaler: Arc<dyn ImageDownscaler>,
    /// Passed to `downscaler` on every upload. The default
    /// [`InlineImageEncoder`] ignores it; install a resampling downscaler
    /// with [`Storefront::with_downscaler`] for it to take effect.
    pub downscale_options: DownscaleOptions,
}

impl Storefront {
    /// Acquires the store identity, then opens the live subscriptions. When
    /// sign-in fails no subscription is opened and every write is refused.
    pub async fn bootstrap(
        store: Arc<dyn DocumentStore>,
        identity: &dyn IdentityService,
        store_id: &str,
    ) -> Self {
        match identity.sign_in_anonymously().await {
            Ok(principal) => {
                tracing::info!(uid = %principal.uid, store_id, "store identity acquired");
                Self::with_client(StoreClient::new(store, principal, store_id))
            }
            Err(err) => {
                tracing::error!(error = %err, "identity bootstrap failed; subscriptions withheld");
                Self::without_identity(err.to_string())
            }
        }
    }

    pub fn with_client(client: StoreClient) -> Self {
        let catalog = CollectionView::open("products", client.clone(), PRODUCTS);
        let orders = CollectionView::open("orders", client.clone(), ORDERS);
        Self {
            client: Some(client),
            identity_error: None,
            catalog,
            orders,
            downscaler: Arc::new(InlineImageEncoder),
            downscale_options: DownscaleOptions::default(),
        }
    }

    pub fn without_identity(reason: String) -> Self {
        Self {
            client: None,
            identity_error: Some(reason),
            catalog: CollectionView::detached(),
            orders: CollectionView::detached(),
            downscaler: Arc::new(InlineImageEncoder),
            downscale_options: DownscaleOptions::default(),
        }
    }

    pub fn with_downscaler(mut self, downscaler: Arc<dyn ImageDownscaler>) -> Self {
        self.downscaler = downscaler;
        self
    }

    pub fn client(&self) -> AppResult<&StoreClient> {
        self.client.as_ref().ok_or_else(|| {
            AppError::Auth(
                self.identity_error
                    .clone()
                    .unwrap_or_else(|| "no store identity".into()),
            )
        })
    }

    pub fn products(&self) -> AppResult<ProductService<'_>> {
        Ok(ProductService::new(self.client()?))
    }

    pub fn order_manager(&self) -> AppResult<OrderService<'_>> {
        Ok(OrderService::new(self.client()?))
    }
}
