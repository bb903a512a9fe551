use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::warn;

use crate::cart::CartStore;
use crate::catalog::CatalogStore;
use crate::checkout::CheckoutService;
use crate::config::Config;
use crate::entities::{seed_admin, setup_schema};
use crate::error::StoreError;
use crate::payment::PaymentGateway;
use crate::settings::SettingsStore;
use crate::wishlist::WishlistStore;

/// Everything a handler can reach. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub secret: Arc<str>,
    pub catalog: Arc<CatalogStore>,
    pub carts: Arc<CartStore>,
    pub wishlists: Arc<WishlistStore>,
    pub settings: Arc<SettingsStore>,
    pub checkout: Arc<CheckoutService>,
}

impl AppState {
    /// Prepares the schema, seeds the admin account and loads the caches.
    pub async fn init(
        db: DatabaseConnection,
        config: &Config,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Result<AppState, StoreError> {
        setup_schema(&db).await?;
        match &config.admin_password {
            Some(password) => seed_admin(&db, password).await?,
            None => warn!("ADMIN_PASSWORD is not set, no admin account will be created"),
        }

        let db = Arc::new(db);
        let catalog = Arc::new(CatalogStore::load(db.clone()).await?);
        let carts = Arc::new(CartStore::new(db.clone()));
        let wishlists = Arc::new(WishlistStore::new(db.clone()));
        let settings = Arc::new(SettingsStore::load(db.clone(), &config.default_currency).await?);
        let checkout = Arc::new(CheckoutService::new(
            db.clone(),
            carts.clone(),
            settings.clone(),
            gateway,
        ));

        Ok(AppState {
            db,
            secret: Arc::from(config.secret.as_str()),
            catalog,
            carts,
            wishlists,
            settings,
            checkout,
        })
    }
}
