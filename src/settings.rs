use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use validator::Validate;

use crate::entities::settings::{self, Entity as SettingsEntity, SETTINGS_ID};
use crate::error::StoreError;
use crate::guard::InFlight;

/// The single store configuration document. Until an admin saves one the
/// defaults are served.
#[derive(Debug)]
pub struct SettingsStore {
    db: Arc<DatabaseConnection>,
    default_currency: String,
    current: RwLock<settings::Model>,
    reload_lock: Mutex<()>,
    in_flight: InFlight,
}

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct SettingsInput {
    #[validate(length(min = 1, max = 128))]
    pub store_name: String,
    #[validate(length(equal = 3))]
    pub currency: String,
    #[validate(range(min = 0.0))]
    pub shipping_fee: f64,
    #[validate(range(min = 0.0))]
    pub free_shipping_threshold: Option<f64>,
}

impl SettingsStore {
    pub async fn load(
        db: Arc<DatabaseConnection>,
        default_currency: &str,
    ) -> Result<SettingsStore, StoreError> {
        let store = SettingsStore {
            db,
            default_currency: default_currency.to_lowercase(),
            current: RwLock::new(settings::Model::defaults(default_currency)),
            reload_lock: Mutex::new(()),
            in_flight: InFlight::new(),
        };
        store.reload().await?;
        Ok(store)
    }

    pub async fn reload(&self) -> Result<settings::Model, StoreError> {
        let _reload = self.reload_lock.lock().await;
        let loaded = SettingsEntity::find_by_id(SETTINGS_ID)
            .one(&*self.db)
            .await?
            .unwrap_or_else(|| settings::Model::defaults(&self.default_currency));
        *self.current.write().await = loaded.clone();
        Ok(loaded)
    }

    pub async fn get(&self) -> settings::Model {
        self.current.read().await.clone()
    }

    /// Replaces the whole document.
    pub async fn replace(&self, input: SettingsInput) -> Result<settings::Model, StoreError> {
        input.validate()?;
        let _guard = self.in_flight.acquire("settings")?;

        let model = settings::ActiveModel {
            id: Set(SETTINGS_ID.to_string()),
            store_name: Set(input.store_name),
            currency: Set(input.currency.to_lowercase()),
            shipping_fee: Set(input.shipping_fee),
            free_shipping_threshold: Set(input.free_shipping_threshold),
            updated_at: Set(Some(Utc::now().to_rfc3339())),
        };
        let exists = SettingsEntity::find_by_id(SETTINGS_ID)
            .one(&*self.db)
            .await?
            .is_some();
        if exists {
            SettingsEntity::update(model).exec(&*self.db).await?;
        } else {
            SettingsEntity::insert(model)
                .exec_without_returning(&*self.db)
                .await?;
        }
        info!("Replaced store settings");

        self.reload().await
    }
}
