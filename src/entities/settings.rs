use sea_orm::entity::prelude::*;
use serde::Serialize;

pub const SETTINGS_ID: &str = "default";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "store_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub store_name: String,
    pub currency: String,
    pub shipping_fee: f64,
    pub free_shipping_threshold: Option<f64>,
    pub updated_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn defaults(currency: &str) -> Model {
        Model {
            id: SETTINGS_ID.to_string(),
            store_name: "Storefront".to_string(),
            currency: currency.to_string(),
            shipping_fee: 0.0,
            free_shipping_threshold: None,
            updated_at: None,
        }
    }

    /// Shipping charged on an order with the given subtotal.
    pub fn shipping_for(&self, subtotal: f64) -> f64 {
        match self.free_shipping_threshold {
            Some(threshold) if subtotal >= threshold => 0.0,
            _ => self.shipping_fee,
        }
    }
}
