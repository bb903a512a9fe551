use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

use crate::i18n::{Locale, Localized, Slot, TextField};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name_th: Option<String>,
    pub name_en: Option<String>,
    pub name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description_th: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description_en: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub category_th: Option<String>,
    pub category_en: Option<String>,
    pub category: Option<String>,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub images: Images,
    pub sizes: Sizes,
    pub colors: Colors,
    pub rating: f64,
    pub review_count: i32,
    pub stock: i32,
    pub published: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Images(pub Vec<String>);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Sizes(pub Vec<String>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub name: String,
    pub hex: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Colors(pub Vec<Color>);

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Sale price when set, otherwise the list price.
    pub fn effective_price(&self) -> f64 {
        self.sale_price.unwrap_or(self.price)
    }

    pub fn first_image(&self) -> Option<&str> {
        self.images.0.first().map(String::as_str)
    }
}

impl Localized for Model {
    fn text(&self, field: TextField, slot: Slot) -> Option<&str> {
        let value = match (field, slot) {
            (TextField::Name, Slot::Locale(Locale::Th)) => &self.name_th,
            (TextField::Name, Slot::Locale(Locale::En)) => &self.name_en,
            (TextField::Name, Slot::Legacy) => &self.name,
            (TextField::Description, Slot::Locale(Locale::Th)) => &self.description_th,
            (TextField::Description, Slot::Locale(Locale::En)) => &self.description_en,
            (TextField::Description, Slot::Legacy) => &self.description,
            (TextField::Category, Slot::Locale(Locale::Th)) => &self.category_th,
            (TextField::Category, Slot::Locale(Locale::En)) => &self.category_en,
            (TextField::Category, Slot::Legacy) => &self.category,
        };
        value.as_deref()
    }

    fn fallback(&self, field: TextField) -> &'static str {
        match field {
            TextField::Name => "Untitled Product",
            TextField::Description => "",
            TextField::Category => "Uncategorized",
        }
    }
}
