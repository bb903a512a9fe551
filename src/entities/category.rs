use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::i18n::{Locale, Localized, Slot, TextField};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub name_th: Option<String>,
    pub name_en: Option<String>,
    pub name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description_th: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description_en: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub active: bool,
    // advisory only, nothing keeps it in step with the products table
    pub product_count: i32,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Localized for Model {
    fn text(&self, field: TextField, slot: Slot) -> Option<&str> {
        let value = match (field, slot) {
            (TextField::Name, Slot::Locale(Locale::Th)) => &self.name_th,
            (TextField::Name, Slot::Locale(Locale::En)) => &self.name_en,
            (TextField::Name, Slot::Legacy) => &self.name,
            (TextField::Description, Slot::Locale(Locale::Th)) => &self.description_th,
            (TextField::Description, Slot::Locale(Locale::En)) => &self.description_en,
            (TextField::Description, Slot::Legacy) => &self.description,
            (TextField::Category, _) => return None,
        };
        value.as_deref()
    }

    fn fallback(&self, field: TextField) -> &'static str {
        match field {
            TextField::Description => "",
            TextField::Name | TextField::Category => "Uncategorized",
        }
    }
}
