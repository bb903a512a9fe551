use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::entities::user::Entity as User;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "cart_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(indexed)]
    pub user_id: i32,
    pub product_id: String,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub name: String,
    pub image: Option<String>,
    pub added_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "User",
        from = "crate::entities::cart::Column::UserId",
        to = "crate::entities::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl ActiveModelBehavior for ActiveModel {}

impl Related<crate::entities::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Model {
    pub fn unit_price(&self) -> f64 {
        self.sale_price.unwrap_or(self.price)
    }

    pub fn line_total(&self) -> f64 {
        self.unit_price() * self.quantity as f64
    }
}
