use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::entities::cart::{self, Entity as CartEntity};
use crate::error::StoreError;
use crate::guard::InFlight;
use crate::ids::generate_id;

/// What the caller knows about a line when adding it: the chosen variant and
/// a snapshot of the product as it looked at add-time.
#[derive(Clone, Debug)]
pub struct NewCartLine {
    pub product_id: String,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub name: String,
    pub image: Option<String>,
}

/// Per-user carts.
///
/// A write runs in a transaction; on failure it rolls back and the cached
/// cart stays as it was. After a committed write the user's lines are
/// reloaded from the database, so a count read after a completed mutation
/// always sees it.
#[derive(Debug)]
pub struct CartStore {
    db: Arc<DatabaseConnection>,
    carts: RwLock<HashMap<i32, Arc<Vec<cart::Model>>>>,
    reload_lock: Mutex<()>,
    in_flight: InFlight,
}

fn line_key(user_id: i32, product_id: &str, size: &str, color: &str) -> String {
    format!("cart:{user_id}:{product_id}:{size}:{color}")
}

impl CartStore {
    pub fn new(db: Arc<DatabaseConnection>) -> CartStore {
        CartStore {
            db,
            carts: RwLock::new(HashMap::new()),
            reload_lock: Mutex::new(()),
            in_flight: InFlight::new(),
        }
    }

    /// Reads the user's lines and swaps them in under one lock, so snapshots
    /// land in the order they were read.
    pub async fn reload(&self, user_id: i32) -> Result<Arc<Vec<cart::Model>>, StoreError> {
        let _reload = self.reload_lock.lock().await;
        let lines = CartEntity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .order_by_asc(cart::Column::AddedAt)
            .all(&*self.db)
            .await?;
        let lines = Arc::new(lines);
        self.carts.write().await.insert(user_id, lines.clone());
        debug!(user_id, lines = lines.len(), "Reloaded cart");
        Ok(lines)
    }

    pub async fn lines(&self, user_id: i32) -> Result<Arc<Vec<cart::Model>>, StoreError> {
        if let Some(lines) = self.carts.read().await.get(&user_id) {
            return Ok(lines.clone());
        }
        self.reload(user_id).await
    }

    pub async fn add_to_cart(
        &self,
        user_id: i32,
        line: NewCartLine,
    ) -> Result<Arc<Vec<cart::Model>>, StoreError> {
        if line.quantity < 1 {
            return Err(StoreError::Validation(
                "Quantity should be greater than 0".into(),
            ));
        }
        let _guard = self.in_flight.acquire(line_key(
            user_id,
            &line.product_id,
            &line.size,
            &line.color,
        ))?;

        let txn = self.db.begin().await?;
        let existing = CartEntity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .filter(cart::Column::ProductId.eq(line.product_id.as_str()))
            .filter(cart::Column::Size.eq(line.size.as_str()))
            .filter(cart::Column::Color.eq(line.color.as_str()))
            .one(&txn)
            .await?;

        match existing {
            Some(entry) => {
                let quantity = entry.quantity.saturating_add(line.quantity);
                let mut entry = entry.into_active_model();
                entry.quantity = Set(quantity);
                entry.update(&txn).await?;
            }
            None => {
                let new_entry = cart::ActiveModel {
                    id: Set(generate_id("cart")),
                    user_id: Set(user_id),
                    product_id: Set(line.product_id.clone()),
                    size: Set(line.size),
                    color: Set(line.color),
                    quantity: Set(line.quantity),
                    price: Set(line.price),
                    sale_price: Set(line.sale_price),
                    name: Set(line.name),
                    image: Set(line.image),
                    added_at: Set(Utc::now().to_rfc3339()),
                };
                CartEntity::insert(new_entry)
                    .exec_without_returning(&txn)
                    .await?;
            }
        }
        txn.commit().await?;
        info!(user_id, product_id = %line.product_id, "Added to cart");

        self.reload(user_id).await
    }

    /// Sets the quantity of an existing line. Values below 1 are stored as 1;
    /// this path never removes a line.
    pub async fn update_quantity(
        &self,
        user_id: i32,
        product_id: &str,
        size: &str,
        color: &str,
        quantity: i64,
    ) -> Result<Arc<Vec<cart::Model>>, StoreError> {
        let quantity = quantity.clamp(1, u32::MAX as i64) as u32;
        let _guard = self
            .in_flight
            .acquire(line_key(user_id, product_id, size, color))?;

        let txn = self.db.begin().await?;
        let entry = CartEntity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .filter(cart::Column::ProductId.eq(product_id))
            .filter(cart::Column::Size.eq(size))
            .filter(cart::Column::Color.eq(color))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!("No cart line for product {product_id} was found"))
            })?;

        let mut entry = entry.into_active_model();
        entry.quantity = Set(quantity);
        entry.update(&txn).await?;
        txn.commit().await?;

        self.reload(user_id).await
    }

    /// Deletes the matching line; absent lines are not an error.
    pub async fn remove_from_cart(
        &self,
        user_id: i32,
        product_id: &str,
        size: &str,
        color: &str,
    ) -> Result<Arc<Vec<cart::Model>>, StoreError> {
        let _guard = self
            .in_flight
            .acquire(line_key(user_id, product_id, size, color))?;

        let result = CartEntity::delete_many()
            .filter(cart::Column::UserId.eq(user_id))
            .filter(cart::Column::ProductId.eq(product_id))
            .filter(cart::Column::Size.eq(size))
            .filter(cart::Column::Color.eq(color))
            .exec(&*self.db)
            .await?;
        debug!(user_id, product_id, removed = result.rows_affected, "Removed from cart");

        self.reload(user_id).await
    }

    pub async fn clear(&self, user_id: i32) -> Result<(), StoreError> {
        let _guard = self.in_flight.acquire(format!("cart:{user_id}"))?;
        CartEntity::delete_many()
            .filter(cart::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;
        self.reload(user_id).await?;
        Ok(())
    }

    /// Sum of quantities across all lines.
    pub async fn get_cart_item_count(&self, user_id: i32) -> Result<u64, StoreError> {
        Ok(item_count(&self.lines(user_id).await?))
    }
}

pub fn item_count(lines: &[cart::Model]) -> u64 {
    lines.iter().map(|line| line.quantity as u64).sum()
}

/// Sum of line totals at the snapshotted prices.
pub fn subtotal(lines: &[cart::Model]) -> f64 {
    lines.iter().map(cart::Model::line_total).sum()
}
