use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::entities::wishlist::{self, Entity as WishlistEntity};
use crate::error::StoreError;
use crate::guard::InFlight;
use crate::ids::generate_id;

/// Per-user sets of wished-for product ids, persisted then reloaded like the cart.
#[derive(Debug)]
pub struct WishlistStore {
    db: Arc<DatabaseConnection>,
    sets: RwLock<HashMap<i32, Arc<HashSet<String>>>>,
    reload_lock: Mutex<()>,
    in_flight: InFlight,
}

impl WishlistStore {
    pub fn new(db: Arc<DatabaseConnection>) -> WishlistStore {
        WishlistStore {
            db,
            sets: RwLock::new(HashMap::new()),
            reload_lock: Mutex::new(()),
            in_flight: InFlight::new(),
        }
    }

    pub async fn reload(&self, user_id: i32) -> Result<Arc<HashSet<String>>, StoreError> {
        let _reload = self.reload_lock.lock().await;
        let entries = WishlistEntity::find()
            .filter(wishlist::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await?;
        let set: Arc<HashSet<String>> =
            Arc::new(entries.into_iter().map(|entry| entry.product_id).collect());
        self.sets.write().await.insert(user_id, set.clone());
        debug!(user_id, items = set.len(), "Reloaded wishlist");
        Ok(set)
    }

    pub async fn items(&self, user_id: i32) -> Result<Arc<HashSet<String>>, StoreError> {
        if let Some(set) = self.sets.read().await.get(&user_id) {
            return Ok(set.clone());
        }
        self.reload(user_id).await
    }

    pub async fn is_in_wishlist(&self, user_id: i32, product_id: &str) -> Result<bool, StoreError> {
        Ok(self.items(user_id).await?.contains(product_id))
    }

    pub async fn get_wishlist_count(&self, user_id: i32) -> Result<usize, StoreError> {
        Ok(self.items(user_id).await?.len())
    }

    /// Adding a product already in the set changes nothing.
    pub async fn add(&self, user_id: i32, product_id: &str) -> Result<(), StoreError> {
        let _guard = self.in_flight.acquire(format!("wishlist:{user_id}:{product_id}"))?;
        self.insert_entry(user_id, product_id).await?;
        self.reload(user_id).await?;
        Ok(())
    }

    pub async fn remove(&self, user_id: i32, product_id: &str) -> Result<(), StoreError> {
        let _guard = self.in_flight.acquire(format!("wishlist:{user_id}:{product_id}"))?;
        self.delete_entry(user_id, product_id).await?;
        self.reload(user_id).await?;
        Ok(())
    }

    /// Flips membership and returns whether the product is now in the wishlist.
    pub async fn toggle(&self, user_id: i32, product_id: &str) -> Result<bool, StoreError> {
        let _guard = self.in_flight.acquire(format!("wishlist:{user_id}:{product_id}"))?;
        let present = self.reload(user_id).await?.contains(product_id);
        if present {
            self.delete_entry(user_id, product_id).await?;
        } else {
            self.insert_entry(user_id, product_id).await?;
        }
        Ok(self.reload(user_id).await?.contains(product_id))
    }

    async fn insert_entry(&self, user_id: i32, product_id: &str) -> Result<(), StoreError> {
        let existing = WishlistEntity::find()
            .filter(wishlist::Column::UserId.eq(user_id))
            .filter(wishlist::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Ok(());
        }
        let entry = wishlist::ActiveModel {
            id: Set(generate_id("wish")),
            user_id: Set(user_id),
            product_id: Set(product_id.to_string()),
        };
        WishlistEntity::insert(entry)
            .exec_without_returning(&*self.db)
            .await?;
        Ok(())
    }

    async fn delete_entry(&self, user_id: i32, product_id: &str) -> Result<(), StoreError> {
        WishlistEntity::delete_many()
            .filter(wishlist::Column::UserId.eq(user_id))
            .filter(wishlist::Column::ProductId.eq(product_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }
}
