use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use validator::Validate;

use crate::entities::category::{self, Entity as CategoryEntity};
use crate::entities::product::{self, Color, Colors, Entity as ProductEntity, Images, Sizes};
use crate::error::StoreError;
use crate::guard::InFlight;
use crate::ids::generate_id;

/// Cached product and category collections.
///
/// Reads are served from the last loaded snapshot. Every write goes to the
/// database first and is followed by a reload of the whole collection; the
/// cache is never patched in place. Reloads are serialized so a slower
/// read can never install an older snapshot over a newer one.
#[derive(Debug)]
pub struct CatalogStore {
    db: Arc<DatabaseConnection>,
    products: RwLock<Arc<Vec<product::Model>>>,
    categories: RwLock<Arc<Vec<category::Model>>>,
    reload_lock: Mutex<()>,
    in_flight: InFlight,
}

impl CatalogStore {
    pub async fn load(db: Arc<DatabaseConnection>) -> Result<CatalogStore, StoreError> {
        let store = CatalogStore {
            db,
            products: RwLock::new(Arc::new(Vec::new())),
            categories: RwLock::new(Arc::new(Vec::new())),
            reload_lock: Mutex::new(()),
            in_flight: InFlight::new(),
        };
        store.reload_products().await?;
        store.reload_categories().await?;
        Ok(store)
    }

    pub async fn reload_products(&self) -> Result<(), StoreError> {
        let _reload = self.reload_lock.lock().await;
        let products = ProductEntity::find()
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        info!(count = products.len(), "Reloaded products");
        *self.products.write().await = Arc::new(products);
        Ok(())
    }

    pub async fn reload_categories(&self) -> Result<(), StoreError> {
        let _reload = self.reload_lock.lock().await;
        let categories = CategoryEntity::find()
            .order_by_asc(category::Column::Slug)
            .all(&*self.db)
            .await?;
        info!(count = categories.len(), "Reloaded categories");
        *self.categories.write().await = Arc::new(categories);
        Ok(())
    }

    pub async fn products(&self) -> Arc<Vec<product::Model>> {
        self.products.read().await.clone()
    }

    pub async fn categories(&self) -> Arc<Vec<category::Model>> {
        self.categories.read().await.clone()
    }

    /// Local lookup against the last snapshot.
    pub async fn get_product_by_id(&self, id: &str) -> Option<product::Model> {
        self.products
            .read()
            .await
            .iter()
            .find(|product| product.id == id)
            .cloned()
    }

    pub async fn get_category_by_id(&self, id: &str) -> Option<category::Model> {
        self.categories
            .read()
            .await
            .iter()
            .find(|category| category.id == id)
            .cloned()
    }

    pub async fn create_product(&self, input: ProductInput) -> Result<product::Model, StoreError> {
        input.validate()?;
        input.check()?;

        let id = generate_id("prod");
        let _guard = self.in_flight.acquire(format!("product:{id}"))?;
        let now = Utc::now().to_rfc3339();
        let new_product = product::ActiveModel {
            id: Set(id.clone()),
            name_th: Set(input.name_th),
            name_en: Set(input.name_en),
            name: Set(input.name),
            description_th: Set(input.description_th),
            description_en: Set(input.description_en),
            description: Set(input.description),
            category_th: Set(input.category_th),
            category_en: Set(input.category_en),
            category: Set(input.category),
            price: Set(input.price),
            sale_price: Set(input.sale_price),
            images: Set(Images(input.images)),
            sizes: Set(Sizes(input.sizes)),
            colors: Set(Colors(input.colors)),
            rating: Set(input.rating),
            review_count: Set(input.review_count),
            stock: Set(input.stock),
            published: Set(input.published),
            created_at: Set(Some(now.clone())),
            updated_at: Set(Some(now)),
        };
        ProductEntity::insert(new_product)
            .exec_without_returning(&*self.db)
            .await?;
        info!(product_id = %id, "Created product");

        self.reload_products().await?;
        self.get_product_by_id(&id)
            .await
            .ok_or_else(|| StoreError::NotFound(format!("No product with {id} id was found")))
    }

    pub async fn update_product(
        &self,
        id: &str,
        patch: ProductPatch,
    ) -> Result<product::Model, StoreError> {
        patch.validate()?;
        let _guard = self.in_flight.acquire(format!("product:{id}"))?;

        let txn = self.db.begin().await?;
        let existing = ProductEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("No product with {id} id was found")))?;
        let mut product = existing.into_active_model();
        patch.apply(&mut product);
        product.updated_at = Set(Some(Utc::now().to_rfc3339()));
        product.update(&txn).await?;
        txn.commit().await?;
        info!(product_id = %id, "Updated product");

        self.reload_products().await?;
        self.get_product_by_id(id)
            .await
            .ok_or_else(|| StoreError::NotFound(format!("No product with {id} id was found")))
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.in_flight.acquire(format!("product:{id}"))?;
        let result = ProductEntity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!(
                "No product with {id} id was found"
            )));
        }
        info!(product_id = %id, "Deleted product");
        self.reload_products().await
    }

    pub async fn create_category(
        &self,
        input: CategoryInput,
    ) -> Result<category::Model, StoreError> {
        input.validate()?;
        check_slug(&input.slug)?;
        if input.name_th.is_none() && input.name_en.is_none() && input.name.is_none() {
            return Err(StoreError::Validation("Category name is required".into()));
        }
        let _guard = self.in_flight.acquire(format!("category-slug:{}", input.slug))?;
        self.ensure_slug_free(&input.slug, None).await?;

        let id = generate_id("cat");
        let now = Utc::now().to_rfc3339();
        let new_category = category::ActiveModel {
            id: Set(id.clone()),
            slug: Set(input.slug),
            name_th: Set(input.name_th),
            name_en: Set(input.name_en),
            name: Set(input.name),
            description_th: Set(input.description_th),
            description_en: Set(input.description_en),
            description: Set(input.description),
            active: Set(input.active),
            product_count: Set(input.product_count),
            created_at: Set(Some(now.clone())),
            updated_at: Set(Some(now)),
        };
        CategoryEntity::insert(new_category)
            .exec_without_returning(&*self.db)
            .await?;
        info!(category_id = %id, "Created category");

        self.reload_categories().await?;
        self.get_category_by_id(&id)
            .await
            .ok_or_else(|| StoreError::NotFound(format!("No category with {id} id was found")))
    }

    pub async fn update_category(
        &self,
        id: &str,
        patch: CategoryPatch,
    ) -> Result<category::Model, StoreError> {
        patch.validate()?;
        let _guard = self.in_flight.acquire(format!("category:{id}"))?;
        if let Some(slug) = &patch.slug {
            check_slug(slug)?;
            self.ensure_slug_free(slug, Some(id)).await?;
        }

        let txn = self.db.begin().await?;
        let existing = CategoryEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("No category with {id} id was found")))?;
        let mut category = existing.into_active_model();
        patch.apply(&mut category);
        category.updated_at = Set(Some(Utc::now().to_rfc3339()));
        category.update(&txn).await?;
        txn.commit().await?;
        info!(category_id = %id, "Updated category");

        self.reload_categories().await?;
        self.get_category_by_id(id)
            .await
            .ok_or_else(|| StoreError::NotFound(format!("No category with {id} id was found")))
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.in_flight.acquire(format!("category:{id}"))?;
        let result = CategoryEntity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!(
                "No category with {id} id was found"
            )));
        }
        info!(category_id = %id, "Deleted category");
        self.reload_categories().await
    }

    async fn ensure_slug_free(&self, slug: &str, except_id: Option<&str>) -> Result<(), StoreError> {
        let taken = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?;
        match taken {
            Some(category) if Some(category.id.as_str()) != except_id => Err(
                StoreError::Validation(format!("Category slug {slug} is already taken")),
            ),
            _ => Ok(()),
        }
    }
}

fn check_slug(slug: &str) -> Result<(), StoreError> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid || slug == crate::catalog::filter::ALL_CATEGORIES {
        return Err(StoreError::Validation(format!("Invalid category slug: {slug}")));
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct ProductInput {
    pub name_th: Option<String>,
    pub name_en: Option<String>,
    pub name: Option<String>,
    pub description_th: Option<String>,
    pub description_en: Option<String>,
    pub description: Option<String>,
    pub category_th: Option<String>,
    pub category_en: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 0.0))]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<Color>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub review_count: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default)]
    pub published: bool,
}

impl ProductInput {
    fn check(&self) -> Result<(), StoreError> {
        let has_name = [&self.name_th, &self.name_en, &self.name]
            .iter()
            .any(|name| name.as_deref().is_some_and(|n| !n.trim().is_empty()));
        if !has_name {
            return Err(StoreError::Validation("Product name is required".into()));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone, Default, Validate)]
pub struct ProductPatch {
    pub name_th: Option<String>,
    pub name_en: Option<String>,
    pub name: Option<String>,
    pub description_th: Option<String>,
    pub description_en: Option<String>,
    pub description: Option<String>,
    pub category_th: Option<String>,
    pub category_en: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 0.0))]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub clear_sale_price: bool,
    pub images: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<Color>>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    #[validate(range(min = 0))]
    pub review_count: Option<i32>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub published: Option<bool>,
}

impl ProductPatch {
    fn apply(self, product: &mut product::ActiveModel) {
        if let Some(value) = self.name_th {
            product.name_th = Set(Some(value));
        }
        if let Some(value) = self.name_en {
            product.name_en = Set(Some(value));
        }
        if let Some(value) = self.name {
            product.name = Set(Some(value));
        }
        if let Some(value) = self.description_th {
            product.description_th = Set(Some(value));
        }
        if let Some(value) = self.description_en {
            product.description_en = Set(Some(value));
        }
        if let Some(value) = self.description {
            product.description = Set(Some(value));
        }
        if let Some(value) = self.category_th {
            product.category_th = Set(Some(value));
        }
        if let Some(value) = self.category_en {
            product.category_en = Set(Some(value));
        }
        if let Some(value) = self.category {
            product.category = Set(Some(value));
        }
        if let Some(value) = self.price {
            product.price = Set(value);
        }
        if self.clear_sale_price {
            product.sale_price = Set(None);
        } else if let Some(value) = self.sale_price {
            product.sale_price = Set(Some(value));
        }
        if let Some(value) = self.images {
            product.images = Set(Images(value));
        }
        if let Some(value) = self.sizes {
            product.sizes = Set(Sizes(value));
        }
        if let Some(value) = self.colors {
            product.colors = Set(Colors(value));
        }
        if let Some(value) = self.rating {
            product.rating = Set(value);
        }
        if let Some(value) = self.review_count {
            product.review_count = Set(value);
        }
        if let Some(value) = self.stock {
            product.stock = Set(value);
        }
        if let Some(value) = self.published {
            product.published = Set(value);
        }
    }
}

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 64))]
    pub slug: String,
    pub name_th: Option<String>,
    pub name_en: Option<String>,
    pub name: Option<String>,
    pub description_th: Option<String>,
    pub description_en: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub product_count: i32,
}

#[derive(Deserialize, Debug, Clone, Default, Validate)]
pub struct CategoryPatch {
    #[validate(length(min = 1, max = 64))]
    pub slug: Option<String>,
    pub name_th: Option<String>,
    pub name_en: Option<String>,
    pub name: Option<String>,
    pub description_th: Option<String>,
    pub description_en: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    #[validate(range(min = 0))]
    pub product_count: Option<i32>,
}

impl CategoryPatch {
    fn apply(self, category: &mut category::ActiveModel) {
        if let Some(value) = self.slug {
            category.slug = Set(value);
        }
        if let Some(value) = self.name_th {
            category.name_th = Set(Some(value));
        }
        if let Some(value) = self.name_en {
            category.name_en = Set(Some(value));
        }
        if let Some(value) = self.name {
            category.name = Set(Some(value));
        }
        if let Some(value) = self.description_th {
            category.description_th = Set(Some(value));
        }
        if let Some(value) = self.description_en {
            category.description_en = Set(Some(value));
        }
        if let Some(value) = self.description {
            category.description = Set(Some(value));
        }
        if let Some(value) = self.active {
            category.active = Set(value);
        }
        if let Some(value) = self.product_count {
            category.product_count = Set(value);
        }
    }
}
