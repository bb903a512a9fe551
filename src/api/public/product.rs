use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::catalog::{filter_products, PriceRange, ProductFilter, SortKey};
use crate::entities::product::{self, Color};
use crate::error::StoreError;
use crate::i18n::{resolve, Locale, TextField};
use crate::middleware::logging::{ok_response, to_response, ApiError};
use crate::state::AppState;

pub fn product_router(state: AppState) -> Router {
    Router::new()
        .route("/products", get(get_products))
        .route("/products/:id", get(get_product))
        .layer(Extension(state))
}

async fn get_products(
    Path(locale): Path<Locale>,
    Query(params): Query<GetProductsQuery>,
    Extension(state): Extension<AppState>,
) -> Response {
    let filter = match params.into_filter() {
        Ok(filter) => filter,
        Err(err) => return err.into_api_response(),
    };

    let products = state.catalog.products().await;
    let categories = state.catalog.categories().await;
    let response: Vec<PublicProductResponse> =
        filter_products(&products, &categories, &filter, locale)
            .into_iter()
            .map(|prod| PublicProductResponse::new(prod, locale))
            .collect();

    ok_response((StatusCode::OK, Json(response)))
}

async fn get_product(
    Path((locale, id)): Path<(Locale, String)>,
    Extension(state): Extension<AppState>,
) -> Response {
    match state.catalog.get_product_by_id(&id).await {
        Some(prod) if prod.published => ok_response((
            StatusCode::OK,
            Json(PublicProductResponse::new(&prod, locale)),
        )),
        _ => to_response(
            (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!("No product with {} id was found.", id)
                })),
            ),
            Err(ApiError::General(format!("Unknown product {id}"))),
        ),
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct GetProductsQuery {
    /// Category tab slug, `all` for none.
    category: Option<String>,
    /// Comma separated slugs from the filter panel.
    categories: Option<String>,
    min: Option<f64>,
    max: Option<f64>,
    in_stock: Option<bool>,
    sort: Option<SortKey>,
}

impl GetProductsQuery {
    fn into_filter(self) -> Result<ProductFilter, StoreError> {
        let defaults = PriceRange::default();
        let price = PriceRange {
            min: self.min.unwrap_or(defaults.min),
            max: self.max.unwrap_or(defaults.max),
        };
        if price.min > price.max {
            return Err(StoreError::Validation(
                "Minimum price is above the maximum".into(),
            ));
        }

        let category_slugs = self
            .categories
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
            .map(String::from)
            .collect();

        Ok(ProductFilter {
            tab: self.category.filter(|slug| !slug.is_empty()),
            category_slugs,
            price,
            in_stock_only: self.in_stock.unwrap_or(false),
            sort: self.sort.unwrap_or_default(),
        })
    }
}

/// A product as shown to shoppers: text fields resolved for one locale.
#[derive(Serialize, Debug)]
pub struct PublicProductResponse {
    id: String,
    name: String,
    description: String,
    category: String,
    price: f64,
    sale_price: Option<f64>,
    effective_price: f64,
    images: Vec<String>,
    sizes: Vec<String>,
    colors: Vec<Color>,
    rating: f64,
    review_count: i32,
    stock: i32,
    in_stock: bool,
    created_at: Option<String>,
}

impl PublicProductResponse {
    pub fn new(value: &product::Model, locale: Locale) -> PublicProductResponse {
        PublicProductResponse {
            id: value.id.clone(),
            name: resolve(value, TextField::Name, locale),
            description: resolve(value, TextField::Description, locale),
            category: resolve(value, TextField::Category, locale),
            price: value.price,
            sale_price: value.sale_price,
            effective_price: value.effective_price(),
            images: value.images.0.clone(),
            sizes: value.sizes.0.clone(),
            colors: value.colors.0.clone(),
            rating: value.rating,
            review_count: value.review_count,
            stock: value.stock,
            in_stock: value.stock > 0,
            created_at: value.created_at.clone(),
        }
    }
}
