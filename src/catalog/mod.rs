pub mod filter;
pub mod store;

pub use filter::{filter_products, PriceRange, ProductFilter, SortKey, ALL_CATEGORIES};
pub use store::{CatalogStore, CategoryInput, CategoryPatch, ProductInput, ProductPatch};
