use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use crate::entities::{category, product};
use crate::i18n::{resolve, Locale, TextField};

/// Tab value meaning "no category restriction".
pub const ALL_CATEGORIES: &str = "all";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortKey::Newest),
            "price-asc" => Ok(SortKey::PriceAsc),
            "price-desc" => Ok(SortKey::PriceDesc),
            "name-asc" => Ok(SortKey::NameAsc),
            "name-desc" => Ok(SortKey::NameDesc),
            _ => Err(format!("Unknown sort key: {}", s)),
        }
    }
}

/// Inclusive bounds on the effective price.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl Default for PriceRange {
    fn default() -> Self {
        PriceRange {
            min: 0.0,
            max: f64::INFINITY,
        }
    }
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductFilter {
    /// Slug of the selected category tab.
    pub tab: Option<String>,
    /// Slugs picked in the filter panel; empty means any category.
    pub category_slugs: Vec<String>,
    pub price: PriceRange,
    pub in_stock_only: bool,
    pub sort: SortKey,
}

fn fold(value: &str) -> String {
    value.to_lowercase()
}

/// Runs the listing pipeline: published products narrowed by tab, panel
/// categories, price and stock, then sorted. Equal keys keep input order.
pub fn filter_products<'a>(
    products: &'a [product::Model],
    categories: &[category::Model],
    filter: &ProductFilter,
    locale: Locale,
) -> Vec<&'a product::Model> {
    let tab_name = match filter.tab.as_deref() {
        Some(slug) if slug != ALL_CATEGORIES => {
            match categories.iter().find(|category| category.slug == slug) {
                Some(category) => Some(fold(&resolve(category, TextField::Name, locale))),
                // an unknown tab shows nothing rather than everything
                None => return Vec::new(),
            }
        }
        _ => None,
    };

    let slug_by_name: HashMap<String, &str> = if filter.category_slugs.is_empty() {
        HashMap::new()
    } else {
        let mut map = HashMap::new();
        for category in categories {
            map.entry(fold(&resolve(category, TextField::Name, locale)))
                .or_insert(category.slug.as_str());
        }
        map
    };
    let wanted_slugs: HashSet<&str> = filter.category_slugs.iter().map(String::as_str).collect();

    let mut result: Vec<&product::Model> = products
        .iter()
        .filter(|product| product.published)
        .filter(|product| match &tab_name {
            Some(name) => fold(&resolve(*product, TextField::Category, locale)) == *name,
            None => true,
        })
        .filter(|product| {
            if wanted_slugs.is_empty() {
                return true;
            }
            let name = fold(&resolve(*product, TextField::Category, locale));
            slug_by_name
                .get(&name)
                .is_some_and(|slug| wanted_slugs.contains(slug))
        })
        .filter(|product| filter.price.contains(product.effective_price()))
        .filter(|product| !filter.in_stock_only || product.stock > 0)
        .collect();

    sort_products(&mut result, filter.sort, locale);
    result
}

pub fn sort_products(products: &mut [&product::Model], sort: SortKey, locale: Locale) {
    match sort {
        SortKey::PriceAsc => {
            products.sort_by(|a, b| a.effective_price().total_cmp(&b.effective_price()))
        }
        SortKey::PriceDesc => {
            products.sort_by(|a, b| b.effective_price().total_cmp(&a.effective_price()))
        }
        SortKey::NameAsc => {
            products.sort_by_cached_key(|product| name_key(product, locale));
        }
        SortKey::NameDesc => {
            products.sort_by_cached_key(|product| Reverse(name_key(product, locale)));
        }
        SortKey::Newest => {
            products.sort_by_cached_key(|product| Reverse(created_millis(product)));
        }
    }
}

fn name_key(product: &product::Model, locale: Locale) -> (String, String) {
    let name = resolve(product, TextField::Name, locale);
    (collation_key(&name), name)
}

/// Missing or unparsable timestamps count as the epoch.
fn created_millis(product: &product::Model) -> i64 {
    product
        .created_at
        .as_deref()
        .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|value| value.timestamp_millis())
        .unwrap_or(0)
}

fn is_thai_leading_vowel(c: char) -> bool {
    ('\u{0E40}'..='\u{0E44}').contains(&c)
}

/// Case-folded sort key. Thai leading vowels (เ แ โ ใ ไ) are written before
/// the consonant they follow in speech and sort after it.
pub fn collation_key(value: &str) -> String {
    let mut key = String::with_capacity(value.len());
    let mut chars = value.chars().flat_map(char::to_lowercase);
    while let Some(c) = chars.next() {
        if is_thai_leading_vowel(c) {
            if let Some(next) = chars.next() {
                key.push(next);
            }
        }
        key.push(c);
    }
    key
}
