//! Filtering, sorting, pagination and facets over a catalog snapshot.

use crate::normalize::NormalizedProduct;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Name,
    #[default]
    Popularity,
    Price,
    Feedback,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("page must be at least 1")]
    Page,
    #[error("limit must be at least 1")]
    Limit,
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
}

/// `GET /api/products` query string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogQuery {
    /// Case-insensitive substring match against categories; `all` disables.
    pub category: Option<String>,
    /// An empty value (`?minPrice=`) counts as absent.
    #[serde(deserialize_with = "blank_as_none")]
    pub min_price: Option<f64>,
    #[serde(deserialize_with = "blank_as_none")]
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub page: usize,
    pub limit: usize,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            category: None,
            min_price: None,
            max_price: None,
            search: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
        }
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_products: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// Computed over the whole catalog, not the filtered view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub categories: Vec<String>,
    pub price_range: PriceRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub products: Vec<NormalizedProduct>,
    pub pagination: Pagination,
    pub filters: Facets,
}

impl CatalogQuery {
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.page == 0 {
            return Err(QueryError::Page);
        }
        if self.limit == 0 {
            return Err(QueryError::Limit);
        }
        if self.min_price.is_some_and(|p| !p.is_finite()) {
            return Err(QueryError::NotFinite("minPrice"));
        }
        if self.max_price.is_some_and(|p| !p.is_finite()) {
            return Err(QueryError::NotFinite("maxPrice"));
        }
        Ok(())
    }

    fn category_filter(&self) -> Option<String> {
        self.category
            .as_deref()
            .filter(|c| !c.is_empty() && *c != "all")
            .map(str::to_lowercase)
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, product: &NormalizedProduct) -> bool {
        if let Some(category) = self.category_filter() {
            if !product
                .categories
                .iter()
                .any(|c| c.to_lowercase().contains(&category))
            {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        match self.search_term() {
            Some(term) => {
                product.name.to_lowercase().contains(&term)
                    || product.description.to_lowercase().contains(&term)
                    || product.categories.iter().any(|c| c.to_lowercase().contains(&term))
            }
            None => true,
        }
    }

    fn compare(&self, a: &NormalizedProduct, b: &NormalizedProduct) -> Ordering {
        let ordering = match self.sort_by {
            SortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortBy::Popularity => a.popularity.cmp(&b.popularity),
            SortBy::Price => a.price.total_cmp(&b.price),
            SortBy::Feedback => a.net_feedback.cmp(&b.net_feedback),
        };
        match self.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// Filter, sort (stable; ties keep catalog order) and slice one page.
    pub fn apply(&self, catalog: &[NormalizedProduct]) -> CatalogPage {
        let mut selected: Vec<&NormalizedProduct> = catalog.iter().filter(|p| self.matches(p)).collect();
        selected.sort_by(|a, b| self.compare(a, b));

        let page = self.page.max(1);
        let limit = self.limit.max(1);
        let total_products = selected.len();
        let total_pages = total_products.div_ceil(limit);
        let products = selected
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect();

        CatalogPage {
            products,
            pagination: Pagination {
                current_page: page,
                total_pages,
                total_products,
                has_next_page: page < total_pages,
                has_prev_page: page > 1,
            },
            filters: facets(catalog),
        }
    }
}

pub fn facets(catalog: &[NormalizedProduct]) -> Facets {
    let categories: BTreeSet<&str> = catalog
        .iter()
        .flat_map(|p| p.categories.iter().map(String::as_str))
        .collect();
    let price_range = catalog
        .iter()
        .map(|p| p.price)
        .fold(None, |range: Option<PriceRange>, price| match range {
            None => Some(PriceRange { min: price, max: price }),
            Some(r) => Some(PriceRange {
                min: r.min.min(price),
                max: r.max.max(price),
            }),
        })
        .unwrap_or(PriceRange { min: 0.0, max: 0.0 });
    Facets {
        categories: categories.into_iter().map(str::to_string).collect(),
        price_range,
    }
}
