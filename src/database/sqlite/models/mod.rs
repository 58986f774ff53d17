
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Authoritative catalog row for a product, keyed by its code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CatalogRecord {
    pub code: String,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub featured: bool,
    pub active: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCatalogRecord {
    pub code: String,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub featured: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStatistics {
    pub total_products: i64,
    pub active_products: i64,
    pub featured_products: i64,
}

impl CatalogRecord {
    /// Price formatted the way the storefront shows it, e.g. `R$ 12.90`
    #[inline]
    pub fn display_price(&self) -> String {
        format!("R$ {:.2}", self.price)
    }
}
