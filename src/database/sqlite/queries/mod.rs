
use super::models::*;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

const PRODUCT_COLUMNS: &str = "code, name, price, description, category, image_url, featured, active, created_at, updated_at";

pub struct CatalogQueries;

impl CatalogQueries {
    /// Insert a product, or update every field of the existing row with the same code
    #[inline]
    pub async fn upsert(pool: &SqlitePool, record: NewCatalogRecord) -> Result<CatalogRecord> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            r#"
            INSERT INTO products
                (code, name, price, description, category, image_url, featured, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                price = excluded.price,
                description = excluded.description,
                category = excluded.category,
                image_url = excluded.image_url,
                featured = excluded.featured,
                active = excluded.active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.code)
        .bind(&record.name)
        .bind(record.price)
        .bind(&record.description)
        .bind(&record.category)
        .bind(&record.image_url)
        .bind(record.featured)
        .bind(record.active)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to upsert product {}", record.code))?;

        debug!("Upserted catalog record {}", record.code);

        Self::find_by_code(pool, &record.code)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve upserted product"))
    }

    #[inline]
    pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<CatalogRecord>> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE code = ?");
        let result = sqlx::query_as::<_, CatalogRecord>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
            .context("Failed to get product by code")?;

        Ok(result)
    }

    #[inline]
    pub async fn list_active(pool: &SqlitePool) -> Result<Vec<CatalogRecord>> {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE active = 1 ORDER BY featured DESC, name ASC"
        );
        let records = sqlx::query_as::<_, CatalogRecord>(&query)
            .fetch_all(pool)
            .await
            .context("Failed to list active products")?;

        Ok(records)
    }

    #[inline]
    pub async fn set_active(pool: &SqlitePool, code: &str, active: bool) -> Result<bool> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query("UPDATE products SET active = ?, updated_at = ? WHERE code = ?")
            .bind(active)
            .bind(now)
            .bind(code)
            .execute(pool)
            .await
            .context("Failed to update product active flag")?;

        Ok(result.rows_affected() > 0)
    }

    #[inline]
    pub async fn delete(pool: &SqlitePool, code: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE code = ?")
            .bind(code)
            .execute(pool)
            .await
            .context("Failed to delete product")?;

        Ok(result.rows_affected() > 0)
    }

    #[inline]
    pub async fn statistics(pool: &SqlitePool) -> Result<CatalogStatistics> {
        let (total_products, active_products, featured_products): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(CASE WHEN active = 1 THEN 1 ELSE 0 END), 0),
                       COALESCE(SUM(CASE WHEN featured = 1 THEN 1 ELSE 0 END), 0)
                FROM products
                "#,
            )
            .fetch_one(pool)
            .await
            .context("Failed to compute catalog statistics")?;

        Ok(CatalogStatistics {
            total_products,
            active_products,
            featured_products,
        })
    }
}
