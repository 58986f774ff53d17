use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::database::sqlite::queries::CatalogQueries;

#[cfg(test)]
mod tests;

pub mod models;
pub mod queries;

pub use models::{CatalogRecord, CatalogStatistics, NewCatalogRecord};

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    pub async fn initialize_from_config_dir(config_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        Self::new(config_dir.join("catalog.db")).await
    }

    pub async fn find_product(&self, code: &str) -> Result<Option<CatalogRecord>> {
        CatalogQueries::find_by_code(&self.pool, code).await
    }

    pub async fn upsert_product(&self, record: &NewCatalogRecord) -> Result<CatalogRecord> {
        CatalogQueries::upsert(&self.pool, record.clone()).await
    }

    pub async fn list_active_products(&self) -> Result<Vec<CatalogRecord>> {
        CatalogQueries::list_active(&self.pool).await
    }

    pub async fn statistics(&self) -> Result<CatalogStatistics> {
        CatalogQueries::statistics(&self.pool).await
    }
}

/// Lazily connected catalog handle shared across conversation turns.
///
/// The first caller opens the pool; concurrent first-time callers wait on the
/// same initialization instead of each opening their own. A failed attempt is
/// not cached, so the next caller retries the connection.
#[derive(Debug, Clone)]
pub struct SharedCatalog {
    database_path: PathBuf,
    cell: Arc<OnceCell<Database>>,
}

impl SharedCatalog {
    #[inline]
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            cell: Arc::new(OnceCell::new()),
        }
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.cell.initialized()
    }

    /// Get the shared database, connecting on first use
    #[inline]
    pub async fn database(&self) -> Result<&Database> {
        self.cell
            .get_or_try_init(|| async {
                info!(
                    "Connecting to product catalog at {}",
                    self.database_path.display()
                );
                if let Some(parent) = self.database_path.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create catalog directory: {}", parent.display())
                    })?;
                }
                Database::new(&self.database_path).await
            })
            .await
    }
}
