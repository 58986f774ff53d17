use super::*;
use anyhow::Result;
use std::collections::HashSet;
use tempfile::TempDir;

async fn create_test_database() -> Result<(TempDir, Database)> {
    let temp_dir = TempDir::new()?;
    let database = Database::initialize_from_config_dir(temp_dir.path()).await?;
    Ok((temp_dir, database))
}

fn new_product(code: &str, name: &str) -> NewCatalogRecord {
    NewCatalogRecord {
        code: code.to_string(),
        name: name.to_string(),
        price: 19.9,
        description: format!("{name} para limpeza pesada"),
        category: "Limpeza".to_string(),
        image_url: format!("https://cdn.example.com/{code}.png"),
        featured: false,
        active: true,
    }
}

#[tokio::test]
async fn integration_schema_migration() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '_sqlx%'",
    )
    .fetch_all(database.pool())
    .await?;

    let expected_tables: HashSet<&'static str> = ["products"].into_iter().collect();
    let actual_tables: HashSet<&str> = tables.iter().map(|t| t.as_str()).collect();
    assert_eq!(actual_tables, expected_tables);

    Ok(())
}

#[tokio::test]
async fn find_product_round_trip() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let saved = database
        .upsert_product(&new_product("P1", "Desengordurante X"))
        .await?;
    assert_eq!(saved.code, "P1");
    assert!(saved.created_at.is_some());

    let found = database.find_product("P1").await?;
    assert_eq!(found, Some(saved));

    assert!(database.find_product("missing").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn shared_catalog_connects_once() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let catalog = SharedCatalog::new(temp_dir.path().join("nested").join("catalog.db"));
    assert!(!catalog.is_connected());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let catalog = catalog.clone();
            tokio::spawn(async move {
                let database = catalog.database().await?;
                Ok::<_, anyhow::Error>(database.pool().clone())
            })
        })
        .collect();

    for handle in handles {
        handle.await??;
    }

    assert!(catalog.is_connected());
    let first = catalog.database().await?;
    let second = catalog.database().await?;
    assert!(std::ptr::eq(first, second));

    Ok(())
}

#[tokio::test]
async fn shared_catalog_retries_after_failed_connection() -> Result<()> {
    let temp_dir = TempDir::new()?;
    // A directory where the database file should be makes the first connect fail
    let blocked_path = temp_dir.path().join("catalog.db");
    std::fs::create_dir_all(&blocked_path)?;

    let catalog = SharedCatalog::new(&blocked_path);
    assert!(catalog.database().await.is_err());
    assert!(!catalog.is_connected());

    std::fs::remove_dir_all(&blocked_path)?;
    assert!(catalog.database().await.is_ok());
    assert!(catalog.is_connected());

    Ok(())
}
