//! Staff product registration
//!
//! Saving writes the catalog record first and the vector second. There is no
//! rollback: if the vector write fails, the catalog keeps a product that
//! search cannot find until it is saved again.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::database::lancedb::VectorRecord;
use crate::database::sqlite::{CatalogRecord, NewCatalogRecord};
use crate::providers::{CatalogStore, EmbeddingProvider, Providers, VectorIndex};
use crate::{LicaError, Result};

/// Everything staff enter for a new or updated product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRegistration {
    pub code: String,
    pub name: String,
    pub description: String,
    pub usage_instructions: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    pub image_url: String,
    #[serde(default)]
    pub featured: bool,
    /// Precomputed vector; generated when absent
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    /// Text to embed instead of the product's own fields
    #[serde(default)]
    pub embedding_text: Option<String>,
}

impl ProductRegistration {
    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(LicaError::Validation("product code cannot be empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(LicaError::Validation("product name cannot be empty".to_string()));
        }
        if self.image_url.trim().is_empty() {
            return Err(LicaError::Validation("product image URL cannot be empty".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(LicaError::Validation(format!(
                "invalid price {} (must be a non-negative number)",
                self.price
            )));
        }
        if self.embedding.as_ref().is_some_and(Vec::is_empty) {
            return Err(LicaError::Validation("embedding cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Text embedded when no vector or explicit text is supplied
    #[inline]
    pub fn default_embedding_text(&self) -> String {
        [&self.name, &self.description, &self.usage_instructions]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn catalog_record(&self) -> NewCatalogRecord {
        NewCatalogRecord {
            code: self.code.trim().to_string(),
            name: self.name.trim().to_string(),
            price: self.price,
            description: self.description.clone(),
            category: self.category.clone(),
            image_url: self.image_url.trim().to_string(),
            featured: self.featured,
            active: true,
        }
    }
}

pub struct ProductAdmin {
    embeddings: Arc<dyn EmbeddingProvider>,
    vectors: Arc<dyn VectorIndex>,
    catalog: Arc<dyn CatalogStore>,
}

impl ProductAdmin {
    #[inline]
    pub fn new(providers: &Providers) -> Self {
        Self {
            embeddings: Arc::clone(&providers.embeddings),
            vectors: Arc::clone(&providers.vectors),
            catalog: Arc::clone(&providers.catalog),
        }
    }

    /// Validate, embed, then write catalog and vector records.
    ///
    /// The vector is checked against the index's own dimension before
    /// anything is written, so a mismatch leaves both stores untouched.
    #[inline]
    pub async fn save_product(&self, registration: &ProductRegistration) -> Result<CatalogRecord> {
        registration.validate()?;

        let vector = self.resolve_embedding(registration).await?;
        let expected = self.vectors.dimension();
        if vector.len() != expected {
            return Err(LicaError::Validation(format!(
                "embedding has {} dimensions, the vector index expects {}",
                vector.len(),
                expected
            )));
        }

        let saved = self.catalog.upsert(&registration.catalog_record()).await?;
        info!("Saved catalog record {}", saved.code);

        let record = VectorRecord::for_product(
            saved.code.as_str(),
            vector,
            saved.name.as_str(),
            registration.description.as_str(),
            registration.usage_instructions.as_str(),
        );
        if let Err(e) = self.vectors.upsert(&record).await {
            error!(
                "Catalog record {} was saved but its vector was not: {}",
                saved.code, e
            );
            return Err(e);
        }
        info!("Saved product vector {}", saved.code);

        Ok(saved)
    }

    async fn resolve_embedding(&self, registration: &ProductRegistration) -> Result<Vec<f32>> {
        if let Some(embedding) = &registration.embedding {
            return Ok(embedding.clone());
        }
        let text = registration
            .embedding_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map_or_else(|| registration.default_embedding_text(), str::to_string);
        self.embeddings.embed(&text).await
    }
}
