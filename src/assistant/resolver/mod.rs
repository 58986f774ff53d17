
use futures::future::join_all;
use std::slice;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::Result;
use crate::assistant::models::{ConversationContext, ResolvedProduct};
use crate::assistant::optimizer::QueryOptimizer;
use crate::database::lancedb::{SimilarityCandidate, VectorRecord};
use crate::providers::{CatalogStore, EmbeddingProvider, Providers, VectorIndex};

/// Turns a chat message into catalog products ranked by vector similarity.
///
/// Candidates whose vector record or catalog record is missing are dropped,
/// so the output is never longer than the index's answer. Each surviving
/// product keeps the similarity of the candidate it came from.
#[derive(Clone)]
pub struct ProductResolver {
    optimizer: QueryOptimizer,
    embeddings: Arc<dyn EmbeddingProvider>,
    vectors: Arc<dyn VectorIndex>,
    catalog: Arc<dyn CatalogStore>,
    top_k: usize,
}

impl ProductResolver {
    #[inline]
    pub fn new(optimizer: QueryOptimizer, providers: &Providers, top_k: usize) -> Self {
        Self {
            optimizer,
            embeddings: Arc::clone(&providers.embeddings),
            vectors: Arc::clone(&providers.vectors),
            catalog: Arc::clone(&providers.catalog),
            top_k,
        }
    }

    /// Resolve products for `text`.
    ///
    /// `context` ends with the user's message; the turns before it give the
    /// optimizer something to resolve vague references against. Embedding,
    /// index and catalog failures are returned as-is.
    #[inline]
    pub async fn resolve(
        &self,
        text: &str,
        context: &ConversationContext,
    ) -> Result<Vec<ResolvedProduct>> {
        let query = self.optimizer.optimize(text, context.history()).await;
        let vector = self.embeddings.embed(&query).await?;
        let candidates = self.vectors.query(&vector, self.top_k).await?;
        debug!("Index returned {} candidates for {:?}", candidates.len(), query);

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let fetched = join_all(
            candidates
                .iter()
                .enumerate()
                .map(|(index, candidate)| self.fetch_vector(index, candidate)),
        )
        .await;
        let mut records = Vec::with_capacity(fetched.len());
        for result in fetched {
            if let Some(indexed) = result? {
                records.push(indexed);
            }
        }

        let joined = join_all(
            records
                .iter()
                .map(|(index, record)| self.join_catalog(*index, record, &candidates)),
        )
        .await;
        let mut products: Vec<(usize, ResolvedProduct)> = Vec::with_capacity(joined.len());
        for result in joined {
            if let Some(indexed) = result? {
                products.push(indexed);
            }
        }
        products.sort_by_key(|(index, _)| *index);

        info!(
            "Resolved {} of {} candidates for {:?}",
            products.len(),
            candidates.len(),
            query
        );
        Ok(products.into_iter().map(|(_, product)| product).collect())
    }

    async fn fetch_vector(
        &self,
        index: usize,
        candidate: &SimilarityCandidate,
    ) -> Result<Option<(usize, VectorRecord)>> {
        let mut found = self.vectors.fetch(slice::from_ref(&candidate.id)).await?;
        match found.remove(&candidate.id) {
            Some(record) if !record.metadata.product_code.is_empty() => Ok(Some((index, record))),
            Some(_) => {
                warn!("Vector record {} has no product code, dropping it", candidate.id);
                Ok(None)
            }
            None => {
                warn!("Vector record not found for candidate {}", candidate.id);
                Ok(None)
            }
        }
    }

    async fn join_catalog(
        &self,
        index: usize,
        record: &VectorRecord,
        candidates: &[SimilarityCandidate],
    ) -> Result<Option<(usize, ResolvedProduct)>> {
        let code = &record.metadata.product_code;
        let Some(catalog) = self.catalog.find_by_code(code).await? else {
            warn!("Catalog record not found for product {}", code);
            return Ok(None);
        };
        let similarity = candidates.get(index).and_then(|candidate| candidate.similarity);
        Ok(Some((index, ResolvedProduct::join(catalog, record, similarity))))
    }
}
