//! In-memory collaborators that record every call

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::assistant::models::ResolvedProduct;
use crate::database::lancedb::{SimilarityCandidate, VectorRecord};
use crate::database::sqlite::{CatalogRecord, NewCatalogRecord};
use crate::providers::{
    CatalogStore, CompletionProvider, CompletionRequest, EmbeddingProvider, Providers,
    VectorIndex,
};
use crate::{LicaError, Result};

#[derive(Default)]
pub struct FakeEmbeddings {
    pub vector: Vec<f32>,
    pub fail: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeEmbeddings {
    pub fn returning(vector: Vec<f32>) -> Self {
        Self {
            vector,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.lock().expect("lock").push(text.to_string());
        if self.fail {
            return Err(LicaError::Embedding("embedding service down".to_string()));
        }
        Ok(self.vector.clone())
    }
}

/// Replies are consumed in call order; an exhausted script is an error
#[derive(Default)]
pub struct ScriptedCompletions {
    replies: Mutex<VecDeque<Result<String>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletions {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|reply| Ok(reply.to_string())).collect())
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletions {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.requests.lock().expect("lock").push(request);
        self.replies
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(LicaError::Generation("no scripted reply".to_string())))
    }
}

#[derive(Default)]
pub struct FakeVectorIndex {
    pub candidates: Vec<SimilarityCandidate>,
    pub records: HashMap<String, VectorRecord>,
    pub fail_query: bool,
    pub queries: Mutex<Vec<(Vec<f32>, usize)>>,
    pub fetches: Mutex<Vec<Vec<String>>>,
    pub upserts: Mutex<Vec<VectorRecord>>,
    pub dimension: usize,
}

impl FakeVectorIndex {
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    pub fn with_records(candidates: Vec<SimilarityCandidate>, records: Vec<VectorRecord>) -> Self {
        Self {
            candidates,
            records: records
                .into_iter()
                .map(|record| (record.id.clone(), record))
                .collect(),
            ..Self::default()
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().expect("lock").len()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().expect("lock").len()
    }

    pub fn upserted(&self) -> Vec<VectorRecord> {
        self.upserts.lock().expect("lock").clone()
    }
}

#[async_trait]
impl VectorIndex for FakeVectorIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SimilarityCandidate>> {
        self.queries
            .lock()
            .expect("lock")
            .push((vector.to_vec(), top_k));
        if self.fail_query {
            return Err(LicaError::VectorStore("index unavailable".to_string()));
        }
        Ok(self.candidates.iter().take(top_k).cloned().collect())
    }

    async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, VectorRecord>> {
        self.fetches.lock().expect("lock").push(ids.to_vec());
        Ok(ids
            .iter()
            .filter_map(|id| self.records.get(id).map(|record| (id.clone(), record.clone())))
            .collect())
    }

    async fn upsert(&self, record: &VectorRecord) -> Result<()> {
        self.upserts.lock().expect("lock").push(record.clone());
        Ok(())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    pub records: Mutex<HashMap<String, CatalogRecord>>,
    pub fail: bool,
    pub lookups: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn with_records(records: Vec<CatalogRecord>) -> Self {
        Self {
            records: Mutex::new(
                records
                    .into_iter()
                    .map(|record| (record.code.clone(), record))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().expect("lock").len()
    }

    pub fn get(&self, code: &str) -> Option<CatalogRecord> {
        self.records.lock().expect("lock").get(code).cloned()
    }
}

#[async_trait]
impl CatalogStore for FakeCatalog {
    async fn find_by_code(&self, code: &str) -> Result<Option<CatalogRecord>> {
        self.lookups.lock().expect("lock").push(code.to_string());
        if self.fail {
            return Err(LicaError::Database("catalog unavailable".to_string()));
        }
        Ok(self.get(code))
    }

    async fn upsert(&self, record: &NewCatalogRecord) -> Result<CatalogRecord> {
        if self.fail {
            return Err(LicaError::Database("catalog unavailable".to_string()));
        }
        let saved = CatalogRecord {
            code: record.code.clone(),
            name: record.name.clone(),
            price: record.price,
            description: record.description.clone(),
            category: record.category.clone(),
            image_url: record.image_url.clone(),
            featured: record.featured,
            active: record.active,
            created_at: None,
            updated_at: None,
        };
        self.records
            .lock()
            .expect("lock")
            .insert(saved.code.clone(), saved.clone());
        Ok(saved)
    }
}

/// Handles to the fakes next to the `Providers` bundle built from them
pub struct Harness {
    pub embeddings: Arc<FakeEmbeddings>,
    pub completions: Arc<ScriptedCompletions>,
    pub vectors: Arc<FakeVectorIndex>,
    pub catalog: Arc<FakeCatalog>,
}

impl Harness {
    pub fn new(
        embeddings: FakeEmbeddings,
        completions: ScriptedCompletions,
        vectors: FakeVectorIndex,
        catalog: FakeCatalog,
    ) -> Self {
        Self {
            embeddings: Arc::new(embeddings),
            completions: Arc::new(completions),
            vectors: Arc::new(vectors),
            catalog: Arc::new(catalog),
        }
    }

    pub fn providers(&self) -> Providers {
        Providers {
            embeddings: Arc::clone(&self.embeddings) as Arc<dyn EmbeddingProvider>,
            completions: Arc::clone(&self.completions) as Arc<dyn CompletionProvider>,
            vectors: Arc::clone(&self.vectors) as Arc<dyn VectorIndex>,
            catalog: Arc::clone(&self.catalog) as Arc<dyn CatalogStore>,
        }
    }
}

pub fn catalog_record(code: &str, name: &str, price: f64) -> CatalogRecord {
    CatalogRecord {
        code: code.to_string(),
        name: name.to_string(),
        price,
        description: format!("Descrição de {name}"),
        category: "Limpeza".to_string(),
        image_url: format!("https://example.com/{code}.png"),
        featured: false,
        active: true,
        created_at: None,
        updated_at: None,
    }
}

pub fn vector_record(code: &str, name: &str) -> VectorRecord {
    VectorRecord::for_product(
        code,
        vec![0.1, 0.2, 0.3],
        name,
        format!("Texto indexado de {name}"),
        format!("Como usar {name}"),
    )
}

pub fn candidate(id: &str, similarity: Option<f32>) -> SimilarityCandidate {
    SimilarityCandidate {
        id: id.to_string(),
        similarity,
    }
}

pub fn resolved(code: &str, name: &str) -> ResolvedProduct {
    ResolvedProduct::join(
        catalog_record(code, name, 10.0),
        &vector_record(code, name),
        Some(0.9),
    )
}
