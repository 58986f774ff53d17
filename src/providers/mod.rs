//! External collaborator seams
//!
//! The assistant pipeline only talks to the outside world through these
//! traits. Production implementations wrap the Ollama client, the LanceDB
//! vector store and the SQLite catalog; tests substitute in-memory fakes.


use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::database::lancedb::{SimilarityCandidate, VectorRecord, VectorStore};
use crate::database::sqlite::{CatalogRecord, NewCatalogRecord, SharedCatalog};
use crate::embeddings::ollama::{ChatMessage, OllamaClient};
use crate::{LicaError, Result};

/// Converts text into a fixed-length vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// A single text-generation call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Single user prompt with no system message
    #[inline]
    pub fn prompt(text: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            system: None,
            messages: vec![ChatMessage::new("user", text)],
            temperature,
            max_tokens,
        }
    }

    /// Messages in the order the provider receives them, system prompt first
    #[inline]
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        self.system
            .iter()
            .map(|system| ChatMessage::new("system", system.as_str()))
            .chain(self.messages.iter().cloned())
            .collect()
    }
}

/// Produces free-form text from a prompt and message history
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Similarity index over product vectors
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Nearest `top_k` ids, best first
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SimilarityCandidate>>;

    /// Records for the given ids; unknown ids are simply absent
    async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, VectorRecord>>;

    async fn upsert(&self, record: &VectorRecord) -> Result<()>;

    /// Length every stored and queried vector must have
    fn dimension(&self) -> usize;
}

/// Authoritative product records keyed by product code
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<CatalogRecord>>;

    async fn upsert(&self, record: &NewCatalogRecord) -> Result<CatalogRecord>;
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let client = self.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || client.generate_embedding(&text))
            .await
            .map_err(|e| LicaError::Embedding(format!("Embedding task failed: {}", e)))?
            .map_err(|e| LicaError::Embedding(format!("{:#}", e)))
    }
}

#[async_trait]
impl CompletionProvider for OllamaClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let client = self.clone();
        let messages = request.to_messages();
        tokio::task::spawn_blocking(move || {
            client.chat(&messages, request.temperature, request.max_tokens)
        })
        .await
        .map_err(|e| LicaError::Generation(format!("Generation task failed: {}", e)))?
        .map_err(|e| LicaError::Generation(format!("{:#}", e)))
    }
}

#[async_trait]
impl VectorIndex for VectorStore {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SimilarityCandidate>> {
        VectorStore::query(self, vector, top_k).await
    }

    async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, VectorRecord>> {
        VectorStore::fetch(self, ids).await
    }

    async fn upsert(&self, record: &VectorRecord) -> Result<()> {
        VectorStore::upsert(self, record).await
    }

    fn dimension(&self) -> usize {
        self.vector_dimension()
    }
}

#[async_trait]
impl CatalogStore for SharedCatalog {
    async fn find_by_code(&self, code: &str) -> Result<Option<CatalogRecord>> {
        let database = self
            .database()
            .await
            .map_err(|e| LicaError::Database(format!("{:#}", e)))?;
        database
            .find_product(code)
            .await
            .map_err(|e| LicaError::Database(format!("{:#}", e)))
    }

    async fn upsert(&self, record: &NewCatalogRecord) -> Result<CatalogRecord> {
        let database = self
            .database()
            .await
            .map_err(|e| LicaError::Database(format!("{:#}", e)))?;
        database
            .upsert_product(record)
            .await
            .map_err(|e| LicaError::Database(format!("{:#}", e)))
    }
}

/// The four collaborators a conversation turn depends on, shared by handle
#[derive(Clone)]
pub struct Providers {
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub completions: Arc<dyn CompletionProvider>,
    pub vectors: Arc<dyn VectorIndex>,
    pub catalog: Arc<dyn CatalogStore>,
}

impl Providers {
    /// Wire the production collaborators from configuration
    #[inline]
    pub async fn from_config(config: &crate::config::Config) -> Result<Self> {
        let ollama = Arc::new(
            OllamaClient::new(&config.ollama)
                .map_err(|e| LicaError::Config(format!("{:#}", e)))?,
        );
        let vectors = Arc::new(VectorStore::new(config).await?);
        let catalog = Arc::new(SharedCatalog::new(config.database_path()));

        Ok(Self {
            embeddings: Arc::clone(&ollama) as Arc<dyn EmbeddingProvider>,
            completions: ollama,
            vectors,
            catalog,
        })
    }
}
