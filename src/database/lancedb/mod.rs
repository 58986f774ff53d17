// LanceDB vector database module
// Handles product vector storage and similarity search


pub mod vector_store;

pub use vector_store::VectorStore;

use serde::{Deserialize, Serialize};

/// Product vector stored in LanceDB, one per catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Vector id, equal to the product code for records written by the admin flow
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: ProductVectorMetadata,
}

/// Descriptive text stored alongside a product vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVectorMetadata {
    /// Code of the catalog record this vector belongs to
    pub product_code: String,
    pub name: String,
    pub description: String,
    pub usage_instructions: String,
}

/// Nearest-neighbour hit returned by a similarity query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityCandidate {
    pub id: String,
    /// `None` when the index did not report a distance for this hit
    pub similarity: Option<f32>,
}

impl VectorRecord {
    #[inline]
    pub fn for_product(
        code: impl Into<String>,
        vector: Vec<f32>,
        name: impl Into<String>,
        description: impl Into<String>,
        usage_instructions: impl Into<String>,
    ) -> Self {
        let code = code.into();
        Self {
            id: code.clone(),
            vector,
            metadata: ProductVectorMetadata {
                product_code: code,
                name: name.into(),
                description: description.into(),
                usage_instructions: usage_instructions.into(),
            },
        }
    }
}
