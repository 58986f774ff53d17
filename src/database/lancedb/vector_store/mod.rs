
use super::{ProductVectorMetadata, SimilarityCandidate, VectorRecord};
use crate::{LicaError, config::Config};
use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType, Table,
    query::{ExecutableQuery, QueryBase},
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const TABLE_NAME: &str = "products";

/// Product vector index backed by LanceDB
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    vector_dimension: usize,
}

impl VectorStore {
    /// Open (or create) the vector store configured for this installation
    #[inline]
    pub async fn new(config: &Config) -> Result<Self, LicaError> {
        Self::open(
            &config.vector_database_path(),
            config.ollama.embedding_dimension as usize,
        )
        .await
    }

    /// Open the vector store at `db_path`, creating the products table with
    /// `vector_dimension` columns when it does not exist yet
    #[inline]
    pub async fn open(db_path: &Path, vector_dimension: usize) -> Result<Self, LicaError> {
        debug!("Initializing LanceDB at path: {:?}", db_path);

        std::fs::create_dir_all(db_path).map_err(|e| {
            LicaError::VectorStore(format!("Failed to create vector database directory: {}", e))
        })?;

        let uri = db_path.to_string_lossy().to_string();
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| LicaError::VectorStore(format!("Failed to connect to LanceDB: {}", e)))?;

        let mut store = Self {
            connection,
            table_name: TABLE_NAME.to_string(),
            vector_dimension,
        };
        store.initialize_table().await?;

        info!(
            "Vector store initialized with {} dimensions",
            store.vector_dimension
        );
        Ok(store)
    }

    #[inline]
    pub fn vector_dimension(&self) -> usize {
        self.vector_dimension
    }

    async fn initialize_table(&mut self) -> Result<(), LicaError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| LicaError::VectorStore(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&self.table_name) {
            let existing = self.detect_existing_vector_dimension().await?;
            if existing != self.vector_dimension {
                warn!(
                    "Configured embedding dimension {} differs from stored table dimension {}, using the stored one",
                    self.vector_dimension, existing
                );
                self.vector_dimension = existing;
            }
            return Ok(());
        }

        info!(
            "Creating products table with {} dimensions",
            self.vector_dimension
        );

        self.connection
            .create_empty_table(&self.table_name, self.create_schema())
            .execute()
            .await
            .map_err(|e| LicaError::VectorStore(format!("Failed to create table: {}", e)))?;

        Ok(())
    }

    async fn detect_existing_vector_dimension(&self) -> Result<usize, LicaError> {
        let schema = self
            .open_table()
            .await?
            .schema()
            .await
            .map_err(|e| LicaError::VectorStore(format!("Failed to get table schema: {}", e)))?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(*size as usize);
                }
            }
        }

        Err(LicaError::VectorStore(
            "Could not find vector column or determine dimension".to_string(),
        ))
    }

    fn create_schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.vector_dimension as i32,
                ),
                false,
            ),
            Field::new("product_code", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, false),
            Field::new("description", DataType::Utf8, false),
            Field::new("usage_instructions", DataType::Utf8, false),
            Field::new("updated_at", DataType::Utf8, false),
        ]))
    }

    async fn open_table(&self) -> Result<Table, LicaError> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| LicaError::VectorStore(format!("Failed to open table: {}", e)))
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), LicaError> {
        if vector.len() == self.vector_dimension {
            Ok(())
        } else {
            Err(LicaError::VectorStore(format!(
                "Vector has {} dimensions, index expects {}",
                vector.len(),
                self.vector_dimension
            )))
        }
    }

    /// Insert the record, replacing any stored record with the same id
    #[inline]
    pub async fn upsert(&self, record: &VectorRecord) -> Result<(), LicaError> {
        self.check_dimension(&record.vector)?;
        debug!("Upserting vector {}", record.id);

        let record_batch = self.create_record_batch(std::slice::from_ref(record))?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        let table = self.open_table().await?;
        let mut merge_insert = table.merge_insert(&["id"]);
        merge_insert
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge_insert
            .execute(Box::new(reader))
            .await
            .map_err(|e| LicaError::VectorStore(format!("Failed to upsert vector: {}", e)))?;

        info!("Stored vector for product {}", record.metadata.product_code);
        Ok(())
    }

    fn create_record_batch(&self, records: &[VectorRecord]) -> Result<RecordBatch, LicaError> {
        let len = records.len();
        let now = Utc::now().to_rfc3339();

        let mut flat_values = Vec::with_capacity(len * self.vector_dimension);
        for record in records {
            flat_values.extend_from_slice(&record.vector);
        }
        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let vector_array = FixedSizeListArray::try_new(
            field,
            self.vector_dimension as i32,
            Arc::new(values_array),
            None,
        )
        .map_err(|e| LicaError::VectorStore(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.id.as_str()),
            )),
            Arc::new(vector_array),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.metadata.product_code.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.metadata.name.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.metadata.description.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.metadata.usage_instructions.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|_| now.as_str()),
            )),
        ];

        RecordBatch::try_new(self.create_schema(), arrays)
            .map_err(|e| LicaError::VectorStore(format!("Failed to create record batch: {}", e)))
    }

    /// Return the `top_k` nearest products by cosine similarity, best first
    #[inline]
    pub async fn query(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SimilarityCandidate>, LicaError> {
        self.check_dimension(query_vector)?;
        debug!("Searching for similar vectors with top_k: {}", top_k);

        let table = self.open_table().await?;
        let mut results = table
            .vector_search(query_vector)
            .map_err(|e| LicaError::VectorStore(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(top_k)
            .execute()
            .await
            .map_err(|e| LicaError::VectorStore(format!("Failed to execute search: {}", e)))?;

        let mut candidates = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| LicaError::VectorStore(format!("Failed to read result stream: {}", e)))?
        {
            let ids = string_column(&batch, "id")?;
            let distances = batch
                .column_by_name("_distance")
                .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

            for row in 0..batch.num_rows() {
                let similarity = distances
                    .filter(|d| !d.is_null(row))
                    .map(|d| similarity_from_distance(d.value(row)));
                candidates.push(SimilarityCandidate {
                    id: ids.value(row).to_string(),
                    similarity,
                });
            }
        }

        debug!("Vector search returned {} candidates", candidates.len());
        Ok(candidates)
    }

    /// Fetch full records by id. Ids with no stored record are absent from the map.
    #[inline]
    pub async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, VectorRecord>, LicaError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let table = self.open_table().await?;
        let mut results = table
            .query()
            .only_if(id_filter(ids))
            .limit(ids.len())
            .execute()
            .await
            .map_err(|e| LicaError::VectorStore(format!("Failed to fetch vectors: {}", e)))?;

        let mut records = HashMap::with_capacity(ids.len());
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| LicaError::VectorStore(format!("Failed to read result stream: {}", e)))?
        {
            for record in parse_record_batch(&batch)? {
                records.insert(record.id.clone(), record);
            }
        }

        debug!("Fetched {}/{} vector records", records.len(), ids.len());
        Ok(records)
    }

    /// Delete the record with the given id, returning whether it existed
    #[inline]
    pub async fn delete(&self, id: &str) -> Result<bool, LicaError> {
        let existed = !self.fetch(&[id.to_string()]).await?.is_empty();
        if existed {
            self.open_table()
                .await?
                .delete(&id_filter(&[id.to_string()]))
                .await
                .map_err(|e| LicaError::VectorStore(format!("Failed to delete vector: {}", e)))?;
            info!("Deleted vector {}", id);
        }
        Ok(existed)
    }

    /// Get the total number of stored product vectors
    #[inline]
    pub async fn count(&self) -> Result<u64, LicaError> {
        let count = self
            .open_table()
            .await?
            .count_rows(None)
            .await
            .map_err(|e| LicaError::VectorStore(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }
}

/// Cosine distance spans [0, 2]; similarity is reported in [0, 1]
fn similarity_from_distance(distance: f32) -> f32 {
    (1.0 - distance).clamp(0.0, 1.0)
}

fn id_filter(ids: &[String]) -> String {
    let quoted: Vec<String> = ids
        .iter()
        .map(|id| format!("'{}'", id.replace('\'', "''")))
        .collect();
    format!("id IN ({})", quoted.join(", "))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, LicaError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| LicaError::VectorStore(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| LicaError::VectorStore(format!("Invalid {} column type", name)))
}

fn parse_record_batch(batch: &RecordBatch) -> Result<Vec<VectorRecord>, LicaError> {
    let ids = string_column(batch, "id")?;
    let product_codes = string_column(batch, "product_code")?;
    let names = string_column(batch, "name")?;
    let descriptions = string_column(batch, "description")?;
    let usage = string_column(batch, "usage_instructions")?;
    let vectors = batch
        .column_by_name("vector")
        .ok_or_else(|| LicaError::VectorStore("Missing vector column".to_string()))?
        .as_any()
        .downcast_ref::<FixedSizeListArray>()
        .ok_or_else(|| LicaError::VectorStore("Invalid vector column type".to_string()))?;

    let mut records = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let values = vectors.value(row);
        let vector = values
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| LicaError::VectorStore("Invalid vector item type".to_string()))?
            .values()
            .to_vec();

        records.push(VectorRecord {
            id: ids.value(row).to_string(),
            vector,
            metadata: ProductVectorMetadata {
                product_code: product_codes.value(row).to_string(),
                name: names.value(row).to_string(),
                description: descriptions.value(row).to_string(),
                usage_instructions: usage.value(row).to_string(),
            },
        });
    }

    Ok(records)
}
