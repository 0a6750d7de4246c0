//! Vector index capability: persists resume chunk embeddings, namespaced by resume id.
//!
//! Default: `InMemoryVectorIndex` (process-local, used in tests and when no database is set).
//! Production: `PgVectorIndex` (Postgres + pgvector via sqlx).
//!
//! `AppState` holds an `Arc<dyn VectorIndex>`, chosen at startup from config.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::screening::models::ResumeChunk;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryVectorIndex;
pub use postgres::PgVectorIndex;

/// One stored vector with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: Value,
}

impl VectorRecord {
    pub fn from_chunk(resume_id: &str, chunk: &ResumeChunk) -> Self {
        Self {
            id: chunk.id.clone(),
            vector: chunk.embedding.clone(),
            metadata: json!({
                "resume_id": resume_id,
                "section": chunk.category,
                "text": chunk.text,
            }),
        }
    }
}

/// A query hit, ordered by `score` descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    pub score: f64,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Stores `records` under `namespace`, replacing everything previously stored there.
    /// Writes to different namespaces never interfere.
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<(), AppError>;

    /// Returns the `top_k` records most similar to `vector`, optionally within one namespace.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: Option<&str>,
    ) -> Result<Vec<VectorMatch>, AppError>;
}
