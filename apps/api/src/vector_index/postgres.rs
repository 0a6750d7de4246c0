use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::vector_index::{VectorIndex, VectorMatch, VectorRecord};

/// Postgres + pgvector backed index. Vectors are bound as typed `pgvector::Vector`
/// values through its sqlx support.
#[derive(Clone)]
pub struct PgVectorIndex {
    pool: PgPool,
}

impl PgVectorIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool and makes sure the schema exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("PostgreSQL connection pool established");

        let index = Self::new(pool);
        index.ensure_schema().await?;
        Ok(index)
    }

    /// Creates the pgvector extension and the chunk table if missing.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resume_chunk_vectors (
                id TEXT PRIMARY KEY,
                resume_id TEXT NOT NULL,
                embedding VECTOR NOT NULL,
                metadata JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS resume_chunk_vectors_resume_id_idx \
             ON resume_chunk_vectors (resume_id)",
        )
        .execute(&self.pool)
        .await?;
        info!("pgvector schema ready");
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // Same-namespace upserts run one at a time; held until commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(namespace)
            .execute(&mut *tx)
            .await?;

        // Rescoring a resume supersedes its previous chunk set rather than merging with it.
        sqlx::query("DELETE FROM resume_chunk_vectors WHERE resume_id = $1")
            .bind(namespace)
            .execute(&mut *tx)
            .await?;

        for record in &records {
            sqlx::query(
                r#"
                INSERT INTO resume_chunk_vectors (id, resume_id, embedding, metadata)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO UPDATE SET
                    resume_id = EXCLUDED.resume_id,
                    embedding = EXCLUDED.embedding,
                    metadata = EXCLUDED.metadata,
                    created_at = now()
                "#,
            )
            .bind(&record.id)
            .bind(namespace)
            .bind(Vector::from(record.vector.clone()))
            .bind(&record.metadata)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Upserted {} vectors for {namespace}", records.len());
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: Option<&str>,
    ) -> Result<Vec<VectorMatch>, AppError> {
        let limit = i64::try_from(top_k)
            .map_err(|_| AppError::Validation(format!("top_k {top_k} is out of range")))?;

        let rows = sqlx::query_as::<_, (String, f64)>(
            r#"
            SELECT id, 1 - (embedding <=> $1) AS score
            FROM resume_chunk_vectors
            WHERE ($2::text IS NULL OR resume_id = $2)
            ORDER BY embedding <=> $1 ASC, id ASC
            LIMIT $3
            "#,
        )
        .bind(Vector::from(vector.to_vec()))
        .bind(namespace)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, score)| VectorMatch { id, score })
            .collect())
    }
}
