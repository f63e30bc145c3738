//! Relational source for brand knowledge
//!
//! Read-only collaborator of the pipeline: FAQ and claim rows are validated
//! at this boundary and converted into [`DocumentChunk`]s before entering
//! retrieval. Schema is managed manually via SQL files in /migrations.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ClaimRow;
use crate::models::DocumentChunk;
use crate::models::FaqRow;
use crate::rag::KnowledgeSource;
use crate::Result;

/// Database connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new database instance from configuration
    pub async fn from_config(config: &crate::config::AppConfig) -> Result<Self> {
        let pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections())
            .min_connections(config.min_connections())
            .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout()));

        let pool = pool_options.connect(config.database_url()).await?;
        Ok(Self::new(pool))
    }

    /// Get a reference to the database pool for raw queries
    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }

    /// List brand FAQ rows, optionally filtered to one brand
    pub async fn list_faqs(&self, brand_id: Option<Uuid>) -> Result<Vec<FaqRow>> {
        let rows = match brand_id {
            Some(brand_id) => {
                sqlx::query_as::<_, FaqRow>(
                    "SELECT * FROM brand_faqs WHERE brand_id = $1 ORDER BY created_at",
                )
                .bind(brand_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, FaqRow>("SELECT * FROM brand_faqs ORDER BY created_at")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows)
    }

    /// List brand claim rows, optionally filtered to one brand
    pub async fn list_claims(&self, brand_id: Option<Uuid>) -> Result<Vec<ClaimRow>> {
        let rows = match brand_id {
            Some(brand_id) => {
                sqlx::query_as::<_, ClaimRow>(
                    "SELECT * FROM brand_claims WHERE brand_id = $1 ORDER BY created_at",
                )
                .bind(brand_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ClaimRow>("SELECT * FROM brand_claims ORDER BY created_at")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows)
    }
}

#[async_trait]
impl KnowledgeSource for Database {
    /// Concatenate the FAQ and claim pools into one candidate set
    async fn load_chunks(&self, brand_id: Option<Uuid>) -> Result<Vec<DocumentChunk>> {
        let faqs = self.list_faqs(brand_id).await?;
        let claims = self.list_claims(brand_id).await?;

        let mut chunks: Vec<DocumentChunk> = Vec::with_capacity(faqs.len() + claims.len());
        chunks.extend(faqs.into_iter().map(DocumentChunk::from));
        chunks.extend(claims.into_iter().map(DocumentChunk::from));

        Ok(chunks)
    }
}
