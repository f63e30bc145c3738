use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Brand FAQ row as stored in the relational source
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FaqRow {
    pub id: Uuid,
    pub brand_id: Option<Uuid>,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub embedding: Option<pgvector::Vector>,
    pub created_at: DateTime<Utc>,
}

/// Brand claim row as stored in the relational source
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClaimRow {
    pub id: Uuid,
    pub brand_id: Option<Uuid>,
    pub claim_text: String,
    pub claim_type: String,
    pub embedding: Option<pgvector::Vector>,
    pub created_at: DateTime<Utc>,
}

/// A unit of retrievable knowledge
///
/// Chunks are created fresh per retrieval session and never mutated except
/// to attach a computed embedding. Chunks compared against each other or a
/// query must have embeddings of identical dimensionality; a mismatch scores
/// zero similarity rather than erroring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Opaque identifier, unique within a retrieval session
    pub id: String,
    pub content: String,
    /// Human-readable provenance label, used only for citation display
    pub source: String,
    pub embedding: Option<Vec<f32>>,
}

impl DocumentChunk {
    pub fn new(id: impl Into<String>, content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            source: source.into(),
            embedding: None,
        }
    }

    /// Attach a computed embedding
    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

impl From<FaqRow> for DocumentChunk {
    fn from(row: FaqRow) -> Self {
        Self {
            id: format!("faq:{}", row.id),
            content: format!("Q: {}\nA: {}", row.question, row.answer),
            source: row.category,
            embedding: row.embedding.map(|v| v.to_vec()),
        }
    }
}

impl From<ClaimRow> for DocumentChunk {
    fn from(row: ClaimRow) -> Self {
        Self {
            id: format!("claim:{}", row.id),
            content: row.claim_text,
            source: format!("Claim ({})", row.claim_type),
            embedding: row.embedding.map(|v| v.to_vec()),
        }
    }
}

/// A chunk paired with its similarity score against a query embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunk: DocumentChunk,
    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

/// Result of one generation query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationAnswer {
    pub query: String,
    pub answer: String,
    /// Source labels actually included in the prompt context, rank order
    pub sources_used: Vec<String>,
    /// Derived scalar in [0, 1]; see `rag::pipeline::confidence_score`
    pub confidence: f32,
    /// Token count reported by the generation call, 0 if unavailable
    pub tokens_used: u32,
}

/// Verdict for one query in a quality-gate batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub query: String,
    pub passed: bool,
    pub answer: String,
}

/// Aggregate over a batch of quality-gate queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// Fraction of queries that passed, in [0, 1]; 0 for an empty batch
    pub score: f32,
    /// One outcome per input query, same order as input
    pub results: Vec<QueryOutcome>,
}
