//! Embedding generation service with preprocessing and batch processing

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::client::EmbeddingClient;
use super::client::EmbeddingProvider;
use super::Embedder;
use super::EmbeddingConfig;
use super::MAX_BATCH_SIZE;
use crate::errors::BrandRagError;
use crate::errors::Result;
use crate::models::DocumentChunk;

/// Service for generating embeddings
pub struct EmbeddingService {
    client: Arc<EmbeddingClient>,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a new embedding service
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let embedding_config = EmbeddingConfig::from_app_config(config);
        Self::from_config(embedding_config)
    }

    /// Create from custom config
    pub fn from_config(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::new(
            config.provider,
            config.model.clone(),
            config.endpoint.clone(),
            config.api_key.clone(),
        )?;

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Generate embedding for a single text
    ///
    /// Newlines are flattened to spaces before the call. Empty or
    /// whitespace-only input returns a zero-valued vector of the configured
    /// dimension without any network call.
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        match preprocess_text(text) {
            Some(processed) => self.client.generate(&processed).await,
            None => Ok(vec![0.0; self.config.dimension]),
        }
    }

    /// Generate embeddings for multiple texts in batch
    ///
    /// Splits the input into `MAX_BATCH_SIZE` chunks. Empty texts are not
    /// sent to the API; zero vectors are inserted at their positions so the
    /// output always matches the input length and order.
    pub async fn generate_batch(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut processed_texts = Vec::new();
        let mut empty_positions = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match preprocess_text(text) {
                Some(processed) => processed_texts.push(processed),
                None => empty_positions.push(i),
            }
        }

        let mut embeddings = if processed_texts.is_empty() {
            Vec::new()
        } else if processed_texts.len() <= MAX_BATCH_SIZE {
            self.client
                .generate_batch(
                    processed_texts
                        .iter()
                        .map(std::string::String::as_str)
                        .collect(),
                )
                .await?
        } else {
            let mut all_embeddings = Vec::new();
            for chunk in processed_texts.chunks(MAX_BATCH_SIZE) {
                let chunk_embeddings = self
                    .client
                    .generate_batch(chunk.iter().map(std::string::String::as_str).collect())
                    .await?;
                all_embeddings.extend(chunk_embeddings);
            }
            all_embeddings
        };

        // Insert zero vectors for empty texts at correct positions
        let zero_vector = vec![0.0; self.config.dimension];
        for pos in &empty_positions {
            embeddings.insert(*pos, zero_vector.clone());
        }

        Ok(embeddings)
    }

    /// Get the embedding dimension
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Get the model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the provider
    #[must_use]
    pub const fn provider(&self) -> EmbeddingProvider {
        self.config.provider
    }
}

#[async_trait]
impl Embedder for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.generate(text).await
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

/// Flatten newlines and trim; `None` for empty or whitespace-only input
fn preprocess_text(text: &str) -> Option<String> {
    let processed = text.replace(['\n', '\r'], " ");
    let trimmed = processed.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A candidate pool with embeddings attached, plus an audit of exclusions
#[derive(Debug)]
pub struct EmbeddedPool {
    /// Chunks that carry an embedding, input order preserved
    pub chunks: Vec<DocumentChunk>,
    /// Chunk ids that failed to embed, with the error that dropped them
    pub dropped: Vec<(String, BrandRagError)>,
}

impl EmbeddedPool {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Attach embeddings to every chunk lacking one
///
/// Chunks that already carry an embedding pass through untouched. A chunk
/// that fails to embed is excluded from the pool and recorded in `dropped`
/// so callers can audit how many candidates were lost; a single failure is
/// never fatal for the batch.
pub async fn embed_chunks(embedder: &dyn Embedder, chunks: Vec<DocumentChunk>) -> EmbeddedPool {
    let mut embedded = Vec::with_capacity(chunks.len());
    let mut dropped = Vec::new();

    for chunk in chunks {
        if chunk.embedding.is_some() {
            embedded.push(chunk);
            continue;
        }

        match embedder.embed(&chunk.content).await {
            Ok(embedding) => embedded.push(chunk.with_embedding(embedding)),
            Err(e) => {
                warn!("Failed to embed chunk {}: {}", chunk.id, e);
                dropped.push((chunk.id, e));
            }
        }
    }

    EmbeddedPool {
        chunks: embedded,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    #[test]
    fn test_preprocess_flattens_newlines() {
        assert_eq!(
            preprocess_text("Q: hi\nA: hello").as_deref(),
            Some("Q: hi A: hello")
        );
    }

    #[test]
    fn test_preprocess_empty_text() {
        assert!(preprocess_text("").is_none());
        assert!(preprocess_text("  \n ").is_none());
    }

    struct FlakyEmbedder {
        calls: AtomicUsize,
        fail_on: usize,
    }

    #[async_trait]
    impl Embedder for FlakyEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == self.fail_on {
                Err(BrandRagError::EmbeddingError("rate limited".to_string()))
            } else {
                Ok(vec![1.0, 0.0])
            }
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn test_embed_chunks_drops_failures_and_continues() {
        let embedder = FlakyEmbedder {
            calls: AtomicUsize::new(0),
            fail_on: 1,
        };
        let chunks = vec![
            DocumentChunk::new("a", "first", "s1"),
            DocumentChunk::new("b", "second", "s2"),
            DocumentChunk::new("c", "third", "s3"),
        ];

        let pool = embed_chunks(&embedder, chunks).await;

        assert_eq!(pool.chunks.len(), 2);
        assert_eq!(pool.dropped.len(), 1);
        assert_eq!(pool.dropped[0].0, "b");
        assert!(pool.chunks.iter().all(|c| c.embedding.is_some()));
    }

    #[tokio::test]
    async fn test_embed_chunks_skips_precomputed() {
        let embedder = FlakyEmbedder {
            calls: AtomicUsize::new(0),
            fail_on: usize::MAX,
        };
        let chunks = vec![DocumentChunk::new("a", "first", "s1").with_embedding(vec![0.5, 0.5])];

        let pool = embed_chunks(&embedder, chunks).await;

        assert_eq!(pool.chunks.len(), 1);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(pool.chunks[0].embedding, Some(vec![0.5, 0.5]));
    }
}
