//! Complete RAG pipeline: Embed -> Retrieve -> Generate

use std::sync::Arc;

use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::embeddings::Embedder;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::llm::ChatMessage;
use crate::llm::ChatModel;
use crate::llm::LlmService;
use crate::models::DocumentChunk;
use crate::models::GenerationAnswer;
use crate::models::RetrievalResult;
use crate::rag::retriever;
use crate::rag::ContextAssembler;
use crate::rag::NO_RELEVANT_CONTENT_ANSWER;
use crate::rag::UNABLE_TO_GENERATE_ANSWER;

/// Knobs for a pipeline invocation
#[derive(Debug, Clone)]
pub struct RagOptions {
    pub top_k: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_context_length: usize,
}

impl RagOptions {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.rag.top_k,
            temperature: config.rag.temperature,
            max_tokens: config.rag.max_tokens,
            max_context_length: config.rag.max_context_length,
        }
    }
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            temperature: 0.3,
            max_tokens: 500,
            max_context_length: 4000,
        }
    }
}

/// Complete RAG pipeline over an ephemeral chunk pool
///
/// Collaborators are injected; there is no hidden global client state.
pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatModel>,
    assembler: ContextAssembler,
    options: RagOptions,
}

impl RagPipeline {
    /// Create a new pipeline from configuration
    ///
    /// # Errors
    /// - Embedding service configuration errors (missing API key, invalid endpoint)
    /// - LLM service configuration errors (missing or invalid LLM config)
    pub fn new(config: &AppConfig) -> Result<Self> {
        let embedder = Arc::new(EmbeddingService::new(config)?);
        let chat = Arc::new(LlmService::new(config)?);
        let options = RagOptions::from_app_config(config);

        Ok(Self::from_services(embedder, chat, options))
    }

    /// Create from existing services
    #[must_use]
    pub fn from_services(
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        options: RagOptions,
    ) -> Self {
        let assembler = ContextAssembler::new(options.max_context_length);

        Self {
            embedder,
            chat,
            assembler,
            options,
        }
    }

    /// Answer a query against a candidate chunk pool
    ///
    /// # Errors
    /// - Query embedding errors (no query vector means no retrieval is possible)
    /// - LLM generation errors (API failures, rate limits, invalid responses)
    pub async fn answer(&self, query: &str, chunks: &[DocumentChunk]) -> Result<GenerationAnswer> {
        info!("Processing RAG query: {}", query);

        debug!("Step 1: Embedding query");
        let query_embedding = self.embedder.embed(query).await?;

        debug!("Step 2: Retrieving top-{} chunks", self.options.top_k);
        let results = retriever::retrieve(&query_embedding, chunks, self.options.top_k);
        debug!("Retrieved {} results", results.len());

        debug!("Step 3: Generating answer");
        self.generate(query, &results).await
    }

    /// Generate an answer from already-retrieved context chunks
    ///
    /// Short-circuits on empty context: returns the fixed no-relevant-content
    /// answer with zero confidence and makes no network call. This is a
    /// defined terminal state, not an error.
    ///
    /// # Errors
    /// - LLM generation errors (API failures, rate limits, invalid responses)
    pub async fn generate(
        &self,
        query: &str,
        context_chunks: &[RetrievalResult],
    ) -> Result<GenerationAnswer> {
        if context_chunks.is_empty() {
            return Ok(GenerationAnswer {
                query: query.to_string(),
                answer: NO_RELEVANT_CONTENT_ANSWER.to_string(),
                sources_used: Vec::new(),
                confidence: 0.0,
                tokens_used: 0,
            });
        }

        let assembled = self.assembler.assemble(context_chunks);

        let messages = [
            ChatMessage::system(build_system_instruction(&assembled.context)),
            ChatMessage::user(query),
        ];

        let completion = self
            .chat
            .complete(&messages, self.options.temperature, self.options.max_tokens)
            .await?;

        let answer = completion
            .text
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| UNABLE_TO_GENERATE_ANSWER.to_string());

        let confidence = confidence_score(assembled.sources_used.len(), answer.len());

        info!("RAG query completed successfully");

        Ok(GenerationAnswer {
            query: query.to_string(),
            answer,
            sources_used: assembled.sources_used,
            confidence,
            tokens_used: completion.total_tokens,
        })
    }

    /// Get the embedder handle
    #[must_use]
    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Get the configured options
    #[must_use]
    pub const fn options(&self) -> &RagOptions {
        &self.options
    }
}

/// Confidence heuristic: `min(chunk_count / 5, 1) * (answer_len > 50 ? 1 : 0.5)`
///
/// A crude proxy, not a calibrated probability: more retrieved chunks and a
/// longer answer both raise it. The exact formula is load-bearing for the
/// quality gate's pass threshold; do not adjust it without product input.
#[must_use]
pub fn confidence_score(chunk_count: usize, answer_len: usize) -> f32 {
    let chunk_factor = (chunk_count as f32 / 5.0).min(1.0);
    let length_bonus = if answer_len > 50 { 1.0 } else { 0.5 };
    chunk_factor * length_bonus
}

/// System instruction constraining the model to the supplied context
fn build_system_instruction(context: &str) -> String {
    format!(
        r"You are an assistant answering questions about a brand using only the provided knowledge base excerpts.

Context:
{context}

Instructions:
1. Answer using only the context above
2. If the context does not cover the question, say that the information is not available
3. Be concise and factual"
    )
}
