//! RAG (Retrieval-Augmented Generation) module
//!
//! End-to-end pipeline for answering questions from brand knowledge:
//! - Semantic retrieval using vector embeddings (cosine similarity, top-K)
//! - Context assembly from retrieved chunks with source labels
//! - LLM-based answer generation with a confidence heuristic
//! - Batch quality gate aggregating a pass rate over canned queries
//!
//! # Examples
//!
//! ```rust,no_run
//! use brandrag::config::AppConfig;
//! use brandrag::rag::RagPipeline;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let pipeline = RagPipeline::new(&config)?;
//!
//!     let chunks = vec![/* loaded from a knowledge source */];
//!     let response = pipeline.answer("What is the return policy?", &chunks).await?;
//!     println!("Answer: {}", response.answer);
//!     println!("Sources: {}", response.sources_used.len());
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod pipeline;
pub mod quality;
pub mod retriever;

pub use context::AssembledContext;
pub use context::ContextAssembler;
pub use pipeline::RagOptions;
pub use pipeline::RagPipeline;
pub use quality::KnowledgeSource;
pub use quality::QualityGate;
pub use retriever::cosine_similarity;
pub use retriever::retrieve;

/// Answer returned when retrieval yields zero chunks; no LLM call is made
pub const NO_RELEVANT_CONTENT_ANSWER: &str =
    "No relevant content found to answer this question.";

/// Answer recorded for every query when the candidate pool is empty
pub const NO_CONTENT_AVAILABLE_ANSWER: &str = "No content available";

/// Fallback answer when the completion response carries no text
pub const UNABLE_TO_GENERATE_ANSWER: &str = "Unable to generate an answer.";
