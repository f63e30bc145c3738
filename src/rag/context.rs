//! Context assembly from retrieved chunks

use crate::models::RetrievalResult;

/// Context block plus the source labels that made it in, rank order
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub context: String,
    pub sources_used: Vec<String>,
}

/// Assembler for creating an LLM context block from retrieval results
pub struct ContextAssembler {
    max_context_length: usize,
}

impl ContextAssembler {
    /// Create a new context assembler
    #[must_use]
    pub const fn new(max_context_length: usize) -> Self {
        Self { max_context_length }
    }

    /// Assemble context from retrieval results
    ///
    /// Chunk contents are concatenated in rank order, each block prefixed
    /// with its source label. Appending stops once the next block would
    /// exceed the length cap; `sources_used` lists only the chunks actually
    /// included.
    #[must_use]
    pub fn assemble(&self, results: &[RetrievalResult]) -> AssembledContext {
        let mut context = String::new();
        let mut sources_used = Vec::new();
        let mut total_length = 0;

        for result in results {
            let entry = format!("\n[{}]\n{}\n", result.chunk.source, result.chunk.content);

            if total_length + entry.len() > self.max_context_length {
                break;
            }

            context.push_str(&entry);
            total_length += entry.len();
            sources_used.push(result.chunk.source.clone());
        }

        AssembledContext {
            context,
            sources_used,
        }
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(4000) // Default max context length
    }
}
