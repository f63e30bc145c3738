//! Cross-module pipeline tests with mock collaborators
//!
//! No database or network access; the injected `Embedder` and `ChatModel`
//! seams are exercised with in-memory fakes that count their calls.

pub mod pipeline_tests;

use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;

use crate::embeddings::Embedder;
use crate::errors::BrandRagError;
use crate::errors::Result;
use crate::llm::ChatMessage;
use crate::llm::ChatModel;
use crate::llm::Completion;

/// Embedder returning canned vectors by exact text, with a call counter
pub struct MockEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dimension: usize,
    pub calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            vectors: HashMap::new(),
            dimension,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vectors.get(text).cloned().unwrap_or_else(|| {
            let mut v = vec![0.0; self.dimension];
            v[0] = 1.0;
            v
        }))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Chat model returning a fixed reply, with a call counter and optional
/// failure injection keyed on the user message content
pub struct MockChatModel {
    reply: String,
    total_tokens: u32,
    fail_on_needle: Option<String>,
    pub calls: AtomicUsize,
    pub seen_contexts: std::sync::Mutex<Vec<String>>,
}

impl MockChatModel {
    pub fn new(reply: impl Into<String>, total_tokens: u32) -> Self {
        Self {
            reply: reply.into(),
            total_tokens,
            fail_on_needle: None,
            calls: AtomicUsize::new(0),
            seen_contexts: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Fail any completion whose user message contains `needle`
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on_needle = Some(needle.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(system) = messages.iter().find(|m| m.role == "system") {
            self.seen_contexts
                .lock()
                .unwrap()
                .push(system.content.clone());
        }

        if let Some(needle) = &self.fail_on_needle {
            let user_hit = messages
                .iter()
                .any(|m| m.role == "user" && m.content.contains(needle.as_str()));
            if user_hit {
                return Err(BrandRagError::GenerationError(format!(
                    "injected failure on '{needle}'"
                )));
            }
        }

        Ok(Completion {
            text: Some(self.reply.clone()),
            total_tokens: self.total_tokens,
        })
    }
}

/// Chat model that never answers within a test-sized timeout
pub struct HangingChatModel;

#[async_trait]
impl ChatModel for HangingChatModel {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<Completion> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(Completion {
            text: None,
            total_tokens: 0,
        })
    }
}

pub fn arc<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
