//! Pipeline-level tests: retrieval wiring, generation short-circuits,
//! sentinels, and the end-to-end retrieve-then-generate scenario

use super::arc;
use super::MockChatModel;
use super::MockEmbedder;
use crate::models::DocumentChunk;
use crate::rag::RagOptions;
use crate::rag::RagPipeline;
use crate::rag::NO_RELEVANT_CONTENT_ANSWER;
use crate::rag::UNABLE_TO_GENERATE_ANSWER;

const LONG_REPLY: &str =
    "The brand offers a 30-day return window and has been rated first in customer satisfaction.";

fn embedded_chunk(id: &str, source: &str, embedding: Vec<f32>) -> DocumentChunk {
    DocumentChunk::new(id, format!("content for {id}"), source).with_embedding(embedding)
}

#[tokio::test]
async fn test_empty_context_short_circuits_without_network_call() {
    let embedder = arc(MockEmbedder::new(2));
    let chat = arc(MockChatModel::new(LONG_REPLY, 42));
    let pipeline =
        RagPipeline::from_services(embedder.clone(), chat.clone(), RagOptions::default());

    let answer = pipeline.generate("anything", &[]).await.unwrap();

    assert_eq!(answer.answer, NO_RELEVANT_CONTENT_ANSWER);
    assert!(answer.sources_used.is_empty());
    assert_eq!(answer.confidence, 0.0);
    assert_eq!(answer.tokens_used, 0);
    assert_eq!(chat.call_count(), 0);
}

#[tokio::test]
async fn test_answer_with_no_candidates_short_circuits() {
    let embedder = arc(MockEmbedder::new(2));
    let chat = arc(MockChatModel::new(LONG_REPLY, 42));
    let pipeline =
        RagPipeline::from_services(embedder.clone(), chat.clone(), RagOptions::default());

    // Chunks exist but none carry an embedding, so retrieval yields nothing
    let chunks = vec![DocumentChunk::new("a", "text", "label")];
    let answer = pipeline.answer("a question", &chunks).await.unwrap();

    assert_eq!(answer.answer, NO_RELEVANT_CONTENT_ANSWER);
    assert_eq!(embedder.call_count(), 1); // query embedding only
    assert_eq!(chat.call_count(), 0);
}

#[tokio::test]
async fn test_empty_completion_text_falls_back_to_sentinel() {
    let embedder = arc(MockEmbedder::new(2));
    let chat = arc(MockChatModel::new("   ", 7));
    let pipeline = RagPipeline::from_services(embedder, chat, RagOptions::default());

    let chunks = vec![embedded_chunk("a", "Policies", vec![1.0, 0.0])];
    let answer = pipeline.answer("a question", &chunks).await.unwrap();

    assert_eq!(answer.answer, UNABLE_TO_GENERATE_ANSWER);
    assert_eq!(answer.tokens_used, 7);
}

#[tokio::test]
async fn test_generation_error_propagates_from_direct_call() {
    let embedder = arc(MockEmbedder::new(2));
    let chat = arc(MockChatModel::new(LONG_REPLY, 42).failing_on("doomed"));
    let pipeline = RagPipeline::from_services(embedder, chat, RagOptions::default());

    let chunks = vec![embedded_chunk("a", "Policies", vec![1.0, 0.0])];
    let result = pipeline.answer("doomed question", &chunks).await;

    assert!(matches!(
        result,
        Err(crate::BrandRagError::GenerationError(_))
    ));
}

#[tokio::test]
async fn test_end_to_end_ranked_retrieval_feeds_generation() {
    let embedder = arc(MockEmbedder::new(2).with_vector("what awards?", vec![1.0, 0.0]));
    let chat = arc(MockChatModel::new(LONG_REPLY, 42));
    let pipeline =
        RagPipeline::from_services(embedder.clone(), chat.clone(), RagOptions::default());

    // Five chunks; three carry embeddings scoring 0.95 / 0.8 / 0.6 against
    // the query vector, two are not candidates at all
    let chunks = vec![
        embedded_chunk("mid", "Claim (award)", vec![0.8, 0.6]),
        embedded_chunk("high", "Policies", vec![0.95, 0.312_25]),
        DocumentChunk::new("no-embed-1", "pending", "Pending A"),
        embedded_chunk("low", "Claim (press)", vec![0.6, 0.8]),
        DocumentChunk::new("no-embed-2", "pending", "Pending B"),
    ];

    let answer = pipeline.answer("what awards?", &chunks).await.unwrap();

    // All three valid candidates made it into the prompt, in rank order
    assert_eq!(
        answer.sources_used,
        vec!["Policies", "Claim (award)", "Claim (press)"]
    );
    assert_eq!(answer.answer, LONG_REPLY);
    assert_eq!(answer.tokens_used, 42);

    // 3 chunks, long answer: 3/5 * 1.0
    assert!((answer.confidence - 0.6).abs() < 1e-6);

    // The generation call saw exactly the three candidates, ranked
    assert_eq!(chat.call_count(), 1);
    let contexts = chat.seen_contexts.lock().unwrap();
    let context = &contexts[0];
    assert!(context.contains("[Policies]"));
    assert!(context.contains("[Claim (award)]"));
    assert!(context.contains("[Claim (press)]"));
    assert!(!context.contains("Pending A"));
    assert!(
        context.find("[Policies]").unwrap() < context.find("[Claim (award)]").unwrap()
            && context.find("[Claim (award)]").unwrap() < context.find("[Claim (press)]").unwrap()
    );
}

#[tokio::test]
async fn test_top_k_limits_generation_context() {
    let embedder = arc(MockEmbedder::new(2).with_vector("q", vec![1.0, 0.0]));
    let chat = arc(MockChatModel::new(LONG_REPLY, 1));
    let options = RagOptions {
        top_k: 2,
        ..RagOptions::default()
    };
    let pipeline = RagPipeline::from_services(embedder, chat, options);

    let chunks = vec![
        embedded_chunk("a", "s1", vec![0.9, 0.436]),
        embedded_chunk("b", "s2", vec![0.8, 0.6]),
        embedded_chunk("c", "s3", vec![0.7, 0.714]),
    ];

    let answer = pipeline.answer("q", &chunks).await.unwrap();

    assert_eq!(answer.sources_used, vec!["s1", "s2"]);
}
