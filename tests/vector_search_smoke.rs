//! Exercises the ingestion -> retrieval round trip against a real embedding
//! model and a real on-disk LanceDB index. Ignored by default because it
//! downloads the Model2Vec model on first run; run explicitly with
//! `cargo test --test vector_search_smoke -- --ignored`.

use async_trait::async_trait;
use std::sync::Arc;

use cortex_rag::core::model::ScoredRecord;
use cortex_rag::index::adapter::VectorIndex;
use cortex_rag::pipeline::learn_text;
use cortex_rag::retrieval::{ask, AnswerSynthesizer};
use cortex_rag::AppState;

/// Synthesizer stand-in that just joins retrieved chunks, so these tests
/// don't depend on a live LLM endpoint.
struct EchoSynthesizer;

#[async_trait]
impl AnswerSynthesizer for EchoSynthesizer {
    async fn synthesize(&self, _query: &str, context: &[ScoredRecord]) -> anyhow::Result<String> {
        Ok(context
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }
}

async fn build_state_with_fresh_index() -> AppState {
    let data_dir = std::env::temp_dir().join(format!("cortex_rag_test_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&data_dir).expect("create temp data dir");
    std::env::set_var("DATA_DIR", &data_dir);
    std::env::remove_var("VECTOR_STORE_DIR");
    std::env::remove_var("EMBEDDING_CACHE_DIR");

    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("build http client");

    let mut state = AppState::new(http_client);
    let dim = state
        .embedder
        .dimension()
        .await
        .expect("load embedding model");
    let index = VectorIndex::open(&state.rag_config.resolve_vector_store_dir(), dim)
        .await
        .expect("open vector index");
    state = state.with_index(Arc::new(index));
    state
}

#[tokio::test]
#[ignore]
async fn learn_text_then_ask_recalls_seeded_fact() {
    let state = build_state_with_fresh_index().await;

    learn_text(
        &state,
        "The Alpha project is led by Dr. Smith and began in March.",
        "notes",
    )
    .await
    .expect("learn_text should succeed");

    let answer = ask(
        &state,
        &EchoSynthesizer,
        "Who leads the Alpha project?",
        None,
        None,
        None,
        None,
    )
    .await
    .expect("ask should succeed");

    assert!(
        !answer.no_information,
        "expected a grounded answer, got the no-information response"
    );
    assert!(
        answer.body.contains("Dr. Smith"),
        "answer body should surface the seeded fact: {}",
        answer.body
    );
    assert_eq!(answer.attributions.len(), 1);
    assert_eq!(answer.attributions[0].source, "notes");
}

#[tokio::test]
#[ignore]
async fn ask_against_empty_index_returns_no_information() {
    let state = build_state_with_fresh_index().await;

    let answer = ask(
        &state,
        &EchoSynthesizer,
        "What is the capital of a country that does not exist?",
        None,
        None,
        None,
        None,
    )
    .await
    .expect("ask should succeed even with nothing ingested");

    assert!(answer.no_information);
    assert!(answer.attributions.is_empty());
    assert!(answer.confidence.is_none());
}

#[tokio::test]
#[ignore]
async fn ask_filtered_on_non_matching_file_type_returns_no_information_with_filter_listed() {
    let state = build_state_with_fresh_index().await;

    learn_text(&state, "Quarterly revenue grew by twelve percent.", "finance-notes")
        .await
        .expect("learn_text should succeed");

    let answer = ask(
        &state,
        &EchoSynthesizer,
        "How did revenue change?",
        Some(".pdf"),
        None,
        None,
        None,
    )
    .await
    .expect("ask_filtered should succeed even when nothing matches");

    assert!(answer.no_information);
    assert!(answer.attributions.is_empty());
    assert_eq!(answer.applied_filters, vec!["file_type=.pdf".to_string()]);
    assert!(answer.body.contains("file_type=.pdf"));
}
