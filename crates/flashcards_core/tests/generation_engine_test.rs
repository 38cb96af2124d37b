//! Generation engine behaviour against in-memory ports.

mod support;

use flashcards_core::generation::{source_text_hash, GENERATION_STORAGE_ERROR};
use flashcards_core::{
    CoreError, FlashcardSource, GenerationEngine, NewFlashcard, PageRequest, ProviderError,
};
use std::sync::Arc;
use support::{source_text, InMemoryDb, MockCompletionService};
use uuid::Uuid;

const THREE_CARDS: &str = r#"{"flashcards":[
    {"front":"What is ownership?","back":"A set of rules for memory management."},
    {"front":"What is borrowing?","back":"Referencing without taking ownership."},
    {"front":"What is a lifetime?","back":"The scope a reference is valid for."}
]}"#;

#[tokio::test]
async fn successful_generation_stores_one_row_with_matching_count() {
    let db = Arc::new(InMemoryDb::new());
    let provider = Arc::new(MockCompletionService::responding(THREE_CARDS));
    let engine = GenerationEngine::new(db.clone(), provider.clone());
    let user = Uuid::new_v4();
    let text = source_text();

    let outcome = engine.generate(user, &text).await.unwrap();

    assert_eq!(outcome.generated_count, 3);
    assert_eq!(outcome.proposals.len(), outcome.generated_count);
    assert!(outcome
        .proposals
        .iter()
        .all(|p| p.source == FlashcardSource::AiFull));
    assert_eq!(db.generation_count(), 1);

    let row = db.generation(outcome.generation_id);
    assert_eq!(row.user_id, user);
    assert_eq!(row.generated_count, 3);
    assert_eq!(row.model, "mock-model");
    assert_eq!(row.source_text_hash, source_text_hash(&text));
    assert_eq!(row.source_text_length as usize, text.chars().count());
    assert!(row.generation_duration.is_some());
    assert_eq!(row.total_accepted(), 0);
    assert!(db.error_logs().is_empty());
}

#[tokio::test]
async fn provider_receives_prompt_and_schema() {
    let db = Arc::new(InMemoryDb::new());
    let provider = Arc::new(MockCompletionService::responding(THREE_CARDS));
    let engine = GenerationEngine::new(db, provider.clone());
    let text = source_text();

    engine.generate(Uuid::new_v4(), &text).await.unwrap();

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].user_prompt.ends_with(&text));
    assert_eq!(calls[0].schema_name, "flashcards");
    assert_eq!(calls[0].response_schema["required"][0], "flashcards");
    assert!(calls[0].system_prompt.contains("flashcards"));
}

#[tokio::test]
async fn provider_failure_is_logged_and_leaves_no_generation() {
    let db = Arc::new(InMemoryDb::new());
    let provider = Arc::new(MockCompletionService::failing(ProviderError::Timeout));
    let engine = GenerationEngine::new(db.clone(), provider);
    let user = Uuid::new_v4();
    let text = source_text();

    let err = engine.generate(user, &text).await.unwrap_err();

    assert!(matches!(err, CoreError::Provider(ProviderError::Timeout)));
    assert_eq!(db.generation_count(), 0);
    let logs = db.error_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].user_id, user);
    assert_eq!(logs[0].error_code, "PROVIDER_TIMEOUT");
    assert_eq!(logs[0].model, "mock-model");
    assert_eq!(logs[0].source_text_hash, source_text_hash(&text));
    assert_eq!(logs[0].source_text_length as usize, text.chars().count());
}

#[tokio::test]
async fn malformed_response_is_a_provider_format_error() {
    let db = Arc::new(InMemoryDb::new());
    let provider = Arc::new(MockCompletionService::responding(r#"{"cards":[]}"#));
    let engine = GenerationEngine::new(db.clone(), provider);

    let err = engine.generate(Uuid::new_v4(), &source_text()).await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::Provider(ProviderError::MalformedResponse(_))
    ));
    assert_eq!(db.generation_count(), 0);
    assert_eq!(db.error_logs()[0].error_code, "PROVIDER_FORMAT_ERROR");
}

#[tokio::test]
async fn failed_generation_insert_is_logged() {
    let db = Arc::new(InMemoryDb {
        fail_generation_insert: true,
        ..InMemoryDb::default()
    });
    let provider = Arc::new(MockCompletionService::responding(THREE_CARDS));
    let engine = GenerationEngine::new(db.clone(), provider);
    let user = Uuid::new_v4();
    let text = source_text();

    let err = engine.generate(user, &text).await.unwrap_err();

    assert!(matches!(err, CoreError::Storage { .. }));
    assert_eq!(db.generation_count(), 0);
    let logs = db.error_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].user_id, user);
    assert_eq!(logs[0].error_code, GENERATION_STORAGE_ERROR);
    assert_eq!(logs[0].source_text_hash, source_text_hash(&text));
}

#[tokio::test]
async fn error_log_failure_does_not_mask_provider_error() {
    let db = Arc::new(InMemoryDb {
        fail_error_log: true,
        ..InMemoryDb::default()
    });
    let provider = Arc::new(MockCompletionService::failing(ProviderError::Transport {
        code: "502".to_string(),
        message: "bad gateway".to_string(),
    }));
    let engine = GenerationEngine::new(db, provider);

    let err = engine.generate(Uuid::new_v4(), &source_text()).await.unwrap_err();
    assert_eq!(err.code(), "502");
}

#[tokio::test]
async fn listing_only_shows_generations_with_accepted_cards() {
    let db = Arc::new(InMemoryDb::new());
    let provider = Arc::new(MockCompletionService::responding(THREE_CARDS));
    let engine = GenerationEngine::new(db.clone(), provider);
    let curation = flashcards_core::CurationEngine::new(db.clone());
    let user = Uuid::new_v4();

    let kept = engine.generate(user, &source_text()).await.unwrap();
    let _ignored = engine.generate(user, &source_text()).await.unwrap();

    curation
        .create_batch(
            user,
            &[NewFlashcard {
                front: "Q".to_string(),
                back: "A".to_string(),
                source: FlashcardSource::AiFull,
                generation_id: Some(kept.generation_id),
            }],
        )
        .await
        .unwrap();

    let page = engine.list(user, PageRequest::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, kept.generation_id);
}

#[tokio::test]
async fn detail_is_scoped_to_owner() {
    let db = Arc::new(InMemoryDb::new());
    let provider = Arc::new(MockCompletionService::responding(THREE_CARDS));
    let engine = GenerationEngine::new(db.clone(), provider);
    let owner = Uuid::new_v4();

    let outcome = engine.generate(owner, &source_text()).await.unwrap();

    let detail = engine.detail(owner, outcome.generation_id).await.unwrap();
    assert_eq!(detail.generation.id, outcome.generation_id);
    assert!(detail.flashcards.is_empty());

    let err = engine
        .detail(Uuid::new_v4(), outcome.generation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}
