//! crates/flashcards_core/src/generation.rs
//!
//! Turns source text into flashcard proposals through the completion provider and
//! records the metadata of every attempt.

use crate::domain::{
    FlashcardSource, Generation, GenerationDetail, GenerationId, GenerationOutcome,
    NewGeneration, NewGenerationErrorLog, Page, PageRequest, Proposal,
};
use crate::error::{CoreError, CoreResult};
use crate::ports::{CompletionRequest, CompletionService, DatabaseService, ProviderError};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

const SYSTEM_PROMPT: &str = "You are an AI assistant specialized in creating high-quality flashcards from provided text.
Generate concise, clear, and effective flashcards that capture key concepts and knowledge.
Each flashcard should have a front (question/prompt) and back (answer/explanation).
Focus on important facts, definitions, concepts, and relationships.";

const USER_PROMPT_PREFIX: &str = "Generate flashcards from the following text:\n\n";

const SCHEMA_NAME: &str = "flashcards";

/// Error-log code for attempts whose proposals could not be stored.
pub const GENERATION_STORAGE_ERROR: &str = "GENERATION_STORAGE_ERROR";

/// The structured-output schema the provider must follow.
pub fn response_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "flashcards": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "front": { "type": "string" },
                        "back": { "type": "string" }
                    },
                    "required": ["front", "back"]
                }
            }
        },
        "required": ["flashcards"]
    })
}

/// Hex-encoded SHA-256 of the source text.
pub fn source_text_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

#[derive(Deserialize)]
struct RawProposal {
    front: String,
    back: String,
}

#[derive(Deserialize)]
struct RawResponse {
    flashcards: Vec<RawProposal>,
}

/// Parses the provider output, requiring a `flashcards` array of non-empty front/back pairs.
pub fn parse_proposals(raw: &str) -> Result<Vec<Proposal>, ProviderError> {
    let parsed: RawResponse = serde_json::from_str(raw)
        .map_err(|e| ProviderError::MalformedResponse(format!("missing flashcards array: {}", e)))?;

    parsed
        .flashcards
        .into_iter()
        .enumerate()
        .map(|(i, card)| {
            let front = card.front.trim();
            let back = card.back.trim();
            if front.is_empty() || back.is_empty() {
                return Err(ProviderError::MalformedResponse(format!(
                    "flashcard {} has an empty front or back",
                    i
                )));
            }
            Ok(Proposal {
                front: front.to_string(),
                back: back.to_string(),
                source: FlashcardSource::AiFull,
            })
        })
        .collect()
}

/// Orchestrates completion calls and generation bookkeeping.
#[derive(Clone)]
pub struct GenerationEngine {
    db: Arc<dyn DatabaseService>,
    completion: Arc<dyn CompletionService>,
}

impl GenerationEngine {
    pub fn new(db: Arc<dyn DatabaseService>, completion: Arc<dyn CompletionService>) -> Self {
        Self { db, completion }
    }

    /// Generates proposals for `source_text`, whose length the caller has already validated.
    ///
    /// On success exactly one generation row is written. When the provider call or the
    /// generation insert fails, no generation row exists, an error-log row is written,
    /// and the failure is returned.
    pub async fn generate(&self, user_id: Uuid, source_text: &str) -> CoreResult<GenerationOutcome> {
        let hash = source_text_hash(source_text);
        let length = source_text.chars().count() as i32;
        let model = self.completion.model().to_string();
        let started = Instant::now();

        let proposals = match self.call_provider(source_text).await {
            Ok(proposals) => proposals,
            Err(err) => {
                self.record_failure(user_id, &model, &hash, length, err.code(), &err.to_string())
                    .await;
                return Err(err.into());
            }
        };
        let elapsed_ms = started.elapsed().as_millis().min(i32::MAX as u128) as i32;

        let inserted = self
            .db
            .insert_generation(NewGeneration {
                user_id,
                model: model.clone(),
                generated_count: proposals.len() as i32,
                source_text_hash: hash.clone(),
                source_text_length: length,
                generation_duration: elapsed_ms,
            })
            .await;
        let generation = match inserted {
            Ok(generation) => generation,
            Err(err) => {
                let err = CoreError::from(err);
                self.record_failure(
                    user_id,
                    &model,
                    &hash,
                    length,
                    GENERATION_STORAGE_ERROR,
                    &err.to_string(),
                )
                .await;
                return Err(err);
            }
        };

        info!(
            generation_id = generation.id,
            generated_count = proposals.len(),
            duration_ms = elapsed_ms,
            "Generation stored."
        );

        Ok(GenerationOutcome {
            generation_id: generation.id,
            generated_count: proposals.len(),
            proposals,
        })
    }

    async fn call_provider(&self, source_text: &str) -> Result<Vec<Proposal>, ProviderError> {
        let request = CompletionRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: format!("{}{}", USER_PROMPT_PREFIX, source_text),
            schema_name: SCHEMA_NAME.to_string(),
            response_schema: response_schema(),
        };

        let raw = self.completion.complete(&request).await.map_err(|e| match e {
            crate::ports::PortError::Provider(p) => p,
            other => ProviderError::Transport {
                code: "PROVIDER_UNAVAILABLE".to_string(),
                message: other.to_string(),
            },
        })?;

        parse_proposals(&raw)
    }

    /// Writes the error-log row. A failure here is logged and swallowed so the caller
    /// still sees the original error.
    async fn record_failure(
        &self,
        user_id: Uuid,
        model: &str,
        hash: &str,
        length: i32,
        code: &str,
        message: &str,
    ) {
        warn!(code, "Generation failed: {}", message);
        let entry = NewGenerationErrorLog {
            user_id,
            error_code: code.to_string(),
            error_message: message.to_string(),
            model: model.to_string(),
            source_text_hash: hash.to_string(),
            source_text_length: length,
        };
        if let Err(log_err) = self.db.insert_generation_error_log(entry).await {
            warn!("Failed to write generation error log: {:?}", log_err);
        }
    }

    /// Generations with at least one accepted proposal, newest first.
    pub async fn list(&self, user_id: Uuid, window: PageRequest) -> CoreResult<Page<Generation>> {
        Ok(self.db.list_accepted_generations(user_id, window).await?)
    }

    pub async fn detail(&self, user_id: Uuid, id: GenerationId) -> CoreResult<GenerationDetail> {
        let generation = self
            .db
            .get_generation(user_id, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Generation {} not found", id)))?;
        let flashcards = self.db.list_generation_flashcards(user_id, id).await?;
        Ok(GenerationDetail {
            generation,
            flashcards,
        })
    }
}
