//! services/api/src/adapters/flashcards_llm.rs
//!
//! This module contains the adapter for the flashcard-generating LLM.
//! It implements the `CompletionService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use flashcards_core::ports::{
    CompletionRequest, CompletionService, PortError, PortResult, ProviderError,
};
use std::time::Duration;
use tracing::{debug, warn};

const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 1.0;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CompletionService` using an OpenAI-compatible chat API.
#[derive(Clone)]
pub struct OpenAiFlashcardsAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiFlashcardsAdapter {
    /// Creates a new `OpenAiFlashcardsAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }
}

/// Request-building failures are our own bug, not the provider's.
fn build_error(e: OpenAIError) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Sorts a client error into the provider taxonomy.
fn classify(e: OpenAIError) -> ProviderError {
    match e {
        OpenAIError::JSONDeserialize(..) => ProviderError::MalformedResponse(e.to_string()),
        OpenAIError::ApiError(..) => ProviderError::Transport {
            code: "PROVIDER_API_ERROR".to_string(),
            message: e.to_string(),
        },
        OpenAIError::Reqwest(..) => ProviderError::Transport {
            code: "PROVIDER_TRANSPORT_ERROR".to_string(),
            message: e.to_string(),
        },
        _ => ProviderError::Transport {
            code: "PROVIDER_ERROR".to_string(),
            message: e.to_string(),
        },
    }
}

//=========================================================================================
// `CompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompletionService for OpenAiFlashcardsAdapter {
    fn model(&self) -> &str {
        &self.model
    }

    /// Sends one chat completion constrained to the requested JSON schema.
    async fn complete(&self, request: &CompletionRequest) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system_prompt.as_str())
                .build()
                .map_err(build_error)?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user_prompt.as_str())
                .build()
                .map_err(build_error)?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(TEMPERATURE)
            .top_p(TOP_P)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: request.schema_name.clone(),
                    schema: Some(request.response_schema.clone()),
                    strict: Some(false),
                },
            })
            .n(1)
            .build()
            .map_err(build_error)?;

        debug!(model = %self.model, "Sending flashcard generation request.");

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(chat_request))
            .await
            .map_err(|_| {
                warn!(timeout_secs = self.timeout.as_secs(), "Completion request timed out.");
                ProviderError::Timeout
            })?
            .map_err(classify)?;

        // Extract the text content from the first choice in the response.
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::MalformedResponse(
                    "completion contained no text content".to_string(),
                )
                .into()
            })
    }
}
