//! services/api/src/adapters/vocab_llm.rs
//!
//! This module contains the adapter for the vocabulary LLM.
//! It implements the `VocabularyExtractionService` port from the `core` crate against
//! any OpenAI-compatible chat endpoint (DashScope's compatible mode in production).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use bizchinese_core::{
    analysis::{extraction_prompt, parse_word_lines, recommendation_prompt},
    ports::{PortError, PortResult, VocabularyExtractionService},
};
use tracing::{info, warn};

const EXTRACT_TEMPERATURE: f32 = 0.1;
const RECOMMEND_TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 500;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `VocabularyExtractionService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiVocabularyAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiVocabularyAdapter {
    /// Creates a new `OpenAiVocabularyAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds a client pointed at `api_base` with the given key.
    pub fn client_for(api_base: &str, api_key: &str) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key);
        Client::with_config(config)
    }

    /// Sends a single-message prompt and keeps the lines that are Chinese words.
    async fn complete_words(&self, prompt: String, temperature: f32) -> PortResult<Vec<String>> {
        let messages = vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?,
        )];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(temperature)
            .max_tokens(MAX_TOKENS)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let Some(content) = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
        else {
            warn!("LLM returned no content");
            return Ok(Vec::new());
        };

        let words = parse_word_lines(&content);
        info!("LLM returned {} candidate words", words.len());
        Ok(words)
    }
}

//=========================================================================================
// `VocabularyExtractionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl VocabularyExtractionService for OpenAiVocabularyAdapter {
    async fn extract_words(&self, text: &str) -> PortResult<Vec<String>> {
        self.complete_words(extraction_prompt(text), EXTRACT_TEMPERATURE)
            .await
    }

    async fn recommend_words(&self, description: &str) -> PortResult<Vec<String>> {
        self.complete_words(recommendation_prompt(description), RECOMMEND_TEMPERATURE)
            .await
    }
}

/// Used when no LLM key is configured; every call fails with a clear message.
pub struct UnconfiguredVocabulary;

#[async_trait]
impl VocabularyExtractionService for UnconfiguredVocabulary {
    async fn extract_words(&self, _text: &str) -> PortResult<Vec<String>> {
        Err(PortError::Unexpected("LLM API key is not configured".to_string()))
    }

    async fn recommend_words(&self, _description: &str) -> PortResult<Vec<String>> {
        Err(PortError::Unexpected("LLM API key is not configured".to_string()))
    }
}
