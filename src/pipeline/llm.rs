//! Content generation: send the prompt, get the model's text back.
//!
//! This module is intentionally thin. All prompt engineering lives in
//! [`crate::prompts`] and all parsing of the reply in
//! [`crate::pipeline::extract`], so the only concerns here are the call
//! itself, its time ceiling, and turning provider failures into
//! [`PosterError::GenerationService`].
//!
//! There is exactly one call per generation and no retries: a failed call
//! fails the request and the caller decides whether to try again.

use crate::config::GenerationConfig;
use crate::error::{GenerationFailure, PosterError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Sampling settings for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: usize,
}

impl GenerationOptions {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Raw text returned by the model, with token usage when the backend reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedText {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl GeneratedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A text-generation service.
///
/// The production implementation is [`LlmContentGenerator`]; tests and
/// embedders can inject their own through
/// [`crate::config::GenerationConfigBuilder::generator`].
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Short label used in logs, stats and error messages.
    fn name(&self) -> &str;

    /// Send `prompt` as a single user turn and return the model's text.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GeneratedText, PosterError>;
}

/// [`ContentGenerator`] backed by an edgequake-llm provider.
pub struct LlmContentGenerator {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl LlmContentGenerator {
    /// Wrap a provider. `label` is usually `provider/model`.
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }
}

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    fn name(&self) -> &str {
        &self.label
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GeneratedText, PosterError> {
        let messages = vec![ChatMessage::user(prompt)];
        let completion = build_options(options);

        let response = self
            .provider
            .chat(&messages, Some(&completion))
            .await
            .map_err(|e| {
                let detail = e.to_string();
                PosterError::GenerationService {
                    provider: self.label.clone(),
                    kind: GenerationFailure::classify(&detail),
                    detail,
                }
            })?;

        Ok(GeneratedText {
            text: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }
}

/// Run the single generation call for `prompt` under the configured ceiling.
///
/// A call that exceeds `api_timeout_secs`, errors, or returns only whitespace
/// is a [`PosterError::GenerationService`].
pub async fn generate_markup(
    generator: &dyn ContentGenerator,
    prompt: &str,
    config: &GenerationConfig,
) -> Result<GeneratedText, PosterError> {
    let start = Instant::now();
    let options = GenerationOptions::from_config(config);
    let ceiling = Duration::from_secs(config.api_timeout_secs);

    let generated = match timeout(ceiling, generator.generate(prompt, &options)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "{}: no response within {}s",
                generator.name(),
                config.api_timeout_secs
            );
            Err(PosterError::GenerationService {
                provider: generator.name().to_string(),
                kind: GenerationFailure::Timeout,
                detail: format!("no response within {}s", config.api_timeout_secs),
            })
        }
    }?;

    if generated.text.trim().is_empty() {
        return Err(PosterError::GenerationService {
            provider: generator.name().to_string(),
            kind: GenerationFailure::EmptyResponse,
            detail: "the model returned no text".into(),
        });
    }

    debug!(
        "{}: {} input tokens, {} output tokens, {} chars, {:?}",
        generator.name(),
        generated.input_tokens,
        generated.output_tokens,
        generated.text.len(),
        start.elapsed()
    );
    Ok(generated)
}

/// Build `CompletionOptions` from the call's sampling settings.
fn build_options(options: &GenerationOptions) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(options.temperature),
        max_tokens: Some(options.max_tokens),
        ..Default::default()
    }
}
