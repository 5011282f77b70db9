//! Pipeline orchestration: request in, artifact out.
//!
//! The chain is strictly linear. Each step consumes the previous step's
//! value and any failure aborts the request; nothing is retried, cached, or
//! shared with other requests. The renderer is only resolved once the markup
//! exists, so a failed generation never launches a browser.

use crate::config::{GenerationConfig, DEFAULT_MODEL, DEFAULT_PROVIDER};
use crate::error::PosterError;
use crate::output::{GenerationOutput, GenerationStats, PreparedMarkup};
use crate::pipeline::llm::{self, ContentGenerator, LlmContentGenerator};
use crate::pipeline::render::{ArtifactRenderer, ChromiumRenderer};
use crate::pipeline::{embed, extract};
use crate::progress::{PipelineStage, ProgressCallback};
use crate::prompts;
use crate::record::GenerationRequest;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Generate the artifact for `request`.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Every failure is fatal and carries its [`crate::ErrorCategory`]:
/// - invalid logo → `InputValidationError`
/// - model call failed or returned nothing → `GenerationServiceError`
/// - no fenced markup in the reply → `MalformedResponseError`
/// - page never settled → `RenderTimeoutError`
/// - browser launch or export failed → `RenderError`
pub async fn generate(
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<GenerationOutput, PosterError> {
    let total_start = Instant::now();
    let cb = config.progress_callback.as_ref();

    // ── Steps 1–4: Compose, generate, extract, embed ─────────────────────
    let prepared = prepare_markup(request, config).await?;
    let mut stats = prepared.stats;

    // ── Step 5: Render ───────────────────────────────────────────────────
    let renderer = resolve_renderer(config);
    let render_start = Instant::now();
    let artifact = tracked(
        cb,
        PipelineStage::Render,
        renderer.render(&prepared.markup, request.kind),
    )
    .await?;
    stats.render_ms = render_start.elapsed().as_millis() as u64;
    stats.total_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Generated {} ({} bytes) in {}ms",
        request.kind,
        artifact.len(),
        stats.total_ms
    );
    if let Some(cb) = cb {
        cb.on_generation_complete(artifact.len());
    }

    Ok(GenerationOutput {
        artifact,
        markup: prepared.markup,
        stats,
    })
}

/// Run every stage up to, but not including, rendering.
///
/// Returns the final markup with the logo inlined. No browser is launched,
/// which makes this the entry point for previewing or debugging the markup.
pub async fn prepare_markup(
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<PreparedMarkup, PosterError> {
    let start = Instant::now();
    let cb = config.progress_callback.as_ref();
    info!(
        "Starting {} generation for '{}'",
        request.kind, request.profile.name
    );
    if let Some(cb) = cb {
        cb.on_generation_start(request.kind.as_str());
    }

    request.validate(config.max_logo_bytes)?;

    // ── Step 1: Resolve the generation client ────────────────────────────
    let generator = resolve_generator(config)?;

    // ── Step 2: Compose the prompt ───────────────────────────────────────
    let prompt = tracked(cb, PipelineStage::Compose, async {
        Ok(prompts::compose_prompt(&request.profile, request.kind))
    })
    .await?;
    debug!("Prompt: {} chars", prompt.len());

    // ── Step 3: Generate ─────────────────────────────────────────────────
    let generate_start = Instant::now();
    let generated = tracked(
        cb,
        PipelineStage::Generate,
        llm::generate_markup(generator.as_ref(), &prompt, config),
    )
    .await?;
    let generate_ms = generate_start.elapsed().as_millis() as u64;

    // ── Step 4: Extract ──────────────────────────────────────────────────
    let extracted = tracked(cb, PipelineStage::Extract, async {
        extract::extract_markup(&generated.text)
    })
    .await?;
    let placeholder_count = extract::placeholder_count(&extracted);

    // ── Step 5: Embed the logo ───────────────────────────────────────────
    let logo = request.logo.as_ref();
    if logo.is_some() && placeholder_count != 1 {
        warn!(
            "Expected exactly one logo placeholder, found {}; {}",
            placeholder_count,
            if placeholder_count == 0 {
                "the logo will be missing"
            } else {
                "only the first is replaced"
            }
        );
    }
    let markup = tracked(cb, PipelineStage::Embed, async {
        Ok(embed::inject_logo(&extracted, logo))
    })
    .await?;

    let stats = GenerationStats {
        generator: generator.name().to_string(),
        prompt_chars: prompt.chars().count(),
        input_tokens: generated.input_tokens,
        output_tokens: generated.output_tokens,
        markup_bytes: extracted.len(),
        logo_embedded: logo.is_some() && placeholder_count > 0,
        generate_ms,
        render_ms: 0,
        total_ms: start.elapsed().as_millis() as u64,
    };

    Ok(PreparedMarkup {
        markup,
        prompt,
        placeholder_count,
        stats,
    })
}

/// Generate the artifact and write it to `output_path`.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// partial PDF or PNG behind.
pub async fn generate_to_file(
    request: &GenerationRequest,
    output_path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationStats, PosterError> {
    let output = generate(request, config).await?;
    write_atomic(output_path.as_ref(), &output.artifact.bytes).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<GenerationOutput, PosterError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PosterError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(request, config))
}

/// Write `bytes` to `path` through a sibling temp file and a rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PosterError> {
    let write_err = |source| PosterError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let ext = path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    let tmp_path = path.with_extension(ext);
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

// ── Resolution ───────────────────────────────────────────────────────────

/// Resolve the generation client, from most-specific to least-specific.
///
/// 1. **Injected client** (`config.generator`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`). The factory reads
///    the provider's API key from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **`GEMINI_API_KEY` present**: gemini with `config.model` or
///    [`DEFAULT_MODEL`].
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
///
/// Resolution runs per request from the config alone; no client is cached
/// in process-global state.
pub fn resolve_generator(
    config: &GenerationConfig,
) -> Result<Arc<dyn ContentGenerator>, PosterError> {
    // 1) Injected client takes priority
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }

    // 2) Provider name + model
    if let Some(ref name) = config.provider_name {
        let model = match config.model.as_deref() {
            Some(model) => model,
            None => default_model(name).ok_or_else(|| PosterError::ProviderNotConfigured {
                provider: name.clone(),
                hint: format!("No default model for '{name}'; set a model explicitly."),
            })?,
        };
        return named_generator(name, model);
    }

    // 3) EDGEQUAKE_LLM_PROVIDER + EDGEQUAKE_MODEL when both set
    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return named_generator(&prov, &model);
        }
    }

    // 4) Gemini when its key is present
    if std::env::var("GEMINI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return named_generator(DEFAULT_PROVIDER, model);
    }

    // 5) Whatever the environment offers
    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PosterError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;
    Ok(Arc::new(LlmContentGenerator::new(llm_provider, "auto")))
}

/// The injected renderer, or a fresh headless Chromium renderer.
pub fn resolve_renderer(config: &GenerationConfig) -> Arc<dyn ArtifactRenderer> {
    match config.renderer {
        Some(ref renderer) => Arc::clone(renderer),
        None => Arc::new(ChromiumRenderer::new(config.render.clone())),
    }
}

/// Default model for the providers we know a sensible default for.
fn default_model(provider: &str) -> Option<&'static str> {
    match provider {
        "gemini" => Some(DEFAULT_MODEL),
        "openai" => Some("gpt-4.1-mini"),
        "anthropic" => Some("claude-sonnet-4-20250514"),
        _ => None,
    }
}

fn named_generator(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn ContentGenerator>, PosterError> {
    let provider: Arc<dyn LLMProvider> =
        ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            PosterError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;
    debug!("Using {}/{}", provider_name, model);
    Ok(Arc::new(LlmContentGenerator::new(
        provider,
        format!("{provider_name}/{model}"),
    )))
}

/// Run one stage, reporting start, completion or failure to the callback.
async fn tracked<T, F>(
    cb: Option<&ProgressCallback>,
    stage: PipelineStage,
    fut: F,
) -> Result<T, PosterError>
where
    F: Future<Output = Result<T, PosterError>>,
{
    let start = Instant::now();
    if let Some(cb) = cb {
        cb.on_stage_start(stage);
    }
    let result = fut.await;
    if let Some(cb) = cb {
        match &result {
            Ok(_) => cb.on_stage_complete(stage, start.elapsed().as_millis() as u64),
            Err(e) => cb.on_stage_error(stage, &e.to_string()),
        }
    }
    result
}
