//! Offline integration tests for the full generation pipeline.
//!
//! The model and the browser are replaced by in-process fakes injected
//! through `GenerationConfig`, so these tests need no API key and no Chromium.
//!
//! Run with:
//!   cargo test --test pipeline

use async_trait::async_trait;
use club_poster::pipeline::{embed, extract};
use club_poster::prompts::{compose_prompt, LOGO_PLACEHOLDER};
use club_poster::{
    generate, generate_to_file, package, prepare_markup, templates, ArtifactRenderer, ClubProfile,
    ContentGenerator, ErrorCategory, GeneratedText, GenerationConfig, GenerationFailure,
    GenerationOptions, GenerationProgressCallback, GenerationRequest, LogoAsset, OutputKind,
    PackagedResponse, PipelineStage, PosterError, RenderedArtifact,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Replies with a fixed text and remembers every prompt it saw.
struct ScriptedGenerator {
    reply: Result<String, GenerationFailure>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(kind: GenerationFailure) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(kind),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<GeneratedText, PosterError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(GeneratedText {
                text: text.clone(),
                input_tokens: prompt.len() / 4,
                output_tokens: text.len() / 4,
            }),
            Err(kind) => Err(PosterError::GenerationService {
                provider: "scripted".into(),
                kind: *kind,
                detail: "connection refused".into(),
            }),
        }
    }
}

/// Returns a fixed artifact per kind and counts its calls.
#[derive(Default)]
struct CountingRenderer {
    calls: AtomicUsize,
    seen_markup: Mutex<Option<String>>,
}

impl CountingRenderer {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactRenderer for CountingRenderer {
    async fn render(&self, markup: &str, kind: OutputKind) -> Result<RenderedArtifact, PosterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen_markup.lock().unwrap() = Some(markup.to_string());
        let bytes = match kind {
            OutputKind::Document => b"%PDF-1.7\n%fake".to_vec(),
            OutputKind::Social => b"\x89PNG\r\n\x1a\nfake".to_vec(),
        };
        Ok(RenderedArtifact::new(kind, bytes))
    }
}

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl EventLog {
    fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl GenerationProgressCallback for EventLog {
    fn on_generation_start(&self, kind: &str) {
        self.0.lock().unwrap().push(format!("start:{kind}"));
    }
    fn on_stage_complete(&self, stage: PipelineStage, _elapsed_ms: u64) {
        self.0.lock().unwrap().push(format!("done:{stage:?}"));
    }
    fn on_stage_error(&self, stage: PipelineStage, _error: &str) {
        self.0.lock().unwrap().push(format!("error:{stage:?}"));
    }
    fn on_generation_complete(&self, artifact_len: usize) {
        self.0.lock().unwrap().push(format!("complete:{artifact_len}"));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

const SOCIAL_REPLY: &str = "Here is your design:\n```html\n<!DOCTYPE html>\n<html><body>\
<div class=\"w-[1080px] h-[1080px]\"><img src=\"absjd\" class=\"w-24\"/>\
<h1>Chess Club</h1></div></body></html>\n```\nEnjoy!";

fn chess_club() -> ClubProfile {
    ClubProfile {
        name: "Chess Club".into(),
        description: "We play chess".into(),
        ..Default::default()
    }
}

fn config_with(
    generator: Arc<ScriptedGenerator>,
    renderer: Arc<CountingRenderer>,
) -> GenerationConfig {
    GenerationConfig::builder()
        .generator(generator)
        .renderer(renderer)
        .build()
        .unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn social_without_logo_returns_png_and_keeps_placeholder() {
    let generator = ScriptedGenerator::replying(SOCIAL_REPLY);
    let renderer = Arc::new(CountingRenderer::default());
    let config = config_with(Arc::clone(&generator), Arc::clone(&renderer));

    let request = GenerationRequest::new(chess_club(), OutputKind::Social);
    let output = generate(&request, &config).await.unwrap();

    assert_eq!(output.artifact.content_type(), "image/png");
    assert!(output.artifact.bytes.starts_with(b"\x89PNG"));
    assert_eq!(renderer.calls(), 1);

    // The fenced block only, placeholder untouched.
    assert!(output.markup.starts_with("<!DOCTYPE html>"));
    assert!(!output.markup.contains("Enjoy"));
    assert!(output.markup.contains("src=\"absjd\""));
    assert!(!output.stats.logo_embedded);
    assert_eq!(output.stats.generator, "scripted");

    let prompt = generator.last_prompt();
    assert!(prompt.contains("Chess Club"));
    assert!(prompt.contains("We play chess"));
    assert!(prompt.contains("1080x1080"));
}

#[tokio::test]
async fn document_with_logo_inlines_data_uri_before_render() {
    let reply = "```html\n<html><body><img src=\"absjd\" alt=\"logo\"/>\
<p>Second mention of absjd stays.</p></body></html>\n```";
    let generator = ScriptedGenerator::replying(reply);
    let renderer = Arc::new(CountingRenderer::default());
    let config = config_with(Arc::clone(&generator), Arc::clone(&renderer));

    let logo = LogoAsset::new(vec![0x89, b'P', b'N', b'G'], "image/png");
    let request = GenerationRequest::new(chess_club(), OutputKind::Document).with_logo(logo);
    let output = generate(&request, &config).await.unwrap();

    assert_eq!(output.artifact.content_type(), "application/pdf");
    assert!(output.stats.logo_embedded);

    let rendered = renderer.seen_markup.lock().unwrap().clone().unwrap();
    assert_eq!(rendered, output.markup);
    assert!(rendered.contains("data:image/png;base64,iVBORw=="));
    assert_eq!(rendered.matches(LOGO_PLACEHOLDER).count(), 1);

    let prompt = generator.last_prompt();
    assert!(prompt.contains("210mm x 297mm"));
    assert!(prompt.contains(LOGO_PLACEHOLDER));
}

#[test]
fn extract_then_embed_by_hand() {
    let reply = "preamble\n```html\n<html><img src=\"absjd\"/></html>\n```\ntrailer";
    let markup = extract::extract_markup(reply).unwrap();
    assert_eq!(markup, "<html><img src=\"absjd\"/></html>\n");
    assert_eq!(extract::placeholder_count(&markup), 1);

    let logo = LogoAsset::new(b"<svg/>".to_vec(), "image/svg+xml");
    let embedded = embed::inject_logo(&markup, Some(&logo));
    assert!(embedded.contains("data:image/svg+xml;base64,PHN2Zy8+"));
    assert!(!embedded.contains(LOGO_PLACEHOLDER));

    assert_eq!(embed::inject_logo(&markup, None), markup);
}

#[tokio::test]
async fn network_failure_is_generation_service_error_and_skips_render() {
    let generator = ScriptedGenerator::failing(GenerationFailure::Network);
    let renderer = Arc::new(CountingRenderer::default());
    let config = config_with(generator, Arc::clone(&renderer));

    let request = GenerationRequest::new(chess_club(), OutputKind::Social);
    let err = generate(&request, &config).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::GenerationService);
    assert_eq!(renderer.calls(), 0);

    let response = package(Err(err), request.artifact_filename());
    assert_eq!(response.status(), 502);
    match response {
        PackagedResponse::Failure { payload, .. } => {
            assert_eq!(payload.error, "Failed to generate document");
            assert!(payload.details.contains("connection refused"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn reply_without_fence_is_malformed() {
    let generator = ScriptedGenerator::replying("<html><body>No fences here</body></html>");
    let renderer = Arc::new(CountingRenderer::default());
    let config = config_with(generator, Arc::clone(&renderer));

    let request = GenerationRequest::new(chess_club(), OutputKind::Document);
    let err = generate(&request, &config).await.unwrap_err();
    assert!(matches!(err, PosterError::MalformedResponse { .. }));
    assert_eq!(err.category(), ErrorCategory::MalformedResponse);
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn whitespace_reply_is_generation_service_error() {
    let generator = ScriptedGenerator::replying("  \n\t ");
    let renderer = Arc::new(CountingRenderer::default());
    let config = config_with(generator, renderer);

    let request = GenerationRequest::new(chess_club(), OutputKind::Social);
    let err = prepare_markup(&request, &config).await.unwrap_err();
    assert!(matches!(
        err,
        PosterError::GenerationService {
            kind: GenerationFailure::EmptyResponse,
            ..
        }
    ));
}

#[tokio::test]
async fn invalid_logo_fails_before_the_model_is_called() {
    let generator = ScriptedGenerator::replying(SOCIAL_REPLY);
    let renderer = Arc::new(CountingRenderer::default());
    let config = config_with(Arc::clone(&generator), renderer);

    let logo = LogoAsset::new(b"%PDF".to_vec(), "application/pdf");
    let request = GenerationRequest::new(chess_club(), OutputKind::Social).with_logo(logo);
    let err = generate(&request, &config).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InputValidation);
    assert!(generator.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn progress_events_follow_stage_order() {
    let generator = ScriptedGenerator::replying(SOCIAL_REPLY);
    let renderer = Arc::new(CountingRenderer::default());
    let log = Arc::new(EventLog::default());
    let config = GenerationConfig::builder()
        .generator(generator)
        .renderer(renderer)
        .progress_callback(log.clone())
        .build()
        .unwrap();

    let request = GenerationRequest::new(chess_club(), OutputKind::Social);
    let output = generate(&request, &config).await.unwrap();

    assert_eq!(
        log.events(),
        vec![
            "start:social".to_string(),
            "done:Compose".into(),
            "done:Generate".into(),
            "done:Extract".into(),
            "done:Embed".into(),
            "done:Render".into(),
            format!("complete:{}", output.artifact.len()),
        ]
    );
}

#[tokio::test]
async fn progress_reports_the_failing_stage() {
    let generator = ScriptedGenerator::replying("no markup at all");
    let renderer = Arc::new(CountingRenderer::default());
    let log = Arc::new(EventLog::default());
    let config = GenerationConfig::builder()
        .generator(generator)
        .renderer(renderer)
        .progress_callback(log.clone())
        .build()
        .unwrap();

    let request = GenerationRequest::new(chess_club(), OutputKind::Document);
    assert!(generate(&request, &config).await.is_err());

    let events = log.events();
    assert_eq!(events.last().map(String::as_str), Some("error:Extract"));
    assert!(!events.iter().any(|e| e.starts_with("complete:")));
}

#[tokio::test]
async fn generate_to_file_writes_the_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::replying(SOCIAL_REPLY);
    let renderer = Arc::new(CountingRenderer::default());
    let config = config_with(generator, renderer);

    let request = GenerationRequest::new(chess_club(), OutputKind::Document);
    assert_eq!(request.artifact_filename(), "chess-club-poster.pdf");

    let path = dir.path().join(request.artifact_filename());
    let stats = generate_to_file(&request, &path, &config).await.unwrap();

    assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
    assert!(stats.markup_bytes > 0);
    assert_eq!(stats.generator, "scripted");
}

#[tokio::test]
async fn failed_generation_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::failing(GenerationFailure::Authentication);
    let renderer = Arc::new(CountingRenderer::default());
    let config = config_with(generator, renderer);

    let request = GenerationRequest::new(chess_club(), OutputKind::Social);
    let path = dir.path().join(request.artifact_filename());
    assert!(generate_to_file(&request, &path, &config).await.is_err());
    assert!(!path.exists());
}

#[test]
fn prompt_is_deterministic_for_every_template() {
    for profile in templates::all() {
        for kind in [OutputKind::Document, OutputKind::Social] {
            let a = compose_prompt(profile, kind);
            let b = compose_prompt(profile, kind);
            assert_eq!(a, b, "{} / {kind}", profile.name);
            assert!(a.contains(&profile.name));
            assert!(a.contains(LOGO_PLACEHOLDER));
        }
    }
}
