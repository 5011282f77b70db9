//! # club-poster
//!
//! Turn a club profile into a print-ready A4 poster (PDF) or a square social
//! media image (PNG) by having a language model write the page and a headless
//! browser render it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ClubProfile + OutputKind (+ logo)
//!  │
//!  ├─ 1. Compose  prompt with every non-empty field and the layout rules
//!  ├─ 2. Generate one call to gemini / openai / anthropic / …
//!  ├─ 3. Extract  the fenced markup document from the reply
//!  ├─ 4. Embed    the logo as a data URI at the placeholder
//!  ├─ 5. Render   fresh headless Chromium → A4 PDF or 1080×1080@2x PNG
//!  └─ 6. Package  bytes + content type, or a categorised error
//! ```
//!
//! Every stage fails fast; nothing is retried, cached or shared between
//! requests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use club_poster::{generate, ClubProfile, GenerationConfig, GenerationRequest, OutputKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let profile = ClubProfile {
//!         name: "Chess Club".into(),
//!         description: "We play chess every Tuesday.".into(),
//!         ..Default::default()
//!     };
//!     let request = GenerationRequest::new(profile, OutputKind::Social);
//!     let output = generate(&request, &GenerationConfig::default()).await?;
//!     std::fs::write("chess-club-social.png", &output.artifact.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `club-poster` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `server` | on      | Enables [`server`]: `POST /api/generate` on actix-web |
//!
//! Disable both when using only the library:
//! ```toml
//! club-poster = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod response;
#[cfg(feature = "server")]
pub mod server;
pub mod templates;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder, RenderConfig};
pub use error::{ErrorCategory, GenerationFailure, PosterError, RenderStage};
pub use generate::{generate, generate_sync, generate_to_file, prepare_markup};
pub use output::{GenerationOutput, GenerationStats, PreparedMarkup, RenderedArtifact};
pub use pipeline::llm::{ContentGenerator, GeneratedText, GenerationOptions, LlmContentGenerator};
pub use pipeline::render::{ArtifactRenderer, ChromiumRenderer};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, PipelineStage};
pub use record::{Audience, ClubProfile, GenerationRequest, LogoAsset, OutputKind, SocialHandles};
pub use response::{package, ErrorPayload, PackagedResponse};
