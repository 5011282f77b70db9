//! Progress-callback trait for per-stage generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to follow a
//! generation through its stages. The CLI drives a spinner with it; a server
//! could forward the events to a websocket.
//!
//! # Example
//!
//! ```rust
//! use club_poster::{GenerationConfig, GenerationProgressCallback, PipelineStage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl GenerationProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: PipelineStage) {
//!         eprintln!("{stage}…");
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// The stages of one generation, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Building the prompt from the profile.
    Compose,
    /// Waiting for the model.
    Generate,
    /// Pulling the markup out of the model's reply.
    Extract,
    /// Inlining the logo.
    Embed,
    /// Loading the markup in the headless browser and exporting.
    Render,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 5] = [
        Self::Compose,
        Self::Generate,
        Self::Extract,
        Self::Embed,
        Self::Render,
    ];
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compose => "composing prompt",
            Self::Generate => "generating markup",
            Self::Extract => "extracting markup",
            Self::Embed => "embedding logo",
            Self::Render => "rendering",
        })
    }
}

/// Called by the pipeline as it enters and leaves each stage.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Stages run strictly one after another, so events
/// never overlap for a single generation; a shared callback may still see
/// concurrent generations and must be `Send + Sync`.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once before the first stage.
    fn on_generation_start(&self, kind: &str) {
        let _ = kind;
    }

    /// Called when a stage begins.
    fn on_stage_start(&self, stage: PipelineStage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    ///
    /// # Arguments
    /// * `stage`     : the finished stage
    /// * `elapsed_ms`: wall-clock time spent in it
    fn on_stage_complete(&self, stage: PipelineStage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a stage fails. No further stage runs afterwards.
    fn on_stage_error(&self, stage: PipelineStage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after the artifact is ready.
    ///
    /// # Arguments
    /// * `artifact_len`: byte length of the exported PDF or PNG
    fn on_generation_complete(&self, artifact_len: usize) {
        let _ = artifact_len;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
