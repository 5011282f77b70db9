//! Results produced by the pipeline.

use crate::record::OutputKind;
use serde::Serialize;
use std::fmt;

/// The exported artifact: PDF bytes for a document, PNG bytes for a social image.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub kind: OutputKind,
    pub bytes: Vec<u8>,
}

impl RenderedArtifact {
    pub fn new(kind: OutputKind, bytes: Vec<u8>) -> Self {
        Self { kind, bytes }
    }

    /// MIME type matching the artifact's kind.
    pub fn content_type(&self) -> &'static str {
        self.kind.content_type()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for RenderedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedArtifact")
            .field("kind", &self.kind)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// Final markup, ready for the renderer, plus what it took to get there.
#[derive(Debug, Clone)]
pub struct PreparedMarkup {
    /// The self-contained markup document with the logo (if any) inlined.
    pub markup: String,
    /// The prompt sent to the model.
    pub prompt: String,
    /// Placeholder tokens found in the extracted markup, before injection.
    pub placeholder_count: usize,
    pub stats: GenerationStats,
}

/// Everything a full generation produced.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub artifact: RenderedArtifact,
    /// The markup the artifact was rendered from.
    pub markup: String,
    pub stats: GenerationStats,
}

/// Counters and timings for one generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    /// Name of the generation client, e.g. `gemini/gemini-2.0-flash`.
    pub generator: String,
    pub prompt_chars: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    /// Byte length of the extracted markup.
    pub markup_bytes: usize,
    pub logo_embedded: bool,
    pub generate_ms: u64,
    pub render_ms: u64,
    pub total_ms: u64,
}
