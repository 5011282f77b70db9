//! Configuration types for poster generation.
//!
//! Every knob of the pipeline lives in [`GenerationConfig`], built via its
//! [`GenerationConfigBuilder`]. The config is the only place a generation
//! client or renderer is chosen: nothing is read from process-global state
//! once a config has been built, so two configs can drive two different
//! providers side by side in the same process.

use crate::error::PosterError;
use crate::pipeline::llm::ContentGenerator;
use crate::pipeline::render::ArtifactRenderer;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Provider used when neither the config nor the environment names one.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Model used with [`DEFAULT_PROVIDER`].
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Configuration for a poster generation.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use club_poster::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .provider_name("openai")
///     .model("gpt-4.1-mini")
///     .temperature(0.5)
///     .build()
///     .unwrap();
/// assert_eq!(config.render.load_timeout_secs, 30);
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// LLM provider name (e.g. "gemini", "openai", "anthropic", "ollama").
    /// If None, resolved from the environment, then [`DEFAULT_PROVIDER`].
    pub provider_name: Option<String>,

    /// LLM model identifier. If None, the provider's default
    /// ([`DEFAULT_MODEL`] for gemini).
    pub model: Option<String>,

    /// Pre-constructed generation client. Takes precedence over `provider_name`.
    pub generator: Option<Arc<dyn ContentGenerator>>,

    /// Pre-constructed renderer. If None, a headless Chromium renderer is
    /// built from [`GenerationConfig::render`].
    pub renderer: Option<Arc<dyn ArtifactRenderer>>,

    /// Sampling temperature for the generation call. Default: 0.7.
    ///
    /// Posters are a creative task; the layout should vary between runs.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 8192.
    ///
    /// A full Tailwind page with every section filled in runs to several
    /// thousand tokens. Too low a limit cuts the document off before the
    /// closing fence, which surfaces as a malformed response.
    pub max_tokens: usize,

    /// Ceiling on the single generation call, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Largest accepted logo, in bytes. Default: 5 MiB.
    pub max_logo_bytes: usize,

    /// Download timeout for logo URLs in seconds. Default: 30.
    pub download_timeout_secs: u64,

    /// Headless browser settings.
    pub render: RenderConfig,

    /// Optional per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider_name: None,
            model: None,
            generator: None,
            renderer: None,
            temperature: 0.7,
            max_tokens: 8192,
            api_timeout_secs: 120,
            max_logo_bytes: 5 * 1024 * 1024,
            download_timeout_secs: 30,
            render: RenderConfig::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field(
                "generator",
                &self.generator.as_ref().map(|_| "<dyn ContentGenerator>"),
            )
            .field(
                "renderer",
                &self.renderer.as_ref().map(|_| "<dyn ArtifactRenderer>"),
            )
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_logo_bytes", &self.max_logo_bytes)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("render", &self.render)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn GenerationProgressCallback>"),
            )
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn generator(mut self, generator: Arc<dyn ContentGenerator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn ArtifactRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_logo_bytes(mut self, bytes: usize) -> Self {
        self.config.max_logo_bytes = bytes;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn render(mut self, render: RenderConfig) -> Self {
        self.config.render = render;
        self
    }

    pub fn load_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render.load_timeout_secs = secs;
        self
    }

    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.render.chrome_executable = Some(path.into());
        self
    }

    pub fn no_sandbox(mut self, v: bool) -> Self {
        self.config.render.no_sandbox = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, PosterError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(PosterError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(PosterError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.max_logo_bytes == 0 {
            return Err(PosterError::InvalidConfig(
                "max_logo_bytes must be ≥ 1".into(),
            ));
        }
        c.render.validate()?;
        Ok(self.config)
    }
}

// ── Render settings ──────────────────────────────────────────────────────

/// Settings for the headless browser session.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Ceiling on loading the markup and waiting for network idle. Default: 30.
    pub load_timeout_secs: u64,

    /// Edge of the square social viewport in CSS pixels. Default: 1080.
    pub social_canvas_px: u32,

    /// Pixel density of the social capture. Default: 2.0, i.e. a 2160×2160 PNG.
    pub device_scale_factor: f64,

    /// Print margin on every side of the A4 page, in CSS pixels. Default: 20.
    pub page_margin_px: u32,

    /// Chrome/Chromium binary. If None, chromiumoxide searches the usual places.
    pub chrome_executable: Option<PathBuf>,

    /// Pass `--no-sandbox` to the browser. Default: true (containers).
    pub no_sandbox: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            load_timeout_secs: 30,
            social_canvas_px: 1080,
            device_scale_factor: 2.0,
            page_margin_px: 20,
            chrome_executable: None,
            no_sandbox: true,
        }
    }
}

impl RenderConfig {
    /// Print margin in inches, the unit the DevTools print call expects.
    pub fn page_margin_inches(&self) -> f64 {
        f64::from(self.page_margin_px) / 96.0
    }

    fn validate(&self) -> Result<(), PosterError> {
        if self.load_timeout_secs == 0 {
            return Err(PosterError::InvalidConfig(
                "load_timeout_secs must be ≥ 1".into(),
            ));
        }
        if !(100..=4096).contains(&self.social_canvas_px) {
            return Err(PosterError::InvalidConfig(format!(
                "social_canvas_px must be 100–4096, got {}",
                self.social_canvas_px
            )));
        }
        if !(self.device_scale_factor > 0.0 && self.device_scale_factor <= 4.0) {
            return Err(PosterError::InvalidConfig(format!(
                "device_scale_factor must be in (0, 4], got {}",
                self.device_scale_factor
            )));
        }
        Ok(())
    }
}
