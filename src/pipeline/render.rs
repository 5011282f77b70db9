//! Headless rendering: markup → PDF or PNG via Chromium.
//!
//! Every call launches its own browser with its own profile directory and
//! tears it down before returning, whether the export succeeded or not.
//! Nothing is pooled or shared between requests.
//!
//! ## Session lifecycle
//!
//! ```text
//! launch ──▶ navigate + wait for networkIdle ──▶ export ──▶ close
//!             (bounded by load_timeout_secs)               (always)
//! ```
//!
//! The markup is written to a temporary `.html` file and opened through a
//! `file://` URL, so relative loads behave like a real page and the CDN
//! stylesheet the prompt asks for is fetched normally. "Settled" means
//! Chromium's `networkIdle` lifecycle event for that navigation: no request
//! in flight for 500 ms.

use crate::config::RenderConfig;
use crate::error::{PosterError, RenderStage};
use crate::output::RenderedArtifact;
use crate::record::OutputKind;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::dom::{Rect, Rgba};
use chromiumoxide::cdp::browser_protocol::emulation::SetDefaultBackgroundColorOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, EventLifecycleEvent, NavigateParams,
    PrintToPdfParams, Viewport as ClipRegion,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use std::io::Write;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A4 sheet in inches, the unit `Page.printToPDF` expects.
const A4_INCHES: (f64, f64) = (8.27, 11.69);

/// Turns final markup into the exported artifact.
///
/// The production implementation is [`ChromiumRenderer`]; tests inject fakes
/// through [`crate::config::GenerationConfigBuilder::renderer`].
#[async_trait]
pub trait ArtifactRenderer: Send + Sync {
    async fn render(&self, markup: &str, kind: OutputKind)
        -> Result<RenderedArtifact, PosterError>;
}

/// [`ArtifactRenderer`] that drives a fresh headless Chromium per call.
#[derive(Debug, Clone, Default)]
pub struct ChromiumRenderer {
    config: RenderConfig,
}

impl ChromiumRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ArtifactRenderer for ChromiumRenderer {
    async fn render(
        &self,
        markup: &str,
        kind: OutputKind,
    ) -> Result<RenderedArtifact, PosterError> {
        let session = BrowserSession::launch(&self.config, kind).await?;
        let exported = session.capture(markup, kind, &self.config).await;
        session.close().await;

        let bytes = exported?;
        if bytes.is_empty() {
            return Err(PosterError::Render {
                stage: RenderStage::Export,
                detail: "browser returned an empty artifact".into(),
            });
        }
        info!("Rendered {} artifact: {} bytes", kind, bytes.len());
        Ok(RenderedArtifact::new(kind, bytes))
    }
}

// ── Browser session ──────────────────────────────────────────────────────

/// One browser process, its event-loop task and its profile directory.
///
/// [`BrowserSession::close`] is the normal exit. If the session is dropped
/// without it (a panic, a cancelled future), dropping the `Browser` kills the
/// child process and the handler task is aborted here.
struct BrowserSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    _profile_dir: TempDir,
}

impl BrowserSession {
    async fn launch(config: &RenderConfig, kind: OutputKind) -> Result<Self, PosterError> {
        let launch_err = |detail: String| PosterError::Render {
            stage: RenderStage::Launch,
            detail,
        };

        let profile_dir = TempDir::new().map_err(|e| launch_err(format!("profile dir: {e}")))?;

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile_dir.path())
            .args([
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--disable-extensions",
                "--no-first-run",
                "--hide-scrollbars",
            ]);
        if config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref exe) = config.chrome_executable {
            builder = builder.chrome_executable(exe);
        }
        if kind == OutputKind::Social {
            builder = builder.viewport(Some(Viewport {
                width: config.social_canvas_px,
                height: config.social_canvas_px,
                device_scale_factor: Some(config.device_scale_factor),
                ..Default::default()
            }));
        }
        let browser_config = builder
            .build()
            .map_err(|e| launch_err(format!("browser config: {e}")))?;

        debug!("Launching headless browser for {} output", kind);
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| launch_err(e.to_string()))?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        Ok(Self {
            browser: Some(browser),
            handler,
            _profile_dir: profile_dir,
        })
    }

    /// Load `markup`, wait for it to settle, and export it as `kind`.
    async fn capture(
        &self,
        markup: &str,
        kind: OutputKind,
        config: &RenderConfig,
    ) -> Result<Vec<u8>, PosterError> {
        let browser = self.browser.as_ref().ok_or_else(|| {
            PosterError::Internal("browser session already closed".into())
        })?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| navigate_err(format!("new page: {e}")))?;

        let document = write_markup(markup)?;
        let url = reqwest::Url::from_file_path(document.path())
            .map_err(|_| navigate_err(format!("bad path {}", document.path().display())))?;

        let ceiling = Duration::from_secs(config.load_timeout_secs);
        tokio::time::timeout(ceiling, load_and_settle(&page, url.as_str()))
            .await
            .map_err(|_| {
                warn!("Page did not settle within {}s", config.load_timeout_secs);
                PosterError::RenderTimeout {
                    secs: config.load_timeout_secs,
                }
            })??;

        match kind {
            OutputKind::Social => export_png(&page).await,
            OutputKind::Document => export_pdf(&page, config).await,
        }
    }

    /// Close the browser and stop its event loop. Never fails; problems are logged.
    async fn close(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                debug!("Browser close: {e}");
            }
            if let Err(e) = browser.wait().await {
                debug!("Browser wait: {e}");
            }
        }
        self.handler.abort();
        debug!("Browser session closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

// ── Stages ───────────────────────────────────────────────────────────────

fn navigate_err(detail: String) -> PosterError {
    PosterError::Render {
        stage: RenderStage::Navigate,
        detail,
    }
}

fn export_err(detail: String) -> PosterError {
    PosterError::Render {
        stage: RenderStage::Export,
        detail,
    }
}

/// Write the markup to a temporary `.html` file the browser can open.
fn write_markup(markup: &str) -> Result<tempfile::NamedTempFile, PosterError> {
    let mut file = tempfile::Builder::new()
        .prefix("poster-")
        .suffix(".html")
        .tempfile()
        .map_err(|e| PosterError::Internal(format!("tempfile: {e}")))?;
    file.write_all(markup.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| PosterError::Internal(format!("tempfile write: {e}")))?;
    Ok(file)
}

/// Navigate to `url` and return once that navigation reports `networkIdle`.
async fn load_and_settle(page: &Page, url: &str) -> Result<(), PosterError> {
    // Subscribe before navigating so the event cannot be missed.
    let mut lifecycle = page
        .event_listener::<EventLifecycleEvent>()
        .await
        .map_err(|e| navigate_err(format!("lifecycle events: {e}")))?;

    let navigation = page
        .execute(NavigateParams::new(url))
        .await
        .map_err(|e| navigate_err(e.to_string()))?;
    if let Some(ref error_text) = navigation.result.error_text {
        return Err(navigate_err(error_text.clone()));
    }
    let loader_id = navigation.result.loader_id.clone();

    while let Some(event) = lifecycle.next().await {
        let ours = loader_id.as_ref().is_none_or(|id| *id == event.loader_id);
        if ours && event.name == "networkIdle" {
            debug!("Page reached network idle");
            return Ok(());
        }
    }
    Err(navigate_err(
        "browser closed before the page settled".into(),
    ))
}

/// Full-page PNG at the viewport's device scale, transparent background allowed.
///
/// `Page::screenshot` with `full_page` resets the device metrics to 1×, so
/// the capture is issued directly with a content-sized clip instead.
async fn export_png(page: &Page) -> Result<Vec<u8>, PosterError> {
    let metrics = page
        .layout_metrics()
        .await
        .map_err(|e| export_err(format!("layout metrics: {e}")))?;
    let params = png_capture_params(&metrics.css_content_size);

    page.execute(SetDefaultBackgroundColorOverrideParams {
        color: Some(Rgba {
            r: 0,
            g: 0,
            b: 0,
            a: Some(0.),
        }),
    })
    .await
    .map_err(|e| export_err(format!("transparent background: {e}")))?;

    let captured = page.execute(params).await;

    if let Err(e) = page
        .execute(SetDefaultBackgroundColorOverrideParams { color: None })
        .await
    {
        debug!("Background override reset: {e}");
    }

    let captured = captured.map_err(|e| export_err(format!("screenshot: {e}")))?;
    decode_capture(AsRef::<str>::as_ref(&captured.result.data))
}

/// Capture of the whole content box. The clip scale stays 1.0 so the
/// viewport's device scale factor decides the pixel density.
fn png_capture_params(content: &Rect) -> CaptureScreenshotParams {
    CaptureScreenshotParams {
        format: Some(CaptureScreenshotFormat::Png),
        clip: Some(ClipRegion {
            x: 0.,
            y: 0.,
            width: content.width,
            height: content.height,
            scale: 1.,
        }),
        capture_beyond_viewport: Some(true),
        ..Default::default()
    }
}

fn decode_capture(data: &str) -> Result<Vec<u8>, PosterError> {
    STANDARD
        .decode(data)
        .map_err(|e| export_err(format!("screenshot data: {e}")))
}

/// A4 PDF with backgrounds and a uniform margin.
async fn export_pdf(page: &Page, config: &RenderConfig) -> Result<Vec<u8>, PosterError> {
    let (width, height) = A4_INCHES;
    let margin = config.page_margin_inches();
    let params = PrintToPdfParams {
        print_background: Some(true),
        paper_width: Some(width),
        paper_height: Some(height),
        margin_top: Some(margin),
        margin_bottom: Some(margin),
        margin_left: Some(margin),
        margin_right: Some(margin),
        ..Default::default()
    };
    page.pdf(params)
        .await
        .map_err(|e| export_err(format!("print to pdf: {e}")))
}
