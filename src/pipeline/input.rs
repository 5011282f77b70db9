//! Input resolution: load a club profile and a logo from paths or URLs.
//!
//! The HTTP endpoint receives both inline; the CLI receives a profile file
//! and a logo that may be a local path or an `http(s)` URL. Either way the
//! result is a [`LogoAsset`] whose media type is settled here, in order:
//!
//! 1. the type the caller declared explicitly,
//! 2. the `Content-Type` of the download, when it is an `image/*` type,
//! 3. the magic bytes of the file (`image::guess_format`),
//! 4. SVG, when the file name ends in `.svg` or the bytes open an `<svg>` root.

use crate::error::PosterError;
use crate::record::{ClubProfile, LogoAsset};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SVG_MIME: &str = "image/svg+xml";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read and parse a club profile JSON file.
pub async fn load_profile(path: &Path) -> Result<ClubProfile, PosterError> {
    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        PosterError::invalid_input(format!("cannot read profile '{}': {e}", path.display()))
    })?;
    ClubProfile::from_json(&json)
}

/// Resolve a logo path or URL to bytes plus a media type.
///
/// `declared` wins over anything detected. Fails with
/// [`PosterError::UnsupportedLogo`] when no image type can be determined.
pub async fn resolve_logo(
    source: &str,
    declared: Option<&str>,
    timeout_secs: u64,
) -> Result<LogoAsset, PosterError> {
    let (bytes, header_type) = if is_url(source) {
        download_logo(source, timeout_secs).await?
    } else {
        (read_local(source).await?, None)
    };

    let media_type = declared
        .map(str::to_string)
        .or(header_type)
        .or_else(|| sniff_media_type(&bytes, source))
        .ok_or_else(|| PosterError::UnsupportedLogo {
            detail: format!("cannot determine the image type of '{source}'"),
        })?;

    debug!("Logo '{}': {} bytes, {}", source, bytes.len(), media_type);
    Ok(LogoAsset::new(bytes, media_type))
}

/// Guess an image media type from magic bytes, falling back to SVG detection.
pub fn sniff_media_type(bytes: &[u8], name_hint: &str) -> Option<String> {
    if let Ok(format) = image::guess_format(bytes) {
        return Some(format.to_mime_type().to_string());
    }
    if looks_like_svg(bytes) || name_hint.to_ascii_lowercase().ends_with(".svg") {
        return Some(SVG_MIME.to_string());
    }
    None
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, PosterError> {
    let path = PathBuf::from(path_str);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PosterError::LogoNotFound { path })
        }
        Err(e) => Err(PosterError::invalid_input(format!(
            "cannot read logo '{}': {e}",
            path.display()
        ))),
    }
}

/// Download a logo, returning its bytes and its `image/*` content type if any.
async fn download_logo(
    url: &str,
    timeout_secs: u64,
) -> Result<(Vec<u8>, Option<String>), PosterError> {
    info!("Downloading logo from: {}", url);

    let failed = |reason: String| PosterError::LogoDownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {timeout_secs}s"))
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let header_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(image_content_type);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| failed(e.to_string()))?;

    Ok((bytes.to_vec(), header_type))
}

/// The bare `image/*` media type of a `Content-Type` header value.
fn image_content_type(header: &str) -> Option<String> {
    let mime = header.split(';').next()?.trim().to_ascii_lowercase();
    mime.starts_with("image/").then_some(mime)
}
