//! Error types for the club-poster library.
//!
//! Every stage of the pipeline fails fast with a [`PosterError`]. There is no
//! partial result to salvage: a poster without its markup, or a PDF that was
//! cut off mid-export, is worse than a clear failure. The error is caught once
//! at the top level (see [`crate::response`]) and reported to the caller with
//! its [`ErrorCategory`].
//!
//! The categories are deliberately coarse. Callers (the HTTP endpoint, the
//! CLI, a job queue) mostly need to know *whose fault* a failure was: the
//! request, the model, or the renderer. The variant itself carries the detail.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the club-poster library.
#[derive(Debug, Error)]
pub enum PosterError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The request is missing a required field or carries an invalid value.
    #[error("Invalid input: {detail}")]
    InvalidInput { detail: String },

    /// The record file could not be parsed as a club profile.
    #[error("Invalid club profile: {detail}")]
    InvalidProfile { detail: String },

    /// The output-kind tag is missing or unknown.
    #[error("Unknown output kind '{tag}': expected 'document', 'pdf' or 'social'")]
    UnknownOutputKind { tag: String },

    /// The logo file was not found at the given path.
    #[error("Logo file not found: '{path}'")]
    LogoNotFound { path: PathBuf },

    /// The logo URL could not be downloaded.
    #[error("Failed to download logo '{url}': {reason}")]
    LogoDownloadFailed { url: String, reason: String },

    /// The logo bytes are not an image we can embed.
    #[error("Unsupported logo: {detail}")]
    UnsupportedLogo { detail: String },

    /// The logo exceeds the configured size limit.
    #[error("Logo is {size} bytes, larger than the {limit}-byte limit")]
    LogoTooLarge { size: usize, limit: usize },

    // ── Generation errors ─────────────────────────────────────────────────
    /// The configured provider could not be initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The generation call failed or produced nothing usable.
    #[error("Generation service error ({kind}) from '{provider}': {detail}")]
    GenerationService {
        provider: String,
        kind: GenerationFailure,
        detail: String,
    },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The model response did not contain a fenced markup block.
    #[error("Malformed model response: {detail}")]
    MalformedResponse { detail: String },

    // ── Render errors ─────────────────────────────────────────────────────
    /// The page did not reach network idle within the load ceiling.
    #[error("Page did not settle within {secs}s")]
    RenderTimeout { secs: u64 },

    /// The headless browser failed to launch, load, or export.
    #[error("Render failed during {stage}: {detail}")]
    Render { stage: RenderStage, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output artifact file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PosterError {
    /// Shorthand for [`PosterError::InvalidInput`].
    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::InvalidInput {
            detail: detail.into(),
        }
    }

    /// The taxonomy bucket this error is reported under.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. }
            | Self::InvalidProfile { .. }
            | Self::UnknownOutputKind { .. }
            | Self::LogoNotFound { .. }
            | Self::LogoDownloadFailed { .. }
            | Self::UnsupportedLogo { .. }
            | Self::LogoTooLarge { .. } => ErrorCategory::InputValidation,
            Self::ProviderNotConfigured { .. } | Self::GenerationService { .. } => {
                ErrorCategory::GenerationService
            }
            Self::MalformedResponse { .. } => ErrorCategory::MalformedResponse,
            Self::RenderTimeout { .. } => ErrorCategory::RenderTimeout,
            Self::Render { .. } => ErrorCategory::Render,
            Self::OutputWriteFailed { .. } | Self::InvalidConfig(_) | Self::Internal(_) => {
                ErrorCategory::Internal
            }
        }
    }
}

/// Coarse failure category reported to callers.
///
/// Serialises to the category names used in error payloads, e.g.
/// `"GenerationServiceError"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Missing or invalid request fields, unusable logo.
    #[serde(rename = "InputValidationError")]
    InputValidation,
    /// Model call failed, was rejected, or returned no text.
    #[serde(rename = "GenerationServiceError")]
    GenerationService,
    /// No fenced markup block in the model output.
    #[serde(rename = "MalformedResponseError")]
    MalformedResponse,
    /// The page did not settle within the load ceiling.
    #[serde(rename = "RenderTimeoutError")]
    RenderTimeout,
    /// The browser crashed or the export failed.
    #[serde(rename = "RenderError")]
    Render,
    /// Misconfiguration or an unexpected runtime failure.
    #[serde(rename = "InternalError")]
    Internal,
}

impl ErrorCategory {
    /// Wire name of the category.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InputValidation => "InputValidationError",
            Self::GenerationService => "GenerationServiceError",
            Self::MalformedResponse => "MalformedResponseError",
            Self::RenderTimeout => "RenderTimeoutError",
            Self::Render => "RenderError",
            Self::Internal => "InternalError",
        }
    }

    /// HTTP status used when this category is returned over the wire.
    ///
    /// Upstream model failures are a bad gateway; a page that never settled
    /// is a gateway timeout.
    pub fn status_code(self) -> u16 {
        match self {
            Self::InputValidation => 400,
            Self::GenerationService | Self::MalformedResponse => 502,
            Self::RenderTimeout => 504,
            Self::Render | Self::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a generation call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationFailure {
    /// Connection refused, DNS, TLS, reset.
    Network,
    /// Rejected credentials (401/403, invalid key).
    Authentication,
    /// The call exceeded `api_timeout_secs`.
    Timeout,
    /// The service answered but the text was empty.
    EmptyResponse,
    /// Any other error reported by the service.
    Api,
}

impl GenerationFailure {
    /// Best-effort classification of a provider error message.
    ///
    /// Provider errors arrive as opaque strings from many backends, so this
    /// looks for the phrases they have in common.
    pub fn classify(message: &str) -> Self {
        let m = message.to_lowercase();
        if m.contains("401")
            || m.contains("403")
            || m.contains("unauthori")
            || m.contains("forbidden")
            || m.contains("api key")
            || m.contains("api_key")
            || m.contains("authentication")
        {
            Self::Authentication
        } else if m.contains("timed out") || m.contains("timeout") {
            Self::Timeout
        } else if m.contains("connect")
            || m.contains("dns")
            || m.contains("network")
            || m.contains("connection")
            || m.contains("reset by peer")
        {
            Self::Network
        } else {
            Self::Api
        }
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Network => "network",
            Self::Authentication => "authentication",
            Self::Timeout => "timeout",
            Self::EmptyResponse => "empty response",
            Self::Api => "api",
        })
    }
}

/// Step of the browser session that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStage {
    Launch,
    Navigate,
    Export,
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Launch => "launch",
            Self::Navigate => "navigate",
            Self::Export => "export",
        })
    }
}
