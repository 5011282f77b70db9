//! Response packaging: artifact or structured failure, never both.
//!
//! Success hands the artifact bytes over untouched with the content type of
//! their kind. Failure is caught here, once, logged with its category, its
//! full source chain and a timestamp, and turned into an [`ErrorPayload`].
//! No bytes from a failed run ever reach the caller.

use crate::error::{ErrorCategory, PosterError};
use crate::output::GenerationOutput;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error as _;
use tracing::error;

/// Generic headline of every failure payload.
pub const FAILURE_HEADLINE: &str = "Failed to generate document";

/// What the caller receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackagedResponse {
    Artifact {
        content_type: &'static str,
        /// Suggested download name, e.g. `chess-club-social.png`.
        filename: String,
        body: Vec<u8>,
    },
    Failure {
        status: u16,
        payload: ErrorPayload,
    },
}

impl PackagedResponse {
    pub fn status(&self) -> u16 {
        match self {
            Self::Artifact { .. } => 200,
            Self::Failure { status, .. } => *status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Artifact { .. })
    }
}

/// Structured failure body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Always [`FAILURE_HEADLINE`].
    pub error: String,
    pub category: ErrorCategory,
    /// The underlying message, including its causes.
    pub details: String,
    /// RFC 3339 UTC time the failure was packaged.
    pub timestamp: String,
}

impl ErrorPayload {
    pub fn from_error(err: &PosterError) -> Self {
        Self {
            error: FAILURE_HEADLINE.to_string(),
            category: err.category(),
            details: error_chain(err),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Package the pipeline result for the caller.
///
/// `filename` is only used on success.
pub fn package(
    result: Result<GenerationOutput, PosterError>,
    filename: impl Into<String>,
) -> PackagedResponse {
    match result {
        Ok(output) => PackagedResponse::Artifact {
            content_type: output.artifact.content_type(),
            filename: filename.into(),
            body: output.artifact.bytes,
        },
        Err(err) => package_error(&err),
    }
}

/// Log `err` and turn it into a failure response.
pub fn package_error(err: &PosterError) -> PackagedResponse {
    let payload = ErrorPayload::from_error(err);
    error!(
        category = %payload.category,
        timestamp = %payload.timestamp,
        "Generation failed: {}",
        payload.details
    );
    PackagedResponse::Failure {
        status: payload.category.status_code(),
        payload,
    }
}

/// `err` followed by each of its sources, separated by `: `.
fn error_chain(err: &PosterError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !out.contains(&cause_msg) {
            out.push_str(": ");
            out.push_str(&cause_msg);
        }
        source = cause.source();
    }
    out
}
