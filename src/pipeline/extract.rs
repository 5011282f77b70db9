//! Markup extraction: isolate the HTML document from the model's reply.
//!
//! Models are asked for exactly one document and usually comply, but they
//! wrap it in a fenced code block and sometimes chat before or after it.
//! The scanner here locates the first fence pair explicitly:
//!
//! ```text
//! Sure! Here is your poster:          <- ignored
//! ```html                             <- opening fence, info string dropped
//! <!DOCTYPE html>…                    <- returned
//! ```                                 <- closing fence
//! Let me know if…                     <- ignored
//! ```
//!
//! A reply with no opening fence, no closing fence, or nothing between the
//! two is a [`PosterError::MalformedResponse`]. Nothing is guessed.

use crate::error::PosterError;
use crate::prompts::LOGO_PLACEHOLDER;
use once_cell::sync::Lazy;
use regex::Regex;

const FENCE: &str = "```";

/// The rest of the opening-fence line when it is only a language tag
/// (`html`, ` HTML `, `xhtml+xml`, or nothing at all).
static RE_INFO_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*(?:[A-Za-z][\w+.\-]*)?[ \t]*(?:\r?\n|$)").unwrap());

/// An HTML language tag with markup following on the same line
/// (`html<!DOCTYPE…`, `HTML <html>`).
static RE_INLINE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[ \t]*(?:xhtml|html|htm)[ \t]*").unwrap());

/// Return the contents of the first fenced block in `raw`.
///
/// The language tag after the opening fence and any leading whitespace are
/// stripped; everything else up to the closing fence is returned verbatim.
pub fn extract_markup(raw: &str) -> Result<String, PosterError> {
    let open = raw.find(FENCE).ok_or_else(|| PosterError::MalformedResponse {
        detail: "no fenced code block in the model response".into(),
    })?;
    let after_open = &raw[open + FENCE.len()..];

    let body = after_open[info_string_len(after_open)..].trim_start();

    let close = body.find(FENCE).ok_or_else(|| PosterError::MalformedResponse {
        detail: "fenced code block is never closed (truncated response?)".into(),
    })?;
    let markup = &body[..close];

    if markup.trim().is_empty() {
        return Err(PosterError::MalformedResponse {
            detail: "fenced code block is empty".into(),
        });
    }
    Ok(markup.to_string())
}

/// Length of the language tag right after the opening fence, or 0.
fn info_string_len(after_open: &str) -> usize {
    if let Some(m) = RE_INFO_STRING.find(after_open) {
        return m.end();
    }
    match RE_INLINE_TAG.find(after_open) {
        Some(m) if after_open[m.end()..].starts_with('<') => m.end(),
        _ => 0,
    }
}

/// Number of logo placeholder tokens in `markup`.
pub fn placeholder_count(markup: &str) -> usize {
    markup.matches(LOGO_PLACEHOLDER).count()
}
