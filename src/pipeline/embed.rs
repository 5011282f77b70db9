//! Logo embedding: uploaded bytes → base64 data URI → `<img>` in the markup.
//!
//! The renderer loads the markup from a local file with no server behind it,
//! so the logo has to travel inside the document itself. A data URI keeps the
//! document self-contained and avoids a second network round-trip during the
//! network-idle wait.

use crate::prompts::LOGO_PLACEHOLDER;
use crate::record::LogoAsset;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Tailwind sizing applied to the inlined logo.
pub const LOGO_CLASS: &str = "w-24 h-24 object-contain";

/// `data:<media type>;base64,<payload>` for the logo.
pub fn logo_data_uri(logo: &LogoAsset) -> String {
    let b64 = STANDARD.encode(&logo.bytes);
    format!("data:{};base64,{}", logo.media_type.trim(), b64)
}

/// The `<img>` element that replaces the placeholder.
pub fn logo_img_tag(logo: &LogoAsset) -> String {
    format!(
        r#"<img src="{}" class="{}"/>"#,
        logo_data_uri(logo),
        LOGO_CLASS
    )
}

/// Replace the first placeholder token with the logo, if one was supplied.
///
/// Later occurrences stay as literal text. Without a logo the markup is
/// returned unchanged, placeholder included.
pub fn inject_logo(markup: &str, logo: Option<&LogoAsset>) -> String {
    let Some(logo) = logo else {
        return markup.to_string();
    };
    if !markup.contains(LOGO_PLACEHOLDER) {
        debug!("No logo placeholder in markup; logo not embedded");
        return markup.to_string();
    }
    let tag = logo_img_tag(logo);
    debug!("Embedding {}-byte logo as {} bytes of markup", logo.bytes.len(), tag.len());
    markup.replacen(LOGO_PLACEHOLDER, &tag, 1)
}
