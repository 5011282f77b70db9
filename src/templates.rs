//! Built-in sample club profiles.
//!
//! Ten ready-made profiles covering common club types, for trying the
//! pipeline without writing a profile by hand. Shipped as JSON inside the
//! binary.

use crate::error::PosterError;
use crate::record::ClubProfile;
use once_cell::sync::Lazy;
use tracing::warn;

static TEMPLATES_JSON: &str = include_str!("../templates/clubs.json");

static TEMPLATES: Lazy<Vec<ClubProfile>> = Lazy::new(|| {
    serde_json::from_str(TEMPLATES_JSON).unwrap_or_else(|e| {
        warn!("Built-in templates are unreadable: {e}");
        Vec::new()
    })
});

/// All built-in templates, in library order.
pub fn all() -> &'static [ClubProfile] {
    &TEMPLATES
}

/// Names of the built-in templates.
pub fn names() -> Vec<&'static str> {
    all().iter().map(|t| t.name.as_str()).collect()
}

/// Look a template up by name or slug, case-insensitively.
pub fn find(name: &str) -> Result<&'static ClubProfile, PosterError> {
    let wanted = name.trim();
    all()
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(wanted) || t.slug() == wanted.to_ascii_lowercase())
        .ok_or_else(|| {
            PosterError::invalid_input(format!(
                "unknown template '{name}'; available: {}",
                names().join(", ")
            ))
        })
}
