//! The input record: who the club is and what artifact to make.
//!
//! Every text field is free-form and optional. The form that produces these
//! records lets people skip anything they don't know yet, so an empty field
//! means "leave that section out", never "fail". Field names follow the
//! camelCase JSON the web form sends.

use crate::error::PosterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Description of a club or organisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClubProfile {
    pub name: String,
    /// Mission statement. Older clients send this as `mission`.
    #[serde(alias = "mission")]
    pub description: String,
    pub founding_date: String,
    pub current_member_count: String,
    pub meeting_frequency: String,
    pub meeting_location: String,
    pub upcoming_events: String,
    pub benefits: String,
    pub achievements: String,
    pub leadership_team: String,
    pub social_media: SocialHandles,
    pub contact_email: String,
    pub contact_phone: String,
    pub website_url: String,
    pub focus_areas: Vec<String>,
    #[serde(rename = "type")]
    pub club_type: String,
    pub tone: String,
    pub audience: Option<Audience>,
}

/// Social media handles or profile URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialHandles {
    pub facebook: String,
    pub twitter: String,
    pub instagram: String,
}

impl SocialHandles {
    pub fn is_empty(&self) -> bool {
        [&self.facebook, &self.twitter, &self.instagram]
            .iter()
            .all(|s| s.trim().is_empty())
    }
}

/// Who the poster is aimed at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Audience {
    pub target_group: String,
    pub age_range: String,
    pub interest_level: String,
    pub prior_knowledge: String,
}

impl Audience {
    pub fn is_empty(&self) -> bool {
        [
            &self.target_group,
            &self.age_range,
            &self.interest_level,
            &self.prior_knowledge,
        ]
        .iter()
        .all(|s| s.trim().is_empty())
    }
}

impl ClubProfile {
    /// Parse a profile from the JSON the web form sends.
    pub fn from_json(json: &str) -> Result<Self, PosterError> {
        serde_json::from_str(json).map_err(|e| PosterError::InvalidProfile {
            detail: e.to_string(),
        })
    }

    /// A filesystem- and header-safe slug of the club name.
    ///
    /// Falls back to `"club"` when the name has no ASCII alphanumerics.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.name.len());
        let mut dash = false;
        for c in self.name.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
                dash = false;
            } else if !dash && !slug.is_empty() {
                slug.push('-');
                dash = true;
            }
        }
        let slug = slug.trim_end_matches('-');
        if slug.is_empty() {
            "club".to_string()
        } else {
            slug.to_string()
        }
    }
}

/// The artifact format the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Print-ready single A4 page, exported as PDF.
    #[serde(alias = "pdf")]
    Document,
    /// Square 1080×1080 image, exported as PNG at 2× density.
    Social,
}

impl OutputKind {
    /// MIME type of the rendered artifact.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Document => "application/pdf",
            Self::Social => "image/png",
        }
    }

    /// File extension of the rendered artifact, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Document => "pdf",
            Self::Social => "png",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Social => "social",
        }
    }
}

impl FromStr for OutputKind {
    type Err = PosterError;

    /// Accepts `document`, the web form's `pdf`, and `social`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" | "pdf" => Ok(Self::Document),
            "social" => Ok(Self::Social),
            _ => Err(PosterError::UnknownOutputKind { tag: s.to_string() }),
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded logo: raw bytes plus the media type the uploader declared.
#[derive(Clone, PartialEq, Eq)]
pub struct LogoAsset {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl LogoAsset {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }

    /// Reject logos we cannot embed as an image.
    pub fn validate(&self, max_bytes: usize) -> Result<(), PosterError> {
        if self.bytes.is_empty() {
            return Err(PosterError::UnsupportedLogo {
                detail: "logo file is empty".into(),
            });
        }
        if self.bytes.len() > max_bytes {
            return Err(PosterError::LogoTooLarge {
                size: self.bytes.len(),
                limit: max_bytes,
            });
        }
        let media_type = self.media_type.trim();
        let is_token = media_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/+.-_".contains(c));
        if !media_type.starts_with("image/") || !is_token {
            return Err(PosterError::UnsupportedLogo {
                detail: format!("media type '{}' is not an image type", self.media_type),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for LogoAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoAsset")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("media_type", &self.media_type)
            .finish()
    }
}

/// One pipeline invocation: the profile, the requested kind and an optional logo.
///
/// Built once per request and only ever borrowed by the pipeline stages.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub profile: ClubProfile,
    pub kind: OutputKind,
    pub logo: Option<LogoAsset>,
}

impl GenerationRequest {
    pub fn new(profile: ClubProfile, kind: OutputKind) -> Self {
        Self {
            profile,
            kind,
            logo: None,
        }
    }

    pub fn with_logo(mut self, logo: LogoAsset) -> Self {
        self.logo = Some(logo);
        self
    }

    /// Validate the parts of the request that can be wrong.
    ///
    /// Profile fields are free text and never fail; only the logo can.
    pub fn validate(&self, max_logo_bytes: usize) -> Result<(), PosterError> {
        if let Some(logo) = &self.logo {
            logo.validate(max_logo_bytes)?;
        }
        Ok(())
    }

    /// Suggested download filename, e.g. `chess-club-poster.pdf`.
    pub fn artifact_filename(&self) -> String {
        let suffix = match self.kind {
            OutputKind::Document => "poster",
            OutputKind::Social => "social",
        };
        format!(
            "{}-{}.{}",
            self.profile.slug(),
            suffix,
            self.kind.extension()
        )
    }
}
