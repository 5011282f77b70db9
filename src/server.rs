//! HTTP surface: `POST /api/generate` and friends, on actix-web.
//!
//! The generate endpoint takes the same multipart form the web front end
//! posts:
//!
//! | Field        | Content                                             |
//! |--------------|-----------------------------------------------------|
//! | `clubInfo`   | the club profile as JSON                            |
//! | `outputType` | `document` (or `pdf`) or `social`                   |
//! | `logo`       | optional image file; its part `Content-Type` is the declared media type |
//!
//! Each request runs the whole pipeline on its own, with its own browser.

use crate::config::GenerationConfig;
use crate::error::PosterError;
use crate::generate::generate;
use crate::pipeline::input::sniff_media_type;
use crate::record::{ClubProfile, GenerationRequest, LogoAsset, OutputKind};
use crate::response::{package, package_error, PackagedResponse};
use crate::templates;
use actix_multipart::{Field, Multipart};
use actix_web::http::{header, StatusCode};
use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Largest accepted `clubInfo` / `outputType` part.
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Shared, read-only state. The config is never mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GenerationConfig>,
}

impl AppState {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Register the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/generate", web::post().to(generate_handler))
            .route("/health", web::get().to(health_handler))
            .route("/templates", web::get().to(templates_handler)),
    );
}

/// Serve the API on `bind` until the process is stopped.
pub async fn run_server(bind: &str, config: GenerationConfig) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new(config));
    info!("Listening on http://{}", bind);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await
}

async fn generate_handler(state: web::Data<AppState>, payload: Multipart) -> HttpResponse {
    let request = match parse_generate_form(payload, state.config.max_logo_bytes).await {
        Ok(request) => request,
        Err(e) => return into_http(package_error(&e)),
    };
    let filename = request.artifact_filename();
    let result = generate(&request, &state.config).await;
    into_http(package(result, filename))
}

async fn health_handler() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("ok")
}

#[derive(Serialize)]
struct TemplateList {
    templates: &'static [ClubProfile],
}

async fn templates_handler() -> HttpResponse {
    HttpResponse::Ok().json(TemplateList {
        templates: templates::all(),
    })
}

/// Turn a packaged response into an HTTP response.
pub fn into_http(response: PackagedResponse) -> HttpResponse {
    match response {
        PackagedResponse::Artifact {
            content_type,
            filename,
            body,
        } => HttpResponse::Ok()
            .content_type(content_type)
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ))
            .body(body),
        PackagedResponse::Failure { status, payload } => {
            let status =
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            HttpResponse::build(status).json(payload)
        }
    }
}

// ── Multipart parsing ────────────────────────────────────────────────────

/// Read the form into a [`GenerationRequest`].
///
/// Missing `clubInfo` or `outputType` is an input error; unknown fields are
/// skipped.
pub async fn parse_generate_form(
    mut multipart: Multipart,
    max_logo_bytes: usize,
) -> Result<GenerationRequest, PosterError> {
    let mut profile: Option<ClubProfile> = None;
    let mut kind: Option<OutputKind> = None;
    let mut logo: Option<LogoAsset> = None;

    while let Some(item) = multipart.next().await {
        let mut field =
            item.map_err(|e| PosterError::invalid_input(format!("multipart: {e}")))?;
        let disposition = field
            .content_disposition()
            .ok_or_else(|| PosterError::invalid_input("content disposition not found"))?;
        let name = disposition
            .get_name()
            .ok_or_else(|| PosterError::invalid_input("field name not found"))?
            .to_string();
        let filename = disposition.get_filename().map(str::to_string);

        match name.as_str() {
            "clubInfo" => {
                let text = read_text(&mut field, &name).await?;
                profile = Some(ClubProfile::from_json(&text)?);
            }
            "outputType" => {
                let text = read_text(&mut field, &name).await?;
                kind = Some(text.parse()?);
            }
            "logo" => {
                let declared = field.content_type().map(|m| m.essence_str().to_string());
                let bytes = read_field(&mut field, max_logo_bytes, |size| {
                    PosterError::LogoTooLarge {
                        size,
                        limit: max_logo_bytes,
                    }
                })
                .await?;
                // Browsers send an empty `logo` part when no file was chosen.
                if bytes.is_empty() && filename.as_deref().unwrap_or("").is_empty() {
                    continue;
                }
                let media_type = declared
                    .filter(|m| m.starts_with("image/"))
                    .or_else(|| sniff_media_type(&bytes, filename.as_deref().unwrap_or("")))
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                logo = Some(LogoAsset::new(bytes, media_type));
            }
            _ => {
                continue;
            }
        }
    }

    let profile = profile.ok_or_else(|| PosterError::invalid_input("missing field 'clubInfo'"))?;
    let kind = kind.ok_or_else(|| PosterError::invalid_input("missing field 'outputType'"))?;

    let mut request = GenerationRequest::new(profile, kind);
    if let Some(logo) = logo {
        request = request.with_logo(logo);
    }
    request.validate(max_logo_bytes)?;
    Ok(request)
}

async fn read_text(field: &mut Field, name: &str) -> Result<String, PosterError> {
    let bytes = read_field(field, MAX_TEXT_FIELD_BYTES, |size| {
        PosterError::invalid_input(format!("field '{name}' is too large ({size} bytes)"))
    })
    .await?;
    String::from_utf8(bytes)
        .map_err(|e| PosterError::invalid_input(format!("field '{name}' is not UTF-8: {e}")))
}

/// Collect a field's chunks, failing as soon as it grows past `limit`.
async fn read_field(
    field: &mut Field,
    limit: usize,
    too_large: impl Fn(usize) -> PosterError,
) -> Result<Vec<u8>, PosterError> {
    let mut buffer = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk.map_err(|e| PosterError::invalid_input(format!("multipart: {e}")))?;
        buffer.extend_from_slice(&data);
        if buffer.len() > limit {
            return Err(too_large(buffer.len()));
        }
    }
    Ok(buffer)
}
