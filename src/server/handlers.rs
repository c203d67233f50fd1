//! API request handlers

use super::{AppState, API_KEY_HEADER};
use crate::models::{AudioAnalysisRequest, LessonRequest, DEFAULT_LANG};
use crate::{Error, Result};
use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, State,
    },
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

/// Pull the caller's key from the request headers.
fn require_api_key(headers: &HeaderMap) -> Result<String> {
    let key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or("");

    if key.is_empty() {
        warn!("Rejecting request without {} header", API_KEY_HEADER);
        return Err(Error::Unauthorized);
    }

    Ok(key.to_string())
}

fn log_failure(context: &str, err: &Error) {
    match err {
        Error::Unauthorized | Error::InvalidRequest(_) | Error::PayloadTooLarge(_) => {
            warn!("{}: {}", context, err)
        }
        _ => error!("{}: {}", context, err),
    }
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.app.model(),
    }))
}

/// POST /api/generate-lesson
pub async fn generate_lesson(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<LessonRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let api_key = require_api_key(&headers)?;
    let Json(request) = body.map_err(|rejection| {
        let err = Error::InvalidRequest(rejection.body_text());
        log_failure("Invalid lesson request", &err);
        err
    })?;

    state
        .app
        .generate_lesson(&api_key, &request)
        .await
        .map(Json)
        .map_err(|e| {
            log_failure("Error generating lesson", &e);
            e
        })
}

/// POST /api/analyze-audio
pub async fn analyze_audio(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let api_key = require_api_key(&headers)?;

    let request = match multipart {
        Ok(multipart) => read_audio_form(multipart).await,
        Err(rejection) => Err(Error::InvalidRequest(rejection.body_text())),
    }
    .map_err(|e| {
        log_failure("Invalid audio analysis request", &e);
        e
    })?;

    state
        .app
        .analyze_audio(&api_key, request)
        .await
        .map(Json)
        .map_err(|e| {
            log_failure("Error analyzing audio", &e);
            e
        })
}

async fn read_audio_form(mut multipart: Multipart) -> Result<AudioAnalysisRequest> {
    let mut audio = None;
    let mut target_text = None;
    let mut target_pinyin = None;
    let mut lang = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error("Failed to read multipart form", e))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "audio" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| form_error("Failed to read audio upload", e))?;
                audio = Some(bytes.to_vec());
            }
            "target_text" => target_text = Some(read_text(field).await?),
            "target_pinyin" => target_pinyin = Some(read_text(field).await?),
            "lang" => lang = Some(read_text(field).await?),
            _ => debug!("Ignoring unexpected form field '{}'", name),
        }
    }

    Ok(AudioAnalysisRequest {
        audio: audio.ok_or_else(|| missing_field("audio"))?,
        target_text: target_text.ok_or_else(|| missing_field("target_text"))?,
        target_pinyin: target_pinyin.ok_or_else(|| missing_field("target_pinyin"))?,
        lang: lang.unwrap_or_else(|| DEFAULT_LANG.to_string()),
    })
}

async fn read_text(field: Field<'_>) -> Result<String> {
    let name = field.name().unwrap_or("").to_string();
    field
        .text()
        .await
        .map_err(|e| form_error(&format!("Failed to read form field '{}'", name), e))
}

/// Hitting the audio body limit is a 413; any other form failure is a 422.
fn form_error(context: &str, e: MultipartError) -> Error {
    let detail = format!("{}: {}", context, e.body_text());
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge(detail)
    } else {
        Error::InvalidRequest(detail)
    }
}

fn missing_field(name: &str) -> Error {
    Error::InvalidRequest(format!("Missing required form field '{}'", name))
}
