#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::Value;

pub const BOUNDARY: &str = "relay-test-boundary";

/// One multipart field; `filename` marks it as a file upload.
pub struct FormField<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
    pub filename: Option<&'a str>,
}

pub fn text_field<'a>(name: &'a str, value: &'a str) -> FormField<'a> {
    FormField {
        name,
        data: value.as_bytes(),
        filename: None,
    }
}

pub fn file_field<'a>(name: &'a str, data: &'a [u8]) -> FormField<'a> {
    FormField {
        name,
        data,
        filename: Some("recording.webm"),
    }
}

pub fn multipart_body(fields: &[FormField<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for field in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match field.filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        field.name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        field.name
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(field.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn lesson_request(api_key: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/generate-lesson")
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("x-gemini-api-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn audio_request(api_key: Option<&str>, fields: &[FormField<'_>]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/analyze-audio")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(key) = api_key {
        builder = builder.header("x-gemini-api-key", key);
    }
    builder.body(Body::from(multipart_body(fields))).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn lesson_document() -> Value {
    serde_json::json!({
        "lesson_title": "Gọi cà phê",
        "context_intro": "Bạn đang ở một quán cà phê ở Bắc Kinh.",
        "vocabulary": [
            { "hanzi": "咖啡", "pinyin": "kāfēi", "translation": "cà phê", "type": "noun" },
            { "hanzi": "喝", "pinyin": "hē", "translation": "uống", "type": "verb" }
        ],
        "dialogue": [
            { "role": "A", "chinese": "你想喝什么？", "pinyin": "nǐ xiǎng hē shénme?", "translation": "Bạn muốn uống gì?" },
            { "role": "B", "chinese": "我想喝咖啡。", "pinyin": "wǒ xiǎng hē kāfēi.", "translation": "Tôi muốn uống cà phê." }
        ],
        "grammar_point": {
            "structure": "想 + V",
            "explanation": "Dùng để nói điều mình muốn làm."
        }
    })
}

pub fn silent_analysis_document() -> Value {
    serde_json::json!({
        "heard_transcript": "",
        "heard_pinyin": "",
        "score": 0,
        "tone_accuracy": "Bad",
        "errors": [],
        "overall_feedback": "Không nghe thấy âm thanh. Hãy thử ghi âm lại."
    })
}

/// EBML header followed by nothing: a WebM container with no audio frames.
pub const SILENT_WEBM: &[u8] = &[0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x86, 0x81, 0x01];
