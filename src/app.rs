//! Request orchestration: prompt construction, the single upstream call, and
//! validation of what comes back.

use crate::ai::{mime, GeminiClientFactory, ModelClientFactory, PromptPart};
use crate::models::{
    AudioAnalysis, AudioAnalysisRequest, Config, LessonData, LessonRequest, ResponseSchema,
};
use crate::{prompts, Error, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

/// Relays lesson and pronunciation requests to the model.
///
/// Holds no per-caller state; every call builds its own model client from the
/// caller's key.
pub struct App {
    factory: Box<dyn ModelClientFactory>,
}

impl App {
    /// Build an app around any client factory (mocks included).
    pub fn new(factory: Box<dyn ModelClientFactory>) -> Self {
        Self { factory }
    }

    pub fn from_config(config: &Config) -> Self {
        info!(
            "Model provider: Gemini (model: {}, timeout: {:?})",
            config.gemini_model, config.upstream_timeout
        );
        Self::new(Box::new(GeminiClientFactory::from_config(config)))
    }

    pub fn model(&self) -> &str {
        self.factory.model()
    }

    /// Generate a lesson module and return the model's document as-is.
    pub async fn generate_lesson(&self, api_key: &str, request: &LessonRequest) -> Result<Value> {
        require_key(api_key)?;

        info!(
            "Generating lesson (topic: {:?}, level: {:?}, lang: {:?})",
            request.topic, request.level, request.lang
        );

        let prompt = prompts::lesson_prompt(request);
        let model = self
            .factory
            .create(api_key, Some(LessonData::gemini_schema()));
        let text = model.generate_content(vec![PromptPart::Text(prompt)]).await?;

        parse_model_json::<LessonData>(&text)
    }

    /// Score a recording against its target text and return the model's
    /// document as-is.
    pub async fn analyze_audio(
        &self,
        api_key: &str,
        request: AudioAnalysisRequest,
    ) -> Result<Value> {
        require_key(api_key)?;

        info!(
            "Analyzing audio ({} bytes, target: {:?}, lang: {:?})",
            request.audio.len(),
            request.target_text,
            request.lang
        );

        let mime_type = mime::tag_audio(&request.audio);
        let prompt = prompts::pronunciation_prompt(&request);
        let parts = vec![
            PromptPart::Text(prompt),
            PromptPart::Blob {
                mime_type: mime_type.to_string(),
                data: request.audio,
            },
        ];

        let model = self
            .factory
            .create(api_key, Some(AudioAnalysis::gemini_schema()));
        let text = model.generate_content(parts).await?;

        parse_model_json::<AudioAnalysis>(&text)
    }
}

fn require_key(api_key: &str) -> Result<()> {
    if api_key.trim().is_empty() {
        return Err(Error::Unauthorized);
    }
    Ok(())
}

/// Parse model text as JSON and check it against `T`.
///
/// The returned value is the parsed document itself, not a re-serialization
/// of `T`, so fields the schema does not know about survive.
pub fn parse_model_json<T: ResponseSchema>(text: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        debug!("Model returned non-JSON text: {}", text);
        Error::MalformedResponse(format!("model returned invalid JSON: {}", e))
    })?;

    let document = T::deserialize(&value).map_err(|e| {
        Error::MalformedResponse(format!("{} does not match the schema: {}", T::NAME, e))
    })?;

    document.validate().map_err(|reason| {
        Error::MalformedResponse(format!("{} does not match the schema: {}", T::NAME, reason))
    })?;

    Ok(value)
}
