//! AI service integration for lesson generation and pronunciation analysis
//!
//! Callers never share credentials: a [`ModelClientFactory`] hands out a fresh
//! [`ModelService`] bound to one caller's API key for every request.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::{GeminiClientFactory, GeminiModelClient};
pub use mock::{MockModelClient, MockModelFactory, RecordedCall};

use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const JSON_MIME_TYPE: &str = "application/json";

/// One unit of content sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    Blob { mime_type: String, data: Vec<u8> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

/// Generation parameters applied to every request a model client makes.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
    pub response_mime_type: String,
    /// Shape the JSON reply must follow; omitted from the request when unset.
    pub response_schema: Option<Value>,
    pub safety_settings: Vec<SafetySetting>,
}

impl ModelConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_response_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.response_mime_type = mime_type.into();
        self
    }

    pub fn with_response_schema(mut self, schema: Option<Value>) -> Self {
        self.response_schema = schema;
        self
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        let safety_settings = [
            HarmCategory::Harassment,
            HarmCategory::HateSpeech,
            HarmCategory::SexuallyExplicit,
            HarmCategory::DangerousContent,
        ]
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold: HarmBlockThreshold::BlockNone,
        })
        .collect();

        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            response_mime_type: JSON_MIME_TYPE.to_string(),
            response_schema: None,
            safety_settings,
        }
    }
}

#[async_trait]
pub trait ModelService: Send + Sync {
    /// Send one content unit made of `parts` and return the model's text.
    async fn generate_content(&self, parts: Vec<PromptPart>) -> Result<String>;
}

pub trait ModelClientFactory: Send + Sync {
    /// Build a client bound to `api_key`, constraining replies to
    /// `response_schema` when one is given. Never fails; problems with the key
    /// surface on the first call.
    fn create(&self, api_key: &str, response_schema: Option<Value>) -> Box<dyn ModelService>;

    /// Model ID the created clients talk to.
    fn model(&self) -> &str;
}
