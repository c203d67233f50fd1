use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::ai::{ModelConfig, ModelService, PromptPart};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini-backed [`ModelService`] bound to a single caller's API key.
pub struct GeminiModelClient {
    http: GeminiHttpClient,
    config: ModelConfig,
}

impl GeminiModelClient {
    pub fn new(api_key: String, config: ModelConfig) -> Self {
        Self::new_with_client(api_key, config, reqwest::Client::new(), DEFAULT_TIMEOUT)
    }

    pub fn new_with_client(
        api_key: String,
        config: ModelConfig,
        client: reqwest::Client,
        timeout: Duration,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                config.model.clone(),
                timeout,
                client,
            ),
            config,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }

    fn build_request(&self, parts: Vec<PromptPart>) -> GenerateContentRequest {
        let parts = parts
            .into_iter()
            .map(|part| match part {
                PromptPart::Text(text) => Part::Text { text },
                PromptPart::Blob { mime_type, data } => Part::InlineData {
                    inline_data: InlineData {
                        mime_type,
                        data: base64::engine::general_purpose::STANDARD.encode(data),
                    },
                },
            })
            .collect();

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                response_mime_type: self.config.response_mime_type.clone(),
                response_schema: self.config.response_schema.clone(),
            },
            safety_settings: self.config.safety_settings.clone(),
        }
    }

    /// Joins the text parts of the first candidate, the way SDKs expose
    /// `response.text`.
    fn extract_text(response: GenerateContentResponse) -> Result<String> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = response
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason);
            return Err(match reason {
                Some(reason) => {
                    Error::AiProvider(format!("Gemini blocked the prompt (reason: {})", reason))
                }
                None => Error::AiProvider("No candidates in Gemini response".to_string()),
            });
        };

        let text: String = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text),
                _ => None,
            })
            .collect();

        if text.is_empty() {
            return Err(Error::AiProvider(format!(
                "No text in Gemini response (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[async_trait]
impl ModelService for GeminiModelClient {
    async fn generate_content(&self, parts: Vec<PromptPart>) -> Result<String> {
        tracing::debug!(
            "Sending {} part(s) to Gemini model {}",
            parts.len(),
            self.model()
        );

        let request = self.build_request(parts);
        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        Self::extract_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_CONTENT_PATH_REGEX: &str = r"/v1beta/models/.+:generateContent";

    fn make_client(server: &MockServer, api_key: &str) -> GeminiModelClient {
        GeminiModelClient::new(api_key.to_string(), ModelConfig::default())
            .with_base_url(server.uri())
    }

    fn text_response(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        }))
    }

    #[tokio::test]
    async fn test_generate_content_sends_fixed_generation_parameters() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }],
                "generationConfig": {
                    "temperature": 0.5,
                    "responseMimeType": "application/json"
                },
                "safetySettings": [
                    { "category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_NONE" },
                    { "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_NONE" },
                    { "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_NONE" },
                    { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_NONE" }
                ]
            })))
            .respond_with(text_response("{\"ok\":true}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let text = client
            .generate_content(vec![PromptPart::Text("hello".to_string())])
            .await
            .unwrap();

        assert_eq!(text, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn test_response_schema_is_sent_in_generation_config() {
        let server = MockServer::start().await;
        let schema = <crate::models::LessonData as crate::models::ResponseSchema>::gemini_schema();

        Mock::given(method("POST"))
            .and(path_regex(GENERATE_CONTENT_PATH_REGEX))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": {
                        "type": "OBJECT",
                        "required": ["lesson_title", "context_intro", "vocabulary", "dialogue", "grammar_point"]
                    }
                }
            })))
            .respond_with(text_response("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiModelClient::new(
            "test-key".to_string(),
            ModelConfig::default().with_response_schema(Some(schema)),
        )
        .with_base_url(server.uri());

        client
            .generate_content(vec![PromptPart::Text("lesson".to_string())])
            .await
            .unwrap();
    }

    #[test]
    fn test_request_omits_response_schema_when_unset() {
        let client = GeminiModelClient::new("test-key".to_string(), ModelConfig::default());
        let request = client.build_request(vec![PromptPart::Text("hi".to_string())]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert!(json["generationConfig"].get("responseSchema").is_none());
    }

    #[tokio::test]
    async fn test_blob_parts_are_sent_as_base64_inline_data() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(GENERATE_CONTENT_PATH_REGEX))
            .and(body_partial_json(serde_json::json!({
                "contents": [{
                    "parts": [
                        { "text": "listen" },
                        { "inlineData": { "mimeType": "audio/webm", "data": "AAEC" } }
                    ]
                }]
            })))
            .respond_with(text_response("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        client
            .generate_content(vec![
                PromptPart::Text("listen".to_string()),
                PromptPart::Blob {
                    mime_type: "audio/webm".to_string(),
                    data: vec![0x00, 0x01, 0x02],
                },
            ])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_text_parts_are_concatenated() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(GENERATE_CONTENT_PATH_REGEX))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "{\"score\":" }, { "text": " 0}" }] }
                }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let text = client.generate_content(Vec::new()).await.unwrap();
        assert_eq!(text, "{\"score\": 0}");
    }

    #[tokio::test]
    async fn test_clients_only_send_their_own_key() {
        let server = MockServer::start().await;

        for key in ["key-alpha", "key-beta"] {
            Mock::given(method("POST"))
                .and(path_regex(GENERATE_CONTENT_PATH_REGEX))
                .and(header("x-goog-api-key", key))
                .respond_with(text_response(&format!("\"{}\"", key)))
                .expect(1)
                .mount(&server)
                .await;
        }

        let alpha = make_client(&server, "key-alpha");
        let beta = make_client(&server, "key-beta");

        let (a, b) = tokio::join!(
            alpha.generate_content(vec![PromptPart::Text("a".to_string())]),
            beta.generate_content(vec![PromptPart::Text("b".to_string())]),
        );

        assert_eq!(a.unwrap(), "\"key-alpha\"");
        assert_eq!(b.unwrap(), "\"key-beta\"");
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(GENERATE_CONTENT_PATH_REGEX))
            .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let client = make_client(&server, "bad-key");
        let err = client.generate_content(Vec::new()).await.unwrap_err();

        assert!(matches!(err, Error::AiProvider(_)));
        assert!(err.to_string().contains("status 400"));
        assert!(err.to_string().contains("API key not valid"));
    }

    #[tokio::test]
    async fn test_blocked_prompt_returns_ai_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(GENERATE_CONTENT_PATH_REGEX))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let err = client.generate_content(Vec::new()).await.unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_candidate_without_text_reports_finish_reason() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(GENERATE_CONTENT_PATH_REGEX))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "finishReason": "MAX_TOKENS" }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");
        let err = client.generate_content(Vec::new()).await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(GENERATE_CONTENT_PATH_REGEX))
            .respond_with(text_response("{}").set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = GeminiModelClient::new_with_client(
            "test-key".to_string(),
            ModelConfig::default(),
            reqwest::Client::new(),
            Duration::from_millis(100),
        )
        .with_base_url(server.uri());

        let err = client.generate_content(Vec::new()).await.unwrap_err();
        assert!(matches!(err, Error::Http(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_models_prefix_is_stripped_from_model_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(text_response("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiModelClient::new(
            "test-key".to_string(),
            ModelConfig::default().with_model("models/gemini-2.5-flash"),
        )
        .with_base_url(server.uri());

        assert_eq!(client.model(), "gemini-2.5-flash");
        client.generate_content(Vec::new()).await.unwrap();
    }
}
