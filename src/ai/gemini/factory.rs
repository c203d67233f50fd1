use super::client::DEFAULT_BASE_URL;
use super::model::{GeminiModelClient, DEFAULT_TIMEOUT};
use crate::ai::{ModelClientFactory, ModelConfig, ModelService};
use crate::models::Config;
use serde_json::Value;
use std::time::Duration;

/// Builds per-request Gemini clients that share one connection pool.
///
/// The factory itself never holds a credential.
#[derive(Clone)]
pub struct GeminiClientFactory {
    client: reqwest::Client,
    config: ModelConfig,
    base_url: String,
    timeout: Duration,
}

impl GeminiClientFactory {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ModelConfig::default().with_model(config.gemini_model.clone()))
            .with_base_url(config.gemini_base_url.clone())
            .with_timeout(config.upstream_timeout)
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ModelClientFactory for GeminiClientFactory {
    fn create(&self, api_key: &str, response_schema: Option<Value>) -> Box<dyn ModelService> {
        Box::new(
            GeminiModelClient::new_with_client(
                api_key.to_string(),
                self.config.clone().with_response_schema(response_schema),
                self.client.clone(),
                self.timeout,
            )
            .with_base_url(self.base_url.clone()),
        )
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
