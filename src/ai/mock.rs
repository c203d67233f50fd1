use super::{ModelClientFactory, ModelService, PromptPart, DEFAULT_MODEL};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// One `generate_content` call seen by a mock client.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub api_key: String,
    pub response_schema: Option<Value>,
    pub parts: Vec<PromptPart>,
}

impl RecordedCall {
    /// Concatenated text parts, i.e. the prompt the model would have read.
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                PromptPart::Text(text) => Some(text.as_str()),
                PromptPart::Blob { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Failure(String),
}

#[derive(Default)]
struct MockState {
    replies: Vec<MockReply>,
    calls: Vec<RecordedCall>,
    created: usize,
}

/// In-memory [`ModelClientFactory`] recording every client and call.
///
/// Replies are served in order and cycle once exhausted. With no replies
/// configured every call answers with an empty JSON object.
#[derive(Clone, Default)]
pub struct MockModelFactory {
    state: Arc<Mutex<MockState>>,
}

impl MockModelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, response: String) -> Self {
        self.state
            .lock()
            .unwrap()
            .replies
            .push(MockReply::Text(response));
        self
    }

    /// Queue a reply that fails as an upstream provider error.
    pub fn with_error(self, message: String) -> Self {
        self.state
            .lock()
            .unwrap()
            .replies
            .push(MockReply::Failure(message));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn get_calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn get_created_count(&self) -> usize {
        self.state.lock().unwrap().created
    }
}

impl ModelClientFactory for MockModelFactory {
    fn create(&self, api_key: &str, response_schema: Option<Value>) -> Box<dyn ModelService> {
        self.state.lock().unwrap().created += 1;
        Box::new(MockModelClient {
            api_key: api_key.to_string(),
            response_schema,
            state: self.state.clone(),
        })
    }

    fn model(&self) -> &str {
        DEFAULT_MODEL
    }
}

pub struct MockModelClient {
    api_key: String,
    response_schema: Option<Value>,
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl ModelService for MockModelClient {
    async fn generate_content(&self, parts: Vec<PromptPart>) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall {
            api_key: self.api_key.clone(),
            response_schema: self.response_schema.clone(),
            parts,
        });

        if state.replies.is_empty() {
            return Ok("{}".to_string());
        }

        let index = (state.calls.len() - 1) % state.replies.len();
        match &state.replies[index] {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Failure(message) => Err(Error::AiProvider(message.clone())),
        }
    }
}
