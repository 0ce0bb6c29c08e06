//! The `OpenAIClient` struct implements `ClientWrapper` for OpenAI's Chat
//! Completions API (and any OpenAI-compatible endpoint), capturing both the
//! assistant response and token usage for the last request.
//!
//! # Example
//!
//! ```rust,no_run
//! use tripllm::clients::openai::OpenAIClient;
//! use tripllm::client_wrapper::ClientWrapper;
//!
//! #[tokio::main]
//! async fn main() {
//!     let secret_key: String = std::env::var("OPEN_AI_SECRET").expect("OPEN_AI_SECRET not set");
//!     let client = OpenAIClient::new_with_model_string(&secret_key, "gpt-4o-mini");
//!
//!     let reply = client
//!         .complete("You are a travel planner.", "Two days in Lisbon?")
//!         .await
//!         .unwrap();
//!     println!("Assistant: {}", reply);
//!
//!     if let Some(usage) = client.get_last_usage().await {
//!         println!("Tokens: {}", usage.total_tokens);
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::client_wrapper::{ClientWrapper, Message, Role, ServiceError, TokenUsage};
use crate::clients::common::{format_messages, get_shared_http_client, send_and_track, ChatRequest};
use crate::tripllm::config::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_TEMPERATURE};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client wrapper for OpenAI's Chat Completions API.
pub struct OpenAIClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
    /// Model name that will be injected into each request.
    model: String,
    temperature: f32,
    request_timeout: Duration,
    /// Storage for the token usage returned by the most recent request.
    token_usage: Mutex<Option<TokenUsage>>,
}

impl OpenAIClient {
    /// Construct a new client using the provided API key and explicit model name.
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, DEFAULT_BASE_URL)
    }

    /// Construct a client targeting a custom OpenAI compatible base URL
    /// (e.g. `http://localhost:11434/v1`).
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        OpenAIClient {
            http: get_shared_http_client().clone(),
            secret_key: secret_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model_name.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            token_usage: Mutex::new(None),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_message(&self, messages: &[Message]) -> Result<Message, ServiceError> {
        let body = ChatRequest {
            model: Some(&self.model),
            messages: format_messages(messages),
            temperature: self.temperature,
        };

        let mut request = self
            .http
            .post(self.completions_url())
            .timeout(self.request_timeout)
            .json(&body);
        if !self.secret_key.is_empty() {
            request = request.bearer_auth(&self.secret_key);
        }

        let content = send_and_track(request, &self.token_usage).await?;
        Ok(Message::new(Role::Assistant, content))
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}
