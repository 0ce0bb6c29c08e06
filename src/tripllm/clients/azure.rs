//! `AzureOpenAIClient` implements `ClientWrapper` for a chat deployment hosted
//! on Azure OpenAI.
//!
//! Azure addresses the model by deployment name in the URL path, pins the
//! API surface with an `api-version` query parameter, and authenticates with
//! an `api-key` header instead of a bearer token.
//!
//! ```rust,no_run
//! use tripllm::clients::azure::AzureOpenAIClient;
//! use tripllm::AzureOpenAIConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AzureOpenAIClient::new(AzureOpenAIConfig::from_env()?);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::client_wrapper::{ClientWrapper, Message, Role, ServiceError, TokenUsage};
use crate::clients::common::{format_messages, get_shared_http_client, send_and_track, ChatRequest};
use crate::tripllm::config::AzureOpenAIConfig;

pub struct AzureOpenAIClient {
    http: reqwest::Client,
    config: AzureOpenAIConfig,
    token_usage: Mutex<Option<TokenUsage>>,
}

impl AzureOpenAIClient {
    pub fn new(config: AzureOpenAIConfig) -> Self {
        AzureOpenAIClient {
            http: get_shared_http_client().clone(),
            config,
            token_usage: Mutex::new(None),
        }
    }

    /// Build a client straight from the `AZURE_OPENAI_*` environment variables.
    pub fn from_env() -> Result<Self, ServiceError> {
        Ok(Self::new(AzureOpenAIConfig::from_env()?))
    }

    pub fn config(&self) -> &AzureOpenAIConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.config.endpoint, self.config.deployment
        )
    }
}

#[async_trait]
impl ClientWrapper for AzureOpenAIClient {
    fn model_name(&self) -> &str {
        &self.config.deployment
    }

    async fn send_message(&self, messages: &[Message]) -> Result<Message, ServiceError> {
        // The deployment already fixes the model.
        let body = ChatRequest {
            model: None,
            messages: format_messages(messages),
            temperature: self.config.temperature,
        };

        let request = self
            .http
            .post(self.completions_url())
            .query(&[("api-version", self.config.api_version.as_str())])
            .header("api-key", &self.config.api_key)
            .timeout(self.config.request_timeout)
            .json(&body);

        let content = send_and_track(request, &self.token_usage).await?;
        Ok(Message::new(Role::Assistant, content))
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}
