//! Configuration for tripllm.
//!
//! Provides [`AzureOpenAIConfig`] for the Azure deployment client and
//! [`OrchestratorConfig`] for the hand-off loop. Both are plain structs that
//! users construct manually; no config-file parsing dependencies are required.
//! The Azure settings can also be read from the environment.
//!
//! # Example
//!
//! ```rust
//! use tripllm::OrchestratorConfig;
//!
//! let config = OrchestratorConfig::default();
//! assert_eq!(config.max_iterations, 10);
//! assert_eq!(config.context_window, 2);
//! ```

use crate::tripllm::client_wrapper::ServiceError;
use std::env;
use std::time::Duration;

/// Hard cap on agent invocations per planning session.
pub const MAX_ITERATIONS: usize = 10;

/// Number of most recent results summarised into each agent's context.
pub const CONTEXT_WINDOW: usize = 2;

/// Sampling temperature used by the bundled clients: creative but consistent.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Per-request HTTP timeout used by the bundled clients.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub const ENV_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const ENV_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
pub const ENV_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const ENV_API_KEY: &str = "AZURE_OPENAI_API_KEY";

/// Tunables for the [`Orchestrator`](crate::orchestration::Orchestrator) loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Maximum agent invocations for a single `plan` call. Must be at least 1.
    pub max_iterations: usize,
    /// How many prior results are digested into the next agent's input.
    pub context_window: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            context_window: CONTEXT_WINDOW,
        }
    }
}

/// Connection settings for an Azure OpenAI chat deployment.
///
/// ```rust
/// use tripllm::AzureOpenAIConfig;
///
/// let config = AzureOpenAIConfig::new(
///     "https://my-resource.openai.azure.com/",
///     "gpt-4o-travel",
///     "2024-06-01",
///     "secret",
/// );
/// assert_eq!(config.endpoint, "https://my-resource.openai.azure.com");
/// assert_eq!(config.temperature, 0.7);
/// ```
#[derive(Debug, Clone)]
pub struct AzureOpenAIConfig {
    /// Resource endpoint, without a trailing slash.
    pub endpoint: String,
    /// Deployment name; also reported as the model name.
    pub deployment: String,
    /// Value of the `api-version` query parameter.
    pub api_version: String,
    /// Sent in the `api-key` header.
    pub api_key: String,
    pub temperature: f32,
    pub request_timeout: Duration,
}

impl AzureOpenAIConfig {
    pub fn new(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            deployment: deployment.into(),
            api_version: api_version.into(),
            api_key: api_key.into(),
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Read the four `AZURE_OPENAI_*` variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] naming the first variable that is
    /// missing or empty.
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads through `lookup`, which
    /// keeps tests away from the real process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| -> Result<String, ServiceError> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => Err(ServiceError::Config(format!(
                    "Missing required environment variable: {}",
                    key
                ))),
            }
        };

        Ok(Self::new(
            require(ENV_ENDPOINT)?,
            require(ENV_DEPLOYMENT)?,
            require(ENV_API_VERSION)?,
            require(ENV_API_KEY)?,
        ))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
