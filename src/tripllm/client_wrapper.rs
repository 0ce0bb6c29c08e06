use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use tokio::sync::Mutex;

// src/tripllm/client_wrapper.rs

/// Represents the possible roles for a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    // set by the developer to steer the model's responses
    System,
    // the input handed to an agent
    User,
    // lets the model know the content was generated as a response to a user message
    Assistant,
}

/// How many tokens were spent on prompt vs. completion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

/// Represents a generic message to be sent to an LLM.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: String,
}

impl Message {
    /// Build a message with the given role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Message {
            role,
            content: content.into(),
        }
    }
}

/// Failures reported by a completion service.
///
/// Agents never let these escape: they are folded into the `error` entry of
/// an [`AgentResult`](crate::agent::AgentResult).
///
/// ```
/// use tripllm::client_wrapper::ServiceError;
///
/// let err = ServiceError::Api { status: 500, message: "boom".into() };
/// assert_eq!(err.to_string(), "API error (HTTP 500): boom");
/// assert!(!ServiceError::Auth("bad key".into()).is_interruption());
/// assert!(ServiceError::Cancelled.is_interruption());
/// assert!(ServiceError::DeadlineExceeded.is_interruption());
/// assert!(!ServiceError::Timeout.is_interruption());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The request never produced an HTTP response (DNS, TLS, connection reset...).
    Network(String),
    /// The service rejected the credentials (HTTP 401/403).
    Auth(String),
    /// The service asked us to slow down (HTTP 429).
    RateLimited(String),
    /// Any other non-success HTTP status.
    Api { status: u16, message: String },
    /// The body could not be parsed or carried no completion.
    MalformedResponse(String),
    /// The HTTP request hit the client's own request timeout.
    Timeout,
    /// The caller's session deadline passed while the call was in flight.
    DeadlineExceeded,
    /// The caller cancelled the planning session.
    Cancelled,
    /// The client could not be configured (missing endpoint, key...).
    Config(String),
}

impl ServiceError {
    /// `true` for failures caused by the caller's deadline or cancellation
    /// rather than by the service itself.
    pub fn is_interruption(&self) -> bool {
        matches!(self, ServiceError::DeadlineExceeded | ServiceError::Cancelled)
    }

    /// Short machine-readable tag, recorded next to the `error` entry of a
    /// failed result.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Network(_) => "network",
            ServiceError::Auth(_) => "auth",
            ServiceError::RateLimited(_) => "rate_limited",
            ServiceError::Api { .. } => "api",
            ServiceError::MalformedResponse(_) => "malformed_response",
            ServiceError::Timeout => "timeout",
            ServiceError::DeadlineExceeded => "deadline_exceeded",
            ServiceError::Cancelled => "cancelled",
            ServiceError::Config(_) => "config",
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Network(msg) => write!(f, "Network error: {}", msg),
            ServiceError::Auth(msg) => write!(f, "Authentication failed: {}", msg),
            ServiceError::RateLimited(msg) => write!(f, "Rate limited: {}", msg),
            ServiceError::Api { status, message } => {
                write!(f, "API error (HTTP {}): {}", status, message)
            }
            ServiceError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
            ServiceError::Timeout => write!(f, "Completion call timed out"),
            ServiceError::DeadlineExceeded => write!(f, "Planning session deadline exceeded"),
            ServiceError::Cancelled => write!(f, "Completion call cancelled"),
            ServiceError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for ServiceError {}

/// A ClientWrapper is a wrapper around a specific text-completion service.
/// It does not keep track of any conversation; the orchestrator owns history
/// and every agent call is a fresh system + user exchange.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Name of the model (or deployment) requests are sent to.
    fn model_name(&self) -> &str;

    /// Send a message to the LLM and get a response.
    /// - `messages`: The messages to send in the request.
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ServiceError>;

    /// Run one completion: `role_instructions` as the system prompt, `input`
    /// as the user turn. Returns the generated text.
    async fn complete(&self, role_instructions: &str, input: &str) -> Result<String, ServiceError> {
        let messages = [
            Message::new(Role::System, role_instructions),
            Message::new(Role::User, input),
        ];
        let reply = self.send_message(&messages).await?;
        Ok(reply.content)
    }

    /// Hook to retrieve usage from the *last* send_message() call.
    /// Default impl reads `usage_slot()`, so wrappers without tracking return None.
    async fn get_last_usage(&self) -> Option<TokenUsage> {
        match self.usage_slot() {
            Some(slot) => slot.lock().await.clone(),
            None => None,
        }
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        // ClientWrapper implementations supporting TokenUsage tracking should return a Mutex<Option<TokenUsage>> by overriding this method.
        None
    }
}
