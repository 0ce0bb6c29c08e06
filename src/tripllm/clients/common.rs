use crate::client_wrapper::{Message, Role, ServiceError, TokenUsage};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

lazy_static! {
    /// One connection pool shared by every bundled client.
    static ref SHARED_HTTP_CLIENT: reqwest::Client = reqwest::Client::new();
}

/// Access the process-wide HTTP client. Cloning a `reqwest::Client` is cheap
/// and keeps the same pool.
pub fn get_shared_http_client() -> &'static reqwest::Client {
    &SHARED_HTTP_CLIENT
}

/// Body of a chat-completions request, shared by OpenAI and Azure.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: Role,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatUsage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Convert our messages into the wire format.
pub fn format_messages(messages: &[Message]) -> Vec<ChatMessage<'_>> {
    messages
        .iter()
        .map(|msg| ChatMessage {
            role: msg.role,
            content: &msg.content,
        })
        .collect()
}

/// Map a non-success HTTP status to a [`ServiceError`].
pub fn error_for_status(status: u16, body: String) -> ServiceError {
    match status {
        401 | 403 => ServiceError::Auth(body),
        429 => ServiceError::RateLimited(body),
        _ => ServiceError::Api {
            status,
            message: body,
        },
    }
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Network(err.to_string())
    }
}

/// Pull the assistant text and usage out of a parsed response.
pub fn extract_completion(
    response: ChatResponse,
) -> Result<(String, Option<TokenUsage>), ServiceError> {
    let usage = response.usage.map(|u| TokenUsage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::MalformedResponse("No choices in response".into()))?;

    Ok((choice.message.content.unwrap_or_default(), usage))
}

/// Send a prepared chat request, record its usage, and return the assistant's content.
pub async fn send_and_track(
    request: reqwest::RequestBuilder,
    usage_slot: &Mutex<Option<TokenUsage>>,
) -> Result<String, ServiceError> {
    let response = request.send().await.map_err(|err| {
        log::error!(
            "tripllm::clients::common::send_and_track(...): transport error: {}",
            err
        );
        transport_error(err)
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        log::error!(
            "tripllm::clients::common::send_and_track(...): HTTP {}: {}",
            status.as_u16(),
            body
        );
        return Err(error_for_status(status.as_u16(), body));
    }

    let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|err| ServiceError::MalformedResponse(err.to_string()))?;

    let (content, usage) = extract_completion(parsed)?;

    // Store it for get_last_usage()
    *usage_slot.lock().await = usage;

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_for_status_classifies_auth_and_rate_limits() {
        assert_eq!(error_for_status(401, "no".into()), ServiceError::Auth("no".into()));
        assert_eq!(error_for_status(403, "no".into()), ServiceError::Auth("no".into()));
        assert_eq!(
            error_for_status(429, "slow".into()),
            ServiceError::RateLimited("slow".into())
        );
        assert_eq!(
            error_for_status(503, "down".into()),
            ServiceError::Api {
                status: 503,
                message: "down".into()
            }
        );
    }

    #[test]
    fn test_extract_completion_reads_content_and_usage() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Visit Kyoto."}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        let (content, usage) = extract_completion(parsed).unwrap();
        assert_eq!(content, "Visit Kyoto.");
        assert_eq!(usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_extract_completion_without_choices_is_malformed() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        match extract_completion(parsed) {
            Err(ServiceError::MalformedResponse(_)) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_format_messages_serializes_lowercase_roles() {
        let messages = vec![
            Message::new(Role::System, "be brief"),
            Message::new(Role::User, "hi"),
        ];
        let request = ChatRequest {
            model: Some("gpt-4o"),
            messages: format_messages(&messages),
            temperature: 0.7,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["model"], "gpt-4o");
    }
}
