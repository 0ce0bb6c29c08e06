use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tripllm::client_wrapper::{ClientWrapper, ServiceError};
use tripllm::clients::azure::AzureOpenAIClient;
use tripllm::clients::common::error_for_status;
use tripllm::clients::openai::OpenAIClient;
use tripllm::config::{ENV_API_KEY, ENV_API_VERSION, ENV_DEPLOYMENT, ENV_ENDPOINT};
use tripllm::{init_logger, AzureOpenAIConfig};

/// Serve exactly one HTTP response and hand back the raw request text.
async fn one_shot_server(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buffer = [0u8; 4096];

        loop {
            let read = socket.read(&mut buffer).await.unwrap();
            if read == 0 {
                break;
            }
            raw.extend_from_slice(&buffer[..read]);

            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let lower = line.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .map(|value| value.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();

        String::from_utf8_lossy(&raw).to_string()
    });

    (address, handle)
}

const COMPLETION_BODY: &str = r#"{
  "choices": [{"index": 0, "message": {"role": "assistant", "content": "Pack light."}}],
  "usage": {"prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49}
}"#;

#[tokio::test]
async fn test_openai_client_completes_and_tracks_usage() {
    init_logger();
    let (address, server) = one_shot_server(200, COMPLETION_BODY).await;
    let client = OpenAIClient::new_with_base_url("sk-test", "gpt-4o-mini", &format!("{}/v1", address));

    let text = client.complete("You plan trips.", "Lisbon?").await.unwrap();
    assert_eq!(text, "Pack light.");

    let usage = client.get_last_usage().await.unwrap();
    assert_eq!(usage.input_tokens, 42);
    assert_eq!(usage.output_tokens, 7);
    assert_eq!(usage.total_tokens, 49);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1/chat/completions"));
    assert!(request
        .to_ascii_lowercase()
        .contains("authorization: bearer sk-test"));
    assert!(request.contains("\"model\":\"gpt-4o-mini\""));
    assert!(request.contains("\"role\":\"system\""));
    assert!(request.contains("You plan trips."));
}

#[tokio::test]
async fn test_azure_client_targets_deployment() {
    let (address, server) = one_shot_server(200, COMPLETION_BODY).await;
    let config = AzureOpenAIConfig::new(format!("{}/", address), "travel-gpt", "2024-06-01", "az-key");
    let client = AzureOpenAIClient::new(config);
    assert_eq!(client.model_name(), "travel-gpt");

    let text = client.complete("You plan trips.", "Oslo?").await.unwrap();
    assert_eq!(text, "Pack light.");

    let request = server.await.unwrap();
    assert!(request.starts_with(
        "POST /openai/deployments/travel-gpt/chat/completions?api-version=2024-06-01"
    ));
    assert!(request.to_ascii_lowercase().contains("api-key: az-key"));
    assert!(!request.contains("\"model\""));
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error() {
    let (address, _server) = one_shot_server(401, r#"{"error":"bad key"}"#).await;
    let client = OpenAIClient::new_with_base_url("wrong", "gpt-4o-mini", &address);

    let err = client.complete("sys", "user").await.unwrap_err();
    assert!(matches!(err, ServiceError::Auth(_)));
}

#[tokio::test]
async fn test_too_many_requests_maps_to_rate_limited() {
    let (address, _server) = one_shot_server(429, r#"{"error":"slow down"}"#).await;
    let client = OpenAIClient::new_with_base_url("k", "gpt-4o-mini", &address);

    let err = client.complete("sys", "user").await.unwrap_err();
    assert!(matches!(err, ServiceError::RateLimited(_)));
}

#[tokio::test]
async fn test_response_without_choices_is_malformed() {
    let (address, _server) = one_shot_server(200, r#"{"choices": []}"#).await;
    let client = OpenAIClient::new_with_base_url("k", "gpt-4o-mini", &address);

    let err = client.complete("sys", "user").await.unwrap_err();
    assert!(matches!(err, ServiceError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = OpenAIClient::new_with_base_url("k", "gpt-4o-mini", &address);
    let err = client.complete("sys", "user").await.unwrap_err();
    assert!(matches!(err, ServiceError::Network(_)));
}

#[test]
fn test_status_mapping() {
    assert!(matches!(
        error_for_status(403, "no".into()),
        ServiceError::Auth(_)
    ));
    assert_eq!(
        error_for_status(503, "down".into()),
        ServiceError::Api {
            status: 503,
            message: "down".to_string()
        }
    );
}

#[test]
fn test_azure_config_from_lookup() {
    let lookup = |key: &str| match key {
        k if k == ENV_ENDPOINT => Some("https://contoso.openai.azure.com".to_string()),
        k if k == ENV_DEPLOYMENT => Some("gpt4o".to_string()),
        k if k == ENV_API_VERSION => Some("2024-02-15-preview".to_string()),
        k if k == ENV_API_KEY => Some("secret".to_string()),
        _ => None,
    };

    let config = AzureOpenAIConfig::from_lookup(lookup).unwrap();
    assert_eq!(config.deployment, "gpt4o");
    assert!((config.temperature - 0.7).abs() < f32::EPSILON);

    let missing_key = AzureOpenAIConfig::from_lookup(|key: &str| {
        if key == ENV_API_KEY {
            None
        } else {
            lookup(key)
        }
    })
    .unwrap_err();
    assert_eq!(
        missing_key.to_string(),
        "Configuration error: Missing required environment variable: AZURE_OPENAI_API_KEY"
    );
}
