use reqwest::StatusCode;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const API_VERSION: &str = "2023-06-01";
pub const MODEL: &str = "claude-3-5-sonnet-20241022";
pub const MAX_TOKENS: u32 = 1000;

pub fn messages_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/messages")
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never reached the server (refused, DNS, connect failure).
    #[error("endpoint unreachable: {0}")]
    Unreachable(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Messages API error ({status}): {message}")]
    Status { status: StatusCode, message: String },
    #[error("unexpected response format: {0}")]
    Protocol(String),
    #[error("request failed: {0}")]
    Http(#[source] reqwest::Error),
}

impl ApiError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::Unreachable(Box::new(err))
        } else {
            Self::Http(err)
        }
    }
}

/// Sends `prompt` as a single user message and returns the text of the first
/// content block.
pub async fn messages_text(
    client: &reqwest::Client,
    endpoint: &str,
    api_key: &str,
    prompt: &str,
) -> Result<String, ApiError> {
    let body = serde_json::json!({
        "model": MODEL,
        "max_tokens": MAX_TOKENS,
        "messages": [
            { "role": "user", "content": prompt }
        ],
    });

    let response = client
        .post(endpoint)
        .header("x-api-key", api_key)
        .header("anthropic-version", API_VERSION)
        .json(&body)
        .send()
        .await
        .map_err(ApiError::from_reqwest)?;

    let status = response.status();
    let raw = response.text().await.map_err(ApiError::from_reqwest)?;
    if !status.is_success() {
        tracing::warn!(%status, body = %raw, "Messages API error");
        let message = parse_error_message(&raw).unwrap_or(raw);
        return Err(ApiError::Status { status, message });
    }

    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|err| ApiError::Protocol(format!("response is not JSON: {err}")))?;
    tracing::debug!(response = %value, "Messages API response");
    extract_first_text(&value)
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

fn extract_first_text(value: &serde_json::Value) -> Result<String, ApiError> {
    match value.pointer("/content/0/text").and_then(|v| v.as_str()) {
        Some(text) if !text.is_empty() => Ok(text.to_owned()),
        _ => Err(ApiError::Protocol(
            "missing `content[0].text` in response".to_owned(),
        )),
    }
}
