mod anthropic_stub;

use anthropic_stub::{AnthropicStub, StubBehavior, unreachable_base_url};
use chrono::Utc;
use libretto::companion::{CompanionGateway, GatewayError, mock_replies};
use libretto::config::CompanionConfig;
use libretto::formats::BookRecord;
use reqwest::StatusCode;

fn book() -> BookRecord {
    BookRecord {
        id: 1,
        title: "Middlemarch".to_owned(),
        author: "George Eliot".to_owned(),
        current_position: "Chapter 12".to_owned(),
        estimated_total: "24 chapters".to_owned(),
        progress: 50,
        date_added: Utc::now(),
    }
}

fn gateway(base_url: &str) -> anyhow::Result<CompanionGateway> {
    let config = CompanionConfig::new("sk-test-key".to_owned(), Some(base_url.to_owned()))?;
    CompanionGateway::from_config(&config)
}

#[tokio::test]
async fn send_posts_spoiler_bounded_prompt_and_returns_first_block() -> anyhow::Result<()> {
    let stub = AnthropicStub::spawn(StubBehavior::Reply(
        "Dorothea's choice is so telling. What did you make of Casaubon?".to_owned(),
    ));

    let reply = gateway(&stub.base_url)?
        .send(&book(), "Why did Dorothea marry him?")
        .await?;
    assert_eq!(
        reply,
        "Dorothea's choice is so telling. What did you make of Casaubon?"
    );

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.api_key.as_deref(), Some("sk-test-key"));
    assert_eq!(request.version.as_deref(), Some("2023-06-01"));
    assert_eq!(request.body["model"], "claude-3-5-sonnet-20241022");
    assert_eq!(request.body["max_tokens"], 1000);

    let messages = request.body["messages"].as_array().expect("messages array");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
    let prompt = messages[0]["content"].as_str().expect("prompt text");
    assert!(prompt.contains("\"Middlemarch\" by George Eliot"));
    assert!(prompt.contains("up to and including Chapter 12"));
    assert!(prompt.contains("Why did Dorothea marry him?"));
    Ok(())
}

#[tokio::test]
async fn unauthorized_is_an_auth_error() -> anyhow::Result<()> {
    let stub = AnthropicStub::spawn(StubBehavior::Status(
        401,
        r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#
            .to_owned(),
    ));

    let err = gateway(&stub.base_url)?
        .send(&book(), "Hello")
        .await
        .unwrap_err();
    match err {
        GatewayError::Auth(message) => assert_eq!(message, "invalid x-api-key"),
        other => panic!("expected auth error, got {other:?}"),
    }
    assert_eq!(stub.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn rate_limit_is_surfaced_without_retry() -> anyhow::Result<()> {
    let stub = AnthropicStub::spawn(StubBehavior::Status(429, "slow down".to_owned()));

    let err = gateway(&stub.base_url)?
        .send(&book(), "Hello")
        .await
        .unwrap_err();
    match err {
        GatewayError::Api { status, message } => {
            assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
            assert_eq!(message, "slow down");
        }
        other => panic!("expected api error, got {other:?}"),
    }
    assert_eq!(stub.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn unexpected_payload_is_a_protocol_error() -> anyhow::Result<()> {
    let stub = AnthropicStub::spawn(StubBehavior::MissingContent);

    let err = gateway(&stub.base_url)?
        .send(&book(), "Hello")
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Protocol(_)), "err={err:?}");
    Ok(())
}

#[tokio::test]
async fn unreachable_endpoint_falls_back_to_offline_reply() -> anyhow::Result<()> {
    let reply = gateway(&unreachable_base_url())?
        .send(&book(), "Hello")
        .await?;

    assert!(mock_replies(&book()).contains(&reply), "reply={reply}");
    assert!(reply.contains("\"Middlemarch\""));
    assert!(reply.contains("Chapter 12"));
    Ok(())
}
