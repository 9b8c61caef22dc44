use anyhow::Context as _;
use async_trait::async_trait;
use rand::Rng;
use reqwest::StatusCode;

use crate::anthropic::{self, ApiError};
use crate::config::CompanionConfig;
use crate::formats::BookRecord;

pub const SPOILER_REDIRECT: &str = "Let's focus on what you've experienced so far!";

/// The reader's current position is the spoiler boundary. The model is
/// trusted to honor it.
#[must_use]
pub fn build_prompt(book: &BookRecord, message: &str) -> String {
    let title = &book.title;
    let author = &book.author;
    let boundary = &book.current_position;
    format!(
        "You are an enthusiastic and knowledgeable literary companion discussing \"{title}\" by {author} with someone who is currently reading it.\n\
\n\
STRICT SPOILER PROTECTION:\n\
- Reader's current progress: {boundary}\n\
- You must ONLY discuss content that occurs up to and including {boundary}\n\
- NEVER hint at, foreshadow, or mention anything that happens after {boundary}\n\
- If asked about later events, redirect with: \"{SPOILER_REDIRECT}\"\n\
\n\
Your personality:\n\
- Enthusiastic but not overwhelming\n\
- Ask thoughtful follow-up questions\n\
- Encourage deeper thinking about themes, characters, and literary devices\n\
- Keep responses conversational and engaging (2-4 sentences typically)\n\
- End with a follow-up question about their reading\n\
- Show genuine interest in their reading experience\n\
\n\
Reader's message: \"{message}\"\n\
\n\
Respond as their literary companion, staying completely within spoiler boundaries."
    )
}

/// Canned replies used when the Messages API cannot be reached at all.
#[must_use]
pub fn mock_replies(book: &BookRecord) -> Vec<String> {
    let title = &book.title;
    let position = &book.current_position;
    vec![
        format!(
            "That's a really interesting point about \"{title}\"! What you've read up to {position} really sets up some fascinating themes. What stood out most to you in that section?"
        ),
        format!(
            "I love discussing \"{title}\"! Based on what you've experienced up to {position}, there's so much to unpack. Which character has surprised you the most so far?"
        ),
        format!(
            "Great question about \"{title}\"! The writing style really shines through in the sections you've read up to {position}. How are you finding the author's approach?"
        ),
        format!(
            "That's exactly the kind of insight that makes \"{title}\" so compelling! From what you've read to {position}, what themes are resonating with you?"
        ),
        format!(
            "Fascinating observation! \"{title}\" has so many layers, especially in the part you've reached at {position}. What do you think the author is trying to convey there?"
        ),
    ]
}

pub fn mock_reply<R: Rng + ?Sized>(book: &BookRecord, rng: &mut R) -> String {
    let mut replies = mock_replies(book);
    let idx = rng.gen_range(0..replies.len());
    replies.swap_remove(idx)
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("API authentication failed: {0}")]
    Auth(String),
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
    #[error("unexpected response from the companion service: {0}")]
    Protocol(String),
    #[error("request failed: {0}")]
    Http(#[source] reqwest::Error),
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ApiError>;
}

pub struct AnthropicTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl AnthropicTransport {
    pub fn new(config: &CompanionConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: anthropic::messages_endpoint(&config.base_url),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatTransport for AnthropicTransport {
    async fn complete(&self, prompt: &str) -> Result<String, ApiError> {
        anthropic::messages_text(&self.client, &self.endpoint, &self.api_key, prompt).await
    }
}

pub struct CompanionGateway {
    transport: Box<dyn ChatTransport>,
}

impl CompanionGateway {
    pub fn new(transport: Box<dyn ChatTransport>) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &CompanionConfig) -> anyhow::Result<Self> {
        Ok(Self::new(Box::new(AnthropicTransport::new(config)?)))
    }

    /// One request per call, no retry. An unreachable endpoint yields a canned
    /// offline reply instead of an error.
    pub async fn send(&self, book: &BookRecord, message: &str) -> Result<String, GatewayError> {
        let prompt = build_prompt(book, message);
        tracing::info!(
            book_id = book.id,
            boundary = %book.current_position,
            "companion request"
        );

        match self.transport.complete(&prompt).await {
            Ok(reply) => Ok(reply),
            Err(ApiError::Unreachable(err)) => {
                tracing::warn!(error = %err, "companion endpoint unreachable; using offline reply");
                Ok(mock_reply(book, &mut rand::thread_rng()))
            }
            Err(ApiError::Status { status, message }) if status == StatusCode::UNAUTHORIZED => {
                Err(GatewayError::Auth(message))
            }
            Err(ApiError::Status { status, message }) => Err(GatewayError::Api { status, message }),
            Err(ApiError::Protocol(detail)) => Err(GatewayError::Protocol(detail)),
            Err(ApiError::Http(err)) => Err(GatewayError::Http(err)),
        }
    }
}
