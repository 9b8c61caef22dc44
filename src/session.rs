use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;
use tokio::io::AsyncBufReadExt as _;

use crate::cli::{AskArgs, ChatArgs};
use crate::companion::{CompanionGateway, GatewayError};
use crate::config::CompanionConfig;
use crate::formats::{BookId, BookRecord};
use crate::library;
use crate::progress::Direction;
use crate::store::{BookStore, KeyValueSlot};

pub const THINKING: &str = "💭 Thinking...";
const PROGRESS_BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Companion,
}

impl Sender {
    fn label(self) -> &'static str {
        match self {
            Self::User => "you",
            Self::Companion => "companion",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: u64,
    pub sender: Sender,
    pub text: String,
}

/// Transcript of one open discussion. Never persisted.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl Conversation {
    pub fn greeting(book: &BookRecord) -> String {
        format!(
            "Hi! I'm ready to discuss \"{}\" with you. I'll only reference content up to {} to avoid spoilers. What would you like to talk about?",
            book.title, book.current_position
        )
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push(&mut self, sender: Sender, text: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id,
            sender,
            text: text.into(),
        });
        id
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.messages.len();
        self.messages.retain(|message| message.id != id);
        self.messages.len() != before
    }

    fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Text shown in place of a reply when the companion call fails.
pub fn apology(err: &GatewayError) -> String {
    match err {
        GatewayError::Auth(_) => {
            "I couldn't sign in to the companion service. Please check the API key configuration."
                .to_owned()
        }
        other => format!(
            "I'm having trouble connecting right now. Let me try again in a moment. Error: {other}"
        ),
    }
}

/// The book currently open for discussion and its transcript.
#[derive(Debug)]
pub struct DiscussionSession {
    book_id: BookId,
    conversation: Conversation,
}

impl DiscussionSession {
    /// Selects `id` and starts a fresh transcript with the greeting.
    pub fn open<S: KeyValueSlot>(store: &BookStore<S>, id: BookId) -> anyhow::Result<Self> {
        let book = store
            .find_by_id(id)
            .ok_or_else(|| anyhow::anyhow!("book not found: {id}"))?;
        let mut conversation = Conversation::default();
        conversation.push(Sender::Companion, Conversation::greeting(book));
        tracing::debug!(book_id = id, "opened discussion");
        Ok(Self {
            book_id: id,
            conversation,
        })
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn book<'a, S: KeyValueSlot>(
        &self,
        store: &'a BookStore<S>,
    ) -> anyhow::Result<&'a BookRecord> {
        store
            .find_by_id(self.book_id)
            .ok_or_else(|| anyhow::anyhow!("book not found: {}", self.book_id))
    }

    /// Progress changes are silent: the transcript is left as is.
    pub fn advance<S: KeyValueSlot>(
        &self,
        store: &mut BookStore<S>,
        direction: Direction,
    ) -> anyhow::Result<BookRecord> {
        store
            .advance(self.book_id, direction)
            .context("save progress")?
            .ok_or_else(|| anyhow::anyhow!("book not found: {}", self.book_id))
    }

    /// Appends the reader's message and the companion's answer. Failures are
    /// rendered as an apology in the transcript, not returned. Blank input is
    /// ignored and yields `None`.
    pub async fn send<S: KeyValueSlot>(
        &mut self,
        store: &BookStore<S>,
        gateway: &CompanionGateway,
        text: &str,
    ) -> anyhow::Result<Option<&ChatMessage>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let book = self.book(store)?.clone();

        self.conversation.push(Sender::User, text);
        let thinking = self.conversation.push(Sender::Companion, THINKING);

        let reply = match gateway.send(&book, text).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(book_id = book.id, error = %err, "companion request failed");
                apology(&err)
            }
        };

        self.conversation.remove(thinking);
        self.conversation.push(Sender::Companion, reply);
        Ok(self.conversation.last())
    }
}

/// `[#####---------------]  25%  Chapter 5`
pub fn render_progress(percent: u32, label: &str) -> String {
    let percent = percent.min(100) as usize;
    let filled = percent * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent:>3}%  {label}",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}

fn print_message(message: &ChatMessage) {
    println!("{}: {}", message.sender.label(), message.text);
}

pub async fn ask(data_dir: &Path, args: AskArgs) -> anyhow::Result<()> {
    let config = CompanionConfig::from_env().context("load companion config")?;
    let gateway = CompanionGateway::from_config(&config)?;
    let store = library::open_store(data_dir);

    let mut session = DiscussionSession::open(&store, args.id)?;
    if let Some(reply) = session.send(&store, &gateway, &args.message).await? {
        println!("{}", reply.text);
    }
    Ok(())
}

pub async fn chat(data_dir: &Path, args: ChatArgs) -> anyhow::Result<()> {
    let config = CompanionConfig::from_env().context("load companion config")?;
    let gateway = CompanionGateway::from_config(&config)?;
    let mut store = library::open_store(data_dir);

    let mut session = DiscussionSession::open(&store, args.id)?;
    let book = session.book(&store)?;
    println!("{} by {}", book.title, book.author);
    println!("{}", render_progress(book.progress, &book.current_position));
    for message in session.conversation().messages() {
        print_message(message);
    }
    println!("(type a message, or /next, /prev, /quit)");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("flush stdout")?;

        let Some(line) = lines.next_line().await.context("read stdin")? else {
            break;
        };
        let direction = match line.trim() {
            "/quit" => break,
            "/next" => Direction::Next,
            "/prev" => Direction::Prev,
            message => {
                if let Some(reply) = session.send(&store, &gateway, message).await? {
                    print_message(reply);
                }
                continue;
            }
        };
        let book = session.advance(&mut store, direction)?;
        println!("{}", render_progress(book.progress, &book.current_position));
    }

    Ok(())
}
