use std::cell::RefCell;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Utc;

use crate::formats::{BookId, BookRecord};
use crate::progress::{self, Direction};

pub const BOOKS_SLOT: &str = "libretto_books";

/// One named, durable slot holding a serialized value.
pub trait KeyValueSlot {
    fn read(&self) -> anyhow::Result<Option<String>>;
    fn write(&self, value: &str) -> anyhow::Result<()>;
}

/// `<base_dir>/<slot>.json` on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFsSlot {
    path: PathBuf,
}

impl LocalFsSlot {
    pub fn new(base_dir: impl AsRef<Path>, slot: &str) -> Self {
        Self {
            path: base_dir.as_ref().join(format!("{slot}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueSlot for LocalFsSlot {
    fn read(&self) -> anyhow::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("read: {}", self.path.display())),
        }
    }

    fn write(&self, value: &str) -> anyhow::Result<()> {
        write_atomic(&self.path, value)
    }
}

#[derive(Debug, Default)]
pub struct MemorySlot {
    value: RefCell<Option<String>>,
}

impl MemorySlot {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            value: RefCell::new(initial),
        }
    }
}

impl KeyValueSlot for MemorySlot {
    fn read(&self) -> anyhow::Result<Option<String>> {
        Ok(self.value.borrow().clone())
    }

    fn write(&self, value: &str) -> anyhow::Result<()> {
        *self.value.borrow_mut() = Some(value.to_owned());
        Ok(())
    }
}

fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    std::fs::write(&tmp_path, contents)
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Author,
    Position,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Position => "current position",
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{field} must not be empty")]
pub struct ValidationError {
    pub field: Field,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("persist books: {0:#}")]
    Storage(anyhow::Error),
}

/// In-memory book list mirrored to a single slot. Every mutation writes the
/// whole list back before returning, and the in-memory list only changes once
/// that write succeeds.
pub struct BookStore<S: KeyValueSlot> {
    slot: S,
    books: Vec<BookRecord>,
}

impl<S: KeyValueSlot> BookStore<S> {
    /// Absent or unreadable slot contents load as an empty library.
    pub fn load(slot: S) -> Self {
        let books = match slot.read() {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<BookRecord>>(&raw) {
                Ok(books) => books,
                Err(err) => {
                    tracing::warn!(error = %err, "stored books are corrupt; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(
                    error = %format!("{err:#}"),
                    "failed to read stored books; starting empty"
                );
                Vec::new()
            }
        };
        tracing::debug!(books = books.len(), "loaded books");
        Self { slot, books }
    }

    pub fn list(&self) -> &[BookRecord] {
        &self.books
    }

    pub fn find_by_id(&self, id: BookId) -> Option<&BookRecord> {
        self.books.iter().find(|book| book.id == id)
    }

    pub fn add(
        &mut self,
        title: &str,
        author: &str,
        position: &str,
    ) -> Result<BookRecord, StoreError> {
        let title = require(title, Field::Title)?;
        let author = require(author, Field::Author)?;
        let position = require(position, Field::Position)?;

        let book = BookRecord {
            id: self.next_id()?,
            title: title.to_owned(),
            author: author.to_owned(),
            current_position: position.to_owned(),
            estimated_total: progress::estimate_total(position),
            progress: 0,
            date_added: Utc::now(),
        };

        let mut books = self.books.clone();
        books.push(book.clone());
        self.commit(books)?;
        tracing::info!(id = book.id, title = %book.title, "added book");
        Ok(book)
    }

    /// Replaces the record with the same id. Unknown ids are ignored.
    pub fn update(&mut self, record: BookRecord) -> Result<(), StoreError> {
        let Some(index) = self.books.iter().position(|book| book.id == record.id) else {
            tracing::debug!(id = record.id, "update for unknown book ignored");
            return Ok(());
        };
        let mut books = self.books.clone();
        books[index] = record;
        self.commit(books)
    }

    /// Moves the book's position one step and stores the result.
    pub fn advance(
        &mut self,
        id: BookId,
        direction: Direction,
    ) -> Result<Option<BookRecord>, StoreError> {
        let Some(book) = self.find_by_id(id) else {
            return Ok(None);
        };
        let advanced = progress::advance(book, direction);
        self.update(advanced.clone())?;
        tracing::debug!(
            id,
            ?direction,
            position = %advanced.current_position,
            progress = advanced.progress,
            "advanced book"
        );
        Ok(Some(advanced))
    }

    pub fn persist(&self) -> Result<(), StoreError> {
        write_books(&self.slot, &self.books)
    }

    fn commit(&mut self, books: Vec<BookRecord>) -> Result<(), StoreError> {
        write_books(&self.slot, &books)?;
        self.books = books;
        Ok(())
    }

    /// Milliseconds since the epoch, bumped past every existing id.
    fn next_id(&self) -> Result<BookId, StoreError> {
        let now = Utc::now().timestamp_millis();
        match self.books.iter().map(|book| book.id).max() {
            Some(max) if max >= now => max.checked_add(1).ok_or_else(|| {
                StoreError::Storage(anyhow::anyhow!("no book id left above {max}"))
            }),
            _ => Ok(now),
        }
    }
}

fn write_books(slot: &impl KeyValueSlot, books: &[BookRecord]) -> Result<(), StoreError> {
    let raw = serde_json::to_string(books)
        .context("serialize books")
        .map_err(StoreError::Storage)?;
    slot.write(&raw).map_err(StoreError::Storage)
}

fn require(value: &str, field: Field) -> Result<&str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError { field });
    }
    Ok(trimmed)
}
