use std::path::Path;

use anyhow::Context as _;

use crate::cli::{AddArgs, ListArgs, ProgressArgs, ShowArgs};
use crate::formats::BookRecord;
use crate::session::render_progress;
use crate::store::{BOOKS_SLOT, BookStore, LocalFsSlot};

pub fn open_store(data_dir: &Path) -> BookStore<LocalFsSlot> {
    let slot = LocalFsSlot::new(data_dir, BOOKS_SLOT);
    tracing::debug!(path = %slot.path().display(), "open library");
    BookStore::load(slot)
}

pub fn add(data_dir: &Path, args: AddArgs) -> anyhow::Result<()> {
    let mut store = open_store(data_dir);
    let book = store.add(&args.title, &args.author, &args.position)?;
    println!("Added \"{}\" by {} (id {})", book.title, book.author, book.id);
    Ok(())
}

pub fn list(data_dir: &Path, args: ListArgs) -> anyhow::Result<()> {
    let store = open_store(data_dir);
    if args.json {
        let json = serde_json::to_string_pretty(store.list()).context("serialize books")?;
        println!("{json}");
        return Ok(());
    }

    if store.list().is_empty() {
        println!("No books yet. Add one with `libretto add`.");
        return Ok(());
    }
    for book in store.list() {
        println!("{}  \"{}\" by {}", book.id, book.title, book.author);
    }
    Ok(())
}

pub fn show(data_dir: &Path, args: ShowArgs) -> anyhow::Result<()> {
    let store = open_store(data_dir);
    let book = store
        .find_by_id(args.id)
        .ok_or_else(|| anyhow::anyhow!("book not found: {}", args.id))?;
    print_book(book);
    Ok(())
}

pub fn progress(data_dir: &Path, args: ProgressArgs) -> anyhow::Result<()> {
    let mut store = open_store(data_dir);
    for _ in 0..args.steps {
        store
            .advance(args.id, args.direction)
            .context("save progress")?
            .ok_or_else(|| anyhow::anyhow!("book not found: {}", args.id))?;
    }
    let book = store
        .find_by_id(args.id)
        .ok_or_else(|| anyhow::anyhow!("book not found: {}", args.id))?;
    print_book(book);
    Ok(())
}

fn print_book(book: &BookRecord) {
    println!("{} by {}", book.title, book.author);
    println!("{}", render_progress(book.progress, &book.current_position));
}
