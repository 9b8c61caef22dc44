use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::formats::BookId;
use crate::progress::Direction;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the book library.
    #[arg(long, global = true, env = "LIBRETTO_DATA_DIR", default_value = ".libretto")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Add(AddArgs),
    List(ListArgs),
    Show(ShowArgs),
    Progress(ProgressArgs),
    Ask(AskArgs),
    Chat(ChatArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Book title.
    #[arg(long)]
    pub title: String,

    /// Book author.
    #[arg(long)]
    pub author: String,

    /// Where you are now, e.g. "Chapter 12" or "Page 150".
    #[arg(long)]
    pub position: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Print the stored records as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(long)]
    pub id: BookId,
}

#[derive(Debug, Args)]
pub struct ProgressArgs {
    #[arg(long)]
    pub id: BookId,

    #[arg(long, value_enum)]
    pub direction: Direction,

    /// Number of single steps to apply.
    #[arg(long, default_value_t = 1)]
    pub steps: u32,
}

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(long)]
    pub id: BookId,

    /// Message for the reading companion.
    #[arg(long)]
    pub message: String,
}

#[derive(Debug, Args)]
pub struct ChatArgs {
    #[arg(long)]
    pub id: BookId,
}
