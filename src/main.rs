use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    libretto::logging::init().context("init logging")?;

    let cli = libretto::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let data_dir = cli.data_dir.as_path();
    match cli.command {
        libretto::cli::Command::Add(args) => {
            libretto::library::add(data_dir, args).context("add")?;
        }
        libretto::cli::Command::List(args) => {
            libretto::library::list(data_dir, args).context("list")?;
        }
        libretto::cli::Command::Show(args) => {
            libretto::library::show(data_dir, args).context("show")?;
        }
        libretto::cli::Command::Progress(args) => {
            libretto::library::progress(data_dir, args).context("progress")?;
        }
        libretto::cli::Command::Ask(args) => {
            libretto::session::ask(data_dir, args).await.context("ask")?;
        }
        libretto::cli::Command::Chat(args) => {
            libretto::session::chat(data_dir, args)
                .await
                .context("chat")?;
        }
    }

    Ok(())
}
