use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use filepulse::logging::init_logging;
use filepulse::store::{ListQuery, DEFAULT_LIST_LIMIT};
use filepulse::{load_config, Config, FilePulse, FileStatus, FileType};

/// Parse CSV, Excel, PDF and JSON files and follow their progress.
#[derive(Parser, Debug)]
#[command(name = "filepulse", version)]
#[command(about = "Asynchronous file parsing with live progress")]
struct Cli {
    /// JSON config file. Built-in defaults are used when omitted.
    #[arg(short, long, env = "FILEPULSE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Owner all operations are scoped to.
    #[arg(long, env = "FILEPULSE_OWNER", default_value_t = 1)]
    owner: i64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a file and stream its progress events until it finishes.
    Process {
        file: PathBuf,

        /// Seconds to wait for a terminal state.
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
    /// List files, newest first.
    List {
        #[arg(long = "type", value_name = "TYPE")]
        file_type: Option<FileType>,
        #[arg(long)]
        status: Option<FileStatus>,
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: u64,
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// Search by file name or parsed content.
    Search { term: String },
    /// Show a file's progress, or its parsed content.
    Show {
        id: String,
        #[arg(long)]
        content: bool,
    },
    /// Delete a file.
    Delete { id: String },
    /// Per-owner statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    init_logging(&config.logging)?;

    let app = FilePulse::new(config)?;
    let result = run(&app, cli.owner, cli.command).await;
    app.shutdown();
    result
}

async fn run(app: &FilePulse, owner: i64, command: Command) -> anyhow::Result<()> {
    let queries = app.queries();

    match command {
        Command::Process { file, timeout } => {
            process(app, owner, &file, Duration::from_secs(timeout)).await?
        }
        Command::List {
            file_type,
            status,
            limit,
            offset,
        } => {
            let query = ListQuery {
                file_type,
                status,
                limit,
                offset,
                ..ListQuery::for_owner(owner)
            };
            print_json(&queries.list(&query)?)?;
        }
        Command::Search { term } => print_json(&queries.search(owner, &term)?)?,
        Command::Show { id, content: true } => print_json(&queries.content(&id, owner)?)?,
        Command::Show { id, content: false } => print_json(&queries.progress(&id, owner)?)?,
        Command::Delete { id } => {
            queries.delete(&id, owner)?;
            println!("Deleted {}", id);
        }
        Command::Stats => print_json(&queries.stats(owner)?)?,
    }

    Ok(())
}

async fn process(app: &FilePulse, owner: i64, file: &Path, timeout: Duration) -> anyhow::Result<()> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable file name", file.display()))?;
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;

    let receipt = app.upload(owner, name, &bytes)?;
    info!("Uploaded {} as {}", name, receipt.file_id);
    print_json(&receipt)?;

    let mut subscription = app.subscribe(&receipt.file_id);

    // The run may already be over by the time the subscription exists.
    let finished = app
        .queries()
        .progress(&receipt.file_id, owner)?
        .status
        .is_terminal();

    if !finished {
        let stream = async {
            while let Some(event) = subscription.recv_event().await {
                println!("{}", serde_json::to_string(&event)?);
                if event.is_terminal() {
                    break;
                }
            }
            Ok::<_, serde_json::Error>(())
        };

        match tokio::time::timeout(timeout, stream).await {
            Ok(streamed) => streamed?,
            Err(_) => bail!(
                "{} did not finish within {}s",
                receipt.file_id,
                timeout.as_secs()
            ),
        }
    }

    let view = app.queries().content(&receipt.file_id, owner)?;
    print_json(&view)?;

    if view.status == FileStatus::Failed {
        bail!(
            "processing failed: {}",
            view.error_message.unwrap_or_default()
        );
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
