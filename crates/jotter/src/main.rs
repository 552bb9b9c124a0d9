//! Jotter CLI - manage notes on a jotter server.

use std::io::{self, BufRead, Read, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use jotter::{HttpNotesApi, NoteForm, NoteItem, NotesApi, NotesState, SortOrder};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jotter", about = "Take notes on a jotter server", version)]
struct Cli {
    /// Server base URL
    #[arg(long, env = "JOTTER_SERVER", default_value = "http://127.0.0.1:3000")]
    server: String,
    /// Per-request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List notes
    Ls {
        /// Only show notes whose title or content contains this text
        #[arg(long)]
        search: Option<String>,
        /// Sort order: newest, oldest or title
        #[arg(long, default_value = "newest")]
        sort: SortOrder,
    },
    /// Show a note
    Show {
        /// Note ID
        id: String,
    },
    /// Add a new note
    Add {
        /// Note title
        #[arg(long)]
        title: String,
        /// Note content (reads from stdin if not provided)
        #[arg(long)]
        content: Option<String>,
    },
    /// Edit a note
    Edit {
        /// Note ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New content (reads from stdin if not provided and stdin is not a tty)
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a note
    Rm {
        /// Note ID
        id: String,
        /// Delete without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Check that the server can reach its store
    Status,
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read from stdin")?;
    Ok(buf)
}

fn is_stdin_tty() -> bool {
    atty::is(atty::Stream::Stdin)
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let api = HttpNotesApi::new(&cli.server, Duration::from_secs(cli.timeout_secs))
        .context("Failed to build HTTP client")?;
    tracing::debug!(server = api.base_url(), "Using server.");
    let mut state = NotesState::new(api);

    match cli.command {
        Commands::Ls { search, sort } => {
            state.fetch_all().await?;
            if let Some(query) = search {
                state.set_search_query(query);
            }
            state.set_sort_order(sort);

            let visible = state.visible();
            if visible.is_empty() {
                if state.notes().is_empty() {
                    println!("No notes yet. Add one with 'jotter add'.");
                } else {
                    println!("No notes match {:?}", state.search_query());
                }
            }
            for note in &visible {
                let item = NoteItem::new(note);
                println!("{}: {} -- {}", note.id, item.title(), item.dates());
            }
        }

        Commands::Show { id } => {
            let note = state.api().get(&id).await?;
            let item = NoteItem::new(&note);

            println!("# {}\n", item.title());
            println!("{}", item.content());
            println!("\n---\n");
            println!("{}", item.dates());
        }

        Commands::Add { title, content } => {
            let content = match content {
                Some(c) => c,
                None => read_stdin()?,
            };

            let mut form = NoteForm::new(None);
            form.set_title(&title);
            form.set_content(&content);
            match form.submit(&mut state).await {
                Some(note) => println!("Added note {}", note.id),
                None => bail!(form.error().unwrap_or("Failed to create note").to_string()),
            }
        }

        Commands::Edit { id, title, content } => {
            let content = if content.is_none() && !is_stdin_tty() {
                Some(read_stdin()?)
            } else {
                content
            };

            let mut updated_fields = Vec::new();
            if title.is_some() {
                updated_fields.push("title");
            }
            if content.is_some() {
                updated_fields.push("content");
            }
            if updated_fields.is_empty() {
                eprintln!("Nothing to update");
                std::process::exit(1);
            }

            let note = state.api().get(&id).await?;
            state.begin_edit(note.clone())?;

            let mut form = NoteForm::new(Some(&note));
            if let Some(title) = title {
                form.set_title(&title);
            }
            if let Some(content) = content {
                form.set_content(&content);
            }
            match form.submit(&mut state).await {
                Some(note) => {
                    println!("Edited note {}: Updated {}", note.id, updated_fields.join(", "))
                }
                None => bail!(form.error().unwrap_or("Failed to update note").to_string()),
            }
        }

        Commands::Rm { id, yes } => {
            if !yes && !is_stdin_tty() {
                bail!("Refusing to delete without confirmation. Pass --yes to delete non-interactively.");
            }

            let deleted = state
                .delete(&id, || {
                    yes || confirm("Are you sure you want to delete this note?")
                })
                .await?;
            if deleted {
                println!("Deleted note {}", id);
            } else {
                println!("Kept note {}", id);
            }
        }

        Commands::Status => {
            let health = state.api().health().await?;
            println!("{} (server {})", health.message, health.version);
        }
    }

    Ok(())
}
