//! # DocQA CLI (`dqa`)
//!
//! The `dqa` binary administers the document Q&A service: database
//! initialization, user registration and approval, workspace and document
//! management, question answering, and the JSON API server.
//!
//! ## Usage
//!
//! ```bash
//! dqa --config ./config/dqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dqa init` | Create the SQLite database and run schema migrations |
//! | `dqa user add <email>` | Register a user (pending approval) |
//! | `dqa user approve <email>` | Approve a pending user |
//! | `dqa user list` | List registered users |
//! | `dqa workspace create <name>` | Create a workspace for a user |
//! | `dqa upload <file>` | Upload a PDF/TXT document |
//! | `dqa docs list` | List a user's documents |
//! | `dqa ask "<question>"` | Answer a question over a user's documents |
//! | `dqa retrieve "<question>"` | Show retrieved context without calling the LLM |
//! | `dqa serve` | Start the JSON API server |

mod ask;
mod chunk;
mod completion;
mod config;
mod db;
mod docs;
mod extract;
mod migrate;
mod models;
mod retrieve;
mod score;
mod server;
mod upload;
mod users;
mod websearch;
mod workspace;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::ask::AskRequest;
use crate::docs::QueryScope;

/// DocQA CLI — a multi-tenant document Q&A service with keyword retrieval
/// and LLM-backed answers.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/dqa.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "dqa",
    about = "DocQA — document Q&A with keyword retrieval and LLM-backed answers",
    version,
    long_about = "DocQA stores users' PDF/TXT documents in SQLite, selects the most relevant \
    text chunks for each question with an overlap-scored retrieval step, and answers via an \
    external completion service with model fallback. Exposes a CLI and a JSON HTTP API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/dqa.toml`. Database, chunking, retrieval,
    /// completion, and server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/dqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables (users,
    /// workspaces, documents). Idempotent — running it multiple times is safe.
    Init,

    /// Manage users and admin approval.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage workspaces (named document groupings for scoped questions).
    Workspace {
        #[command(subcommand)]
        action: WorkspaceAction,
    },

    /// Upload a document (PDF, TXT, or Markdown).
    ///
    /// Extracts the text and stores it as an immutable document owned by
    /// the given user. Duplicate content (same user, same text) is detected
    /// and not stored twice.
    Upload {
        /// Path to the file to upload.
        path: PathBuf,

        /// Email of the owning user (must be approved).
        #[arg(long)]
        user: String,

        /// Workspace to place the document in.
        #[arg(long)]
        workspace: Option<String>,
    },

    /// List, inspect, and delete documents.
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Ask a question over a user's documents.
    ///
    /// Scope defaults to all of the user's documents; narrow it with
    /// `--document` (one document) or `--workspace` (one workspace).
    /// Requires the completion API key environment variable to be set.
    Ask {
        /// The question.
        question: String,

        /// Email of the asking user (must be approved).
        #[arg(long)]
        user: String,

        /// Pin the scope to a single document id.
        #[arg(long)]
        document: Option<String>,

        /// Scope the question to a workspace.
        #[arg(long)]
        workspace: Option<String>,

        /// Number of chunks to select (defaults: 5 single-document, 8 otherwise).
        #[arg(long)]
        top_k: Option<usize>,

        /// Blend live web search results into the prompt.
        #[arg(long)]
        web: bool,
    },

    /// Show the retrieved context and citations for a question without
    /// calling the completion service.
    Retrieve {
        /// The question.
        question: String,

        /// Email of the asking user (must be approved).
        #[arg(long)]
        user: String,

        /// Pin the scope to a single document id.
        #[arg(long)]
        document: Option<String>,

        /// Scope the question to a workspace.
        #[arg(long)]
        workspace: Option<String>,

        /// Number of chunks to select (defaults: 5 single-document, 8 otherwise).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Start the JSON API server.
    ///
    /// Binds to the address configured in `[server].bind`.
    Serve,
}

/// User management subcommands.
#[derive(Subcommand)]
enum UserAction {
    /// Register a user. New users are pending until approved.
    Add {
        /// Email address of the user.
        email: String,

        /// Grant the admin flag.
        #[arg(long)]
        admin: bool,
    },
    /// Approve a pending user.
    Approve {
        /// Email address of the user.
        email: String,
    },
    /// List registered users and their approval status.
    List,
}

/// Workspace management subcommands.
#[derive(Subcommand)]
enum WorkspaceAction {
    /// Create a workspace.
    Create {
        /// Workspace name (unique per user).
        name: String,

        /// Email of the owning user (must be approved).
        #[arg(long)]
        user: String,
    },
    /// List a user's workspaces.
    List {
        /// Email of the owning user.
        #[arg(long)]
        user: String,
    },
    /// Delete a workspace. Its documents are detached, not deleted.
    Delete {
        /// Workspace name.
        name: String,

        /// Email of the owning user.
        #[arg(long)]
        user: String,
    },
}

/// Document management subcommands.
#[derive(Subcommand)]
enum DocsAction {
    /// List a user's documents.
    List {
        /// Email of the owning user.
        #[arg(long)]
        user: String,
    },
    /// Print a document's metadata and body.
    Show {
        /// Document id.
        id: String,

        /// Email of the owning user.
        #[arg(long)]
        user: String,
    },
    /// Delete a document.
    Delete {
        /// Document id.
        id: String,

        /// Email of the owning user.
        #[arg(long)]
        user: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::User { action } => match action {
            UserAction::Add { email, admin } => {
                users::run_user_add(&cfg, &email, admin).await?;
            }
            UserAction::Approve { email } => {
                users::run_user_approve(&cfg, &email).await?;
            }
            UserAction::List => {
                users::run_user_list(&cfg).await?;
            }
        },
        Commands::Workspace { action } => match action {
            WorkspaceAction::Create { name, user } => {
                workspace::run_ws_create(&cfg, &user, &name).await?;
            }
            WorkspaceAction::List { user } => {
                workspace::run_ws_list(&cfg, &user).await?;
            }
            WorkspaceAction::Delete { name, user } => {
                workspace::run_ws_delete(&cfg, &user, &name).await?;
            }
        },
        Commands::Upload {
            path,
            user,
            workspace,
        } => {
            upload::run_upload(&cfg, &user, &path, workspace.as_deref()).await?;
        }
        Commands::Docs { action } => match action {
            DocsAction::List { user } => {
                docs::run_docs_list(&cfg, &user).await?;
            }
            DocsAction::Show { id, user } => {
                docs::run_docs_show(&cfg, &user, &id).await?;
            }
            DocsAction::Delete { id, user } => {
                docs::run_docs_delete(&cfg, &user, &id).await?;
            }
        },
        Commands::Ask {
            question,
            user,
            document,
            workspace,
            top_k,
            web,
        } => {
            let request = AskRequest {
                user,
                question,
                scope: QueryScope {
                    document_id: document,
                    workspace,
                },
                top_k,
                web,
            };
            ask::run_ask(&cfg, &request).await?;
        }
        Commands::Retrieve {
            question,
            user,
            document,
            workspace,
            top_k,
        } => {
            let scope = QueryScope {
                document_id: document,
                workspace,
            };
            ask::run_retrieve(&cfg, &user, &question, &scope, top_k).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
