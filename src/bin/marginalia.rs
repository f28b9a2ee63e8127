//! Marginalia CLI: inspect and edit stored document comments.
//!
//! Usage:
//!   marginalia comments <subcommand> [--db path] [--config path]
//!   marginalia reconcile <document> <content.json>
//!   marginalia content show <document>
//!   marginalia documents <list|delete>

use clap::{Parser, Subcommand};
use marginalia::{
    delete_document, list_documents, CommentSynchronizer, DocumentSession, LocalStore,
    MarginaliaConfig, OpenStore, SqliteStore, SyncConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "marginalia",
    version,
    about = "Comment bookkeeping for rich-text documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Path to YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage a document's comments
    Comments {
        #[command(subcommand)]
        action: CommentAction,
    },
    /// Store new document content and prune comments whose mark is gone
    Reconcile {
        /// Document identifier
        document: String,
        /// Path to the document's JSON content
        #[arg(required = true)]
        content: PathBuf,
    },
    /// Inspect stored document content
    Content {
        #[command(subcommand)]
        action: ContentAction,
    },
    /// List or delete stored documents
    Documents {
        #[command(subcommand)]
        action: DocumentAction,
    },
}

#[derive(Subcommand)]
enum CommentAction {
    /// List comments in display order
    List {
        /// Document identifier
        document: String,
    },
    /// Create a comment and print its id
    Add {
        /// Document identifier
        document: String,
        /// Initial comment text
        #[arg(long)]
        content: Option<String>,
    },
    /// Replace a comment's text
    Edit {
        /// Document identifier
        document: String,
        /// Comment id
        id: String,
        /// New text
        content: String,
    },
    /// Remove a comment
    Remove {
        /// Document identifier
        document: String,
        /// Comment id
        id: String,
    },
}

#[derive(Subcommand)]
enum ContentAction {
    /// Print stored content, or the default document
    Show {
        /// Document identifier
        document: String,
    },
}

#[derive(Subcommand)]
enum DocumentAction {
    /// List documents with stored comments or content
    List,
    /// Delete a document's stored comments and content
    Delete {
        /// Document identifier
        document: String,
    },
}

/// Get the default database path (~/.local/share/marginalia/marginalia.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("marginalia").join("marginalia.db")
}

fn load_config(path: Option<&Path>) -> Result<MarginaliaConfig, String> {
    match path {
        Some(path) => MarginaliaConfig::from_file(path)
            .map_err(|e| format!("Failed to load config '{}': {}", path.display(), e)),
        None => Ok(MarginaliaConfig::default()),
    }
}

fn open_store(db: Option<PathBuf>) -> Result<Arc<dyn LocalStore>, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    let store = SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    Ok(Arc::new(store))
}

fn cmd_comments_list(sync: &CommentSynchronizer) -> i32 {
    let comments = sync.comments();
    if comments.is_empty() {
        println!("No comments.");
        return 0;
    }
    println!("{:<40}  {:<25}  {}", "ID", "CREATED", "CONTENT");
    println!("{}", "-".repeat(80));
    for comment in comments {
        println!(
            "{:<40}  {:<25}  {}",
            comment.id,
            comment.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            comment.content
        );
    }
    0
}

fn cmd_comments_add(sync: &mut CommentSynchronizer, content: Option<&str>) -> i32 {
    let id = sync.create();
    if let Some(content) = content {
        sync.update_content(id.as_str(), content);
    }
    sync.flush();
    println!("{}", id);
    0
}

fn cmd_comments_edit(sync: &mut CommentSynchronizer, id: &str, content: &str) -> i32 {
    if !sync.comments().contains(id) {
        eprintln!("Error: comment '{}' not found", id);
        return 1;
    }
    sync.update_content(id, content);
    sync.flush();
    println!("Updated comment '{}'", id);
    0
}

fn cmd_comments_remove(sync: &mut CommentSynchronizer, id: &str) -> i32 {
    if !sync.remove(id) {
        eprintln!("Error: comment '{}' not found", id);
        return 1;
    }
    sync.flush();
    println!("Removed comment '{}'", id);
    0
}

fn cmd_reconcile(session: &mut DocumentSession, content_path: &Path) -> i32 {
    let raw = match std::fs::read_to_string(content_path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", content_path.display(), e);
            return 1;
        }
    };
    let content = match serde_json::from_str(&raw) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error: '{}' is not valid JSON: {}", content_path.display(), e);
            return 1;
        }
    };
    let pruned = session.on_content_changed(content);
    session.flush();
    for id in &pruned {
        println!("Pruned orphaned comment '{}'", id);
    }
    println!(
        "Reconciled '{}': {} pruned, {} remaining",
        session.document_id(),
        pruned.len(),
        session.comments().comments().len()
    );
    0
}

fn cmd_content_show(session: &DocumentSession) -> i32 {
    match serde_json::to_string_pretty(session.document().root()) {
        Ok(pretty) => {
            println!("{}", pretty);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_documents_list(store: &dyn LocalStore, config: &SyncConfig) -> i32 {
    match list_documents(store, config) {
        Ok(documents) if documents.is_empty() => {
            println!("No documents.");
            0
        }
        Ok(documents) => {
            for document in documents {
                println!("{}", document);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_documents_delete(store: &dyn LocalStore, config: &SyncConfig, document: &str) -> i32 {
    match delete_document(store, config, document) {
        Ok(true) => {
            println!("Deleted document '{}'", document);
            0
        }
        Ok(false) => {
            eprintln!("Error: document '{}' not found", document);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let store = match open_store(cli.db) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Comments { action } => match action {
            CommentAction::List { document } => {
                let sync = CommentSynchronizer::open(document, store, &config.sync);
                cmd_comments_list(&sync)
            }
            CommentAction::Add { document, content } => {
                let mut sync = CommentSynchronizer::open(document, store, &config.sync);
                cmd_comments_add(&mut sync, content.as_deref())
            }
            CommentAction::Edit { document, id, content } => {
                let mut sync = CommentSynchronizer::open(document, store, &config.sync);
                cmd_comments_edit(&mut sync, &id, &content)
            }
            CommentAction::Remove { document, id } => {
                let mut sync = CommentSynchronizer::open(document, store, &config.sync);
                cmd_comments_remove(&mut sync, &id)
            }
        },
        Commands::Reconcile { document, content } => {
            let mut session = DocumentSession::open(document, store, &config.sync);
            cmd_reconcile(&mut session, &content)
        }
        Commands::Content { action } => match action {
            ContentAction::Show { document } => {
                let session = DocumentSession::open(document, store, &config.sync);
                cmd_content_show(&session)
            }
        },
        Commands::Documents { action } => match action {
            DocumentAction::List => cmd_documents_list(store.as_ref(), &config.sync),
            DocumentAction::Delete { document } => {
                cmd_documents_delete(store.as_ref(), &config.sync, &document)
            }
        },
    };
    std::process::exit(code);
}
