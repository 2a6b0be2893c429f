//! Development Folder Inspection Binary
//!
//! Opens the configured FolderSpace database and prints an owner's folder
//! tree as JSON, or seeds a small demo hierarchy to inspect.
//!
//! # Usage
//!
//! ```bash
//! # Print the note folder tree of owner 42
//! cargo run --bin dev-folders -- tree 42
//!
//! # Print the chat folder tree instead
//! cargo run --bin dev-folders -- tree 42 chat
//!
//! # Create a default folder plus a nested demo hierarchy for owner 42
//! cargo run --bin dev-folders -- seed 42
//! ```
//!
//! # Environment Variables
//!
//! - `FOLDSPACE_DB_PATH`: Database file (default: ~/.foldspace/database/foldspace.db)
//! - `FOLDSPACE_BUSY_TIMEOUT_MS`: Busy timeout in milliseconds (default: 5000)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")
//!
//! **DEVELOPMENT ONLY** - no authentication; any owner id can be read.

use std::env;
use std::sync::Arc;

use foldspace_core::db::{DatabaseService, FolderStore, TursoStore};
use foldspace_core::models::{ChatKind, ItemKind, NoteKind, OwnerId, DEFAULT_FOLDER_NAME};
use foldspace_core::services::{DomainServices, FolderService};
use foldspace_core::StoreConfig;

const USAGE: &str = "usage: dev-folders <tree|seed> <owner-id> [note|chat]";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Tree,
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    let command = match args.first().map(String::as_str) {
        Some("tree") => Command::Tree,
        Some("seed") => Command::Seed,
        _ => anyhow::bail!(USAGE),
    };

    let owner_id: OwnerId = args
        .get(1)
        .ok_or_else(|| anyhow::anyhow!(USAGE))?
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid owner id: {}", e))?;

    let config = StoreConfig::from_env();
    tracing::info!("Database: {}", config.database_path.display());
    let db = Arc::new(DatabaseService::from_config(&config).await?);

    match args.get(2).map(String::as_str).unwrap_or(NoteKind::NAME) {
        "note" => run::<NoteKind>(db, command, owner_id).await,
        "chat" => run::<ChatKind>(db, command, owner_id).await,
        other => anyhow::bail!("Unknown domain '{}'; expected note or chat", other),
    }
}

async fn run<K: ItemKind>(
    db: Arc<DatabaseService>,
    command: Command,
    owner_id: OwnerId,
) -> anyhow::Result<()> {
    let store = Arc::new(TursoStore::<K>::new(db));
    let domain = DomainServices::<K, _>::new(store.clone());
    let service = &domain.folders;

    if command == Command::Seed {
        seed(service, store.as_ref(), owner_id).await?;
    }

    let tree = service.get_tree(owner_id).await?;
    tracing::info!(
        "Owner {} has {} root {} folder(s)",
        owner_id,
        tree.len(),
        K::NAME
    );
    println!("{}", serde_json::to_string_pretty(&tree)?);

    Ok(())
}

async fn seed<S: FolderStore>(
    service: &FolderService<S>,
    store: &S,
    owner_id: OwnerId,
) -> anyhow::Result<()> {
    let has_default = store
        .list_active_folders(owner_id)
        .await?
        .iter()
        .any(|f| f.is_default_root());
    if !has_default {
        service.create(owner_id, DEFAULT_FOLDER_NAME, None).await?;
    }

    let projects = service.create(owner_id, "Projects", None).await?;
    let research = service.create(owner_id, "Research", Some(projects.id)).await?;
    service.create(owner_id, "Papers", Some(research.id)).await?;
    service.create(owner_id, "Meetings", Some(projects.id)).await?;

    tracing::info!("Seeded demo folders for owner {}", owner_id);
    Ok(())
}
