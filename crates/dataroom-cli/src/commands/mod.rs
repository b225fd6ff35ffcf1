//! CLI command definitions and dispatch.

pub mod copy;
pub mod document;
pub mod folder;
pub mod index;
pub mod migrate;
pub mod template;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sqlx::PgPool;

use crate::output::OutputFormat;
use dataroom_core::config::AppConfig;
use dataroom_core::error::AppError;
use dataroom_core::traits::JobTrigger;
use dataroom_database::connection::DatabasePool;
use dataroom_database::repositories::JobRepository;
use dataroom_database::store::{PgTreeStore, TreeStore};
use dataroom_database::trigger::PgJobTrigger;
use dataroom_service::{CopyService, FolderService, HierarchyService, PlacementService};

/// Dataroom tree maintenance
#[derive(Debug, Parser)]
#[command(name = "dataroom-cli", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay loaded from `config/{env}.toml`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Recompute hierarchical indexes of a dataroom
    Reindex(index::ReindexArgs),
    /// Show a dataroom tree with fresh indexes
    Tree(index::TreeArgs),
    /// Check paths, reachability and stored indexes
    Check(index::CheckArgs),
    /// Move folders under a new parent
    Move(folder::MoveArgs),
    /// Place a team document into a dataroom
    AddDocument(document::AddDocumentArgs),
    /// Duplicate a dataroom
    Duplicate(copy::DuplicateArgs),
    /// Create a dataroom from a team folder
    ImportFolder(copy::ImportFolderArgs),
    /// Dataroom templates
    Template(template::TemplateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config).await,
            Commands::Reindex(args) => index::reindex(args, config, self.format).await,
            Commands::Tree(args) => index::tree(args, config, self.format).await,
            Commands::Check(args) => index::check(args, config, self.format).await,
            Commands::Move(args) => folder::execute(args, config, self.format).await,
            Commands::AddDocument(args) => document::execute(args, config, self.format).await,
            Commands::Duplicate(args) => copy::duplicate(args, config).await,
            Commands::ImportFolder(args) => copy::import_folder(args, config).await,
            Commands::Template(args) => template::execute(args, config, self.format).await,
        }
    }
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<PgPool, AppError> {
    let pool = DatabasePool::connect(&config.database).await?;
    Ok(pool.into_pool())
}

/// Services wired against PostgreSQL.
pub struct Services {
    /// Index recomputation and inspection.
    pub hierarchy: HierarchyService,
    /// Folder moves.
    pub folders: FolderService,
    /// Duplication, templates and imports.
    pub copies: CopyService,
    /// Document placement.
    pub placements: PlacementService,
}

impl Services {
    /// Connect to the database and build every service.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let pool = create_db_pool(config).await?;
        let store: Arc<dyn TreeStore> = Arc::new(PgTreeStore::new(pool.clone()));
        let jobs: Arc<dyn JobTrigger> = Arc::new(PgJobTrigger::new(JobRepository::new(pool)));
        let hierarchy = HierarchyService::new(store.clone(), config.indexing.clone());

        Ok(Self {
            folders: FolderService::new(store.clone(), hierarchy.clone(), config.indexing.clone()),
            copies: CopyService::new(store.clone(), hierarchy.clone(), config.indexing.clone()),
            placements: PlacementService::new(store, jobs, config.notifications.clone()),
            hierarchy,
        })
    }
}
