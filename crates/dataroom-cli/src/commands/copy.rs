//! Duplication and import commands.

use clap::Args;

use crate::output;
use dataroom_core::config::AppConfig;
use dataroom_core::error::AppError;
use dataroom_core::types::id::{DataroomId, FolderId, TeamId};

use super::Services;

/// Arguments for the duplicate command
#[derive(Debug, Args)]
pub struct DuplicateArgs {
    /// Source dataroom ID
    pub dataroom: DataroomId,
}

/// Arguments for the import-folder command
#[derive(Debug, Args)]
pub struct ImportFolderArgs {
    /// Owning team
    #[arg(long)]
    pub team: TeamId,
    /// Team folder to import
    pub folder: FolderId,
    /// Dataroom name (defaults to the folder name)
    #[arg(long)]
    pub name: Option<String>,
}

/// Duplicate a dataroom
pub async fn duplicate(args: &DuplicateArgs, config: &AppConfig) -> Result<(), AppError> {
    let services = Services::connect(config).await?;
    let id = services.copies.duplicate_dataroom(args.dataroom).await?;
    output::print_success(&format!("Dataroom duplicated (id: {id})"));
    Ok(())
}

/// Create a dataroom from a team folder
pub async fn import_folder(args: &ImportFolderArgs, config: &AppConfig) -> Result<(), AppError> {
    let services = Services::connect(config).await?;
    let id = services
        .copies
        .create_from_folder(args.team, args.folder, args.name.as_deref())
        .await?;
    output::print_success(&format!("Dataroom created from folder (id: {id})"));
    Ok(())
}
