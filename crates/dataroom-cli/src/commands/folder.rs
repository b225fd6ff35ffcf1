//! Folder move command.

use clap::Args;

use crate::output::{self, OutputFormat};
use dataroom_core::config::AppConfig;
use dataroom_core::error::AppError;
use dataroom_core::types::id::{DataroomFolderId, DataroomId};
use dataroom_service::MoveFoldersRequest;

use super::Services;

/// Arguments for the move command
#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Dataroom ID
    pub dataroom: DataroomId,
    /// Folder to move (repeatable)
    #[arg(long = "folder", required = true)]
    pub folders: Vec<DataroomFolderId>,
    /// New parent folder (omit for the dataroom root)
    #[arg(long)]
    pub target: Option<DataroomFolderId>,
    /// Expected path of the target, rejected if it has changed
    #[arg(long)]
    pub target_path: Option<String>,
    /// Skip confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

/// Execute the move command
pub async fn execute(args: &MoveArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    if !args.yes {
        let confirm = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Move {} folder(s)? Manual order of moved folders is reset.",
                args.folders.len()
            ))
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let services = Services::connect(config).await?;
    let result = services
        .folders
        .move_folders(
            args.dataroom,
            MoveFoldersRequest {
                folder_ids: args.folders.clone(),
                target_parent_id: args.target,
                target_path: args.target_path.clone(),
            },
        )
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&result),
        OutputFormat::Table => output::print_success(&format!(
            "Moved {} folder(s) into '{}'",
            result.updated_count, result.new_path
        )),
    }
    Ok(())
}
